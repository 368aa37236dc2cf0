//! Declared column schemas
//!
//! Both datasets are stored as text. Types are declared here and applied once,
//! when an artifact is loaded into a `Table`.

use crate::renamer::standard_column_name;
use crate::table::Value;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Declared type of a column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnType {
    Str,
    Int64,
    Float64,
    Bool,
    /// Free text with a small closed set of values in practice
    Category,
}

impl ColumnType {
    /// Convert raw artifact text to a typed cell.
    ///
    /// Empty text is `Null` for every type. Text that does not parse as the
    /// declared type is also `Null`.
    pub fn cast(self, raw: &str) -> Value {
        if raw.is_empty() {
            return Value::Null;
        }

        let value = match self {
            ColumnType::Str | ColumnType::Category => Some(Value::Str(raw.to_string())),
            ColumnType::Int64 => parse_int(raw.trim()).map(Value::Int),
            ColumnType::Float64 => raw
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|v| !v.is_nan())
                .map(Value::Float),
            ColumnType::Bool => parse_bool(raw.trim()).map(Value::Bool),
        };

        value.unwrap_or_else(|| {
            debug!("Cannot cast {:?} to {:?}, storing null", raw, self);
            Value::Null
        })
    }
}

fn parse_int(raw: &str) -> Option<i64> {
    if let Ok(v) = raw.parse::<i64>() {
        return Some(v);
    }
    // Integral floats such as `1952.0`
    let v = raw.parse::<f64>().ok()?;
    if v.is_finite() && v.fract() == 0.0 && v.abs() < i64::MAX as f64 {
        Some(v as i64)
    } else {
        None
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "true" | "1" => Some(true),
        "false" | "0" => Some(false),
        _ => None,
    }
}

/// Tap event columns, in file order
pub const TAPPY_COLUMN_TYPES: [(&str, ColumnType); 8] = [
    ("UserKey", ColumnType::Str),
    ("Date", ColumnType::Str),
    ("Timestamp", ColumnType::Str),
    ("Hand", ColumnType::Str),
    ("Hold time", ColumnType::Float64),
    ("Direction", ColumnType::Str),
    ("Latency time", ColumnType::Float64),
    ("Flight time", ColumnType::Float64),
];

/// Known user attribute columns
pub const USERS_COLUMN_TYPES: [(&str, ColumnType); 12] = [
    ("Gender", ColumnType::Str),
    ("BirthYear", ColumnType::Int64),
    ("Parkinsons", ColumnType::Bool),
    ("Tremors", ColumnType::Bool),
    ("DiagnosisYear", ColumnType::Int64),
    ("Sided", ColumnType::Category),
    ("UPDRS", ColumnType::Str),
    ("Impact", ColumnType::Str),
    ("Levadopa", ColumnType::Bool),
    ("DA", ColumnType::Bool),
    ("MAOB", ColumnType::Bool),
    ("Other", ColumnType::Bool),
];

/// Label of the column the users index is moved into
pub const USER_KEY_COLUMN: &str = "UserKey";

/// Ordered name → type mapping
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Schema {
    columns: Vec<(String, ColumnType)>,
}

impl Schema {
    pub fn new<N: Into<String>>(columns: impl IntoIterator<Item = (N, ColumnType)>) -> Self {
        Self {
            columns: columns
                .into_iter()
                .map(|(name, kind)| (name.into(), kind))
                .collect(),
        }
    }

    /// Raw tap event schema
    pub fn tappy() -> Self {
        Self::new(TAPPY_COLUMN_TYPES)
    }

    /// Raw user attribute schema
    pub fn users() -> Self {
        Self::new(USERS_COLUMN_TYPES)
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, ColumnType)> + '_ {
        self.columns.iter().map(|(name, kind)| (name.as_str(), *kind))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.columns.iter().map(|(name, _)| name.as_str())
    }

    /// Declared type of `name`; undeclared columns are strings
    pub fn column_type(&self, name: &str) -> ColumnType {
        self.columns
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, kind)| *kind)
            .unwrap_or(ColumnType::Str)
    }

    /// Same schema with a column inserted in front
    pub fn with_leading(mut self, name: impl Into<String>, kind: ColumnType) -> Self {
        self.columns.insert(0, (name.into(), kind));
        self
    }

    /// Same schema with names in the standard lowercase/underscore form
    pub fn renamed(&self) -> Self {
        Self::new(
            self.columns
                .iter()
                .map(|(name, kind)| (standard_column_name(name), *kind)),
        )
    }
}
