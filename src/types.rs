//! Record types shared across the pipeline
//!
//! This module defines the tap-event record, the user-attribute record, and the
//! accepted/rejected line buckets produced by the tap parser.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Hand that produced a keystroke (Right, Left, Space)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Hand {
    #[serde(rename = "R")]
    Right,
    #[serde(rename = "L")]
    Left,
    #[serde(rename = "S")]
    Space,
}

impl Hand {
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            'R' => Some(Hand::Right),
            'L' => Some(Hand::Left),
            'S' => Some(Hand::Space),
            _ => None,
        }
    }

    pub fn as_char(self) -> char {
        match self {
            Hand::Right => 'R',
            Hand::Left => 'L',
            Hand::Space => 'S',
        }
    }
}

impl fmt::Display for Hand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

/// Transition between the previous and the current key, e.g. `LR`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Direction {
    pub from: Hand,
    pub to: Hand,
}

impl Direction {
    /// Parse exactly two hand characters
    pub fn parse(s: &str) -> Option<Self> {
        let mut chars = s.chars();
        let from = Hand::from_char(chars.next()?)?;
        let to = Hand::from_char(chars.next()?)?;
        if chars.next().is_some() {
            return None;
        }
        Some(Self { from, to })
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.from, self.to)
    }
}

/// One keystroke record from a tap file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TapEvent {
    /// 10-character user identifier
    pub user_key: String,
    /// Date as `YYMMDD`
    pub date: String,
    /// Time of day as `HH:MM:SS.mmm`
    pub timestamp: String,
    pub hand: Hand,
    /// Key hold time in milliseconds
    pub hold_time: f64,
    pub direction: Direction,
    /// Milliseconds between pressing the previous and the current key
    pub latency_time: f64,
    /// Milliseconds between releasing the previous and pressing the current key
    pub flight_time: f64,
}

impl TapEvent {
    /// Date and timestamp combined, when both are real calendar values
    pub fn recorded_at(&self) -> Option<NaiveDateTime> {
        let date = NaiveDate::parse_from_str(&self.date, "%y%m%d").ok()?;
        let time = NaiveTime::parse_from_str(&self.timestamp, "%H:%M:%S%.3f").ok()?;
        Some(date.and_time(time))
    }
}

/// Outcome of structural validation of one line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineClass {
    Accepted,
    Rejected,
}

/// Accepted and rejected raw lines, each in source order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseResult {
    pub accepted: Vec<String>,
    pub rejected: Vec<String>,
}

impl ParseResult {
    pub fn push(&mut self, class: LineClass, line: String) {
        match class {
            LineClass::Accepted => self.accepted.push(line),
            LineClass::Rejected => self.rejected.push(line),
        }
    }

    /// Append another result, keeping its order after ours
    pub fn extend(&mut self, other: ParseResult) {
        self.accepted.extend(other.accepted);
        self.rejected.extend(other.rejected);
    }

    pub fn total(&self) -> usize {
        self.accepted.len() + self.rejected.len()
    }

    /// Rejected lines as a percentage of all lines, rounded to 4 decimals
    pub fn error_percentage(&self) -> f64 {
        error_percentage(self.rejected.len(), self.total())
    }
}

/// `rejected / total * 100` rounded to 4 decimals; 0.0 when `total` is 0
pub fn error_percentage(rejected: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    round_percentage(rejected as f64 / total as f64 * 100.0)
}

/// Round a percentage to 4 decimals
pub fn round_percentage(percentage: f64) -> f64 {
    (percentage * 10_000.0).round() / 10_000.0
}

/// Self-reported attributes of one user, in the order they appeared
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    pub user_key: String,
    pub attributes: IndexMap<String, String>,
}

impl UserRecord {
    pub fn new(user_key: impl Into<String>) -> Self {
        Self {
            user_key: user_key.into(),
            attributes: IndexMap::new(),
        }
    }

    /// Set an attribute; a repeated name keeps its first position
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.attributes.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }
}
