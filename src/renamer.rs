//! Column label normalization
//!
//! Labels become lowercase with spaces replaced by underscores, so
//! `"Hold time"` turns into `"hold_time"`.

use crate::table::Table;
use indexmap::IndexMap;

/// Standard form of a single column label
pub fn standard_column_name(name: &str) -> String {
    name.to_lowercase().replace(' ', "_")
}

/// Old label → new label for every column of `table`, in column order
pub fn rename_columns_dict(table: &Table) -> IndexMap<String, String> {
    table
        .column_names()
        .into_iter()
        .map(|name| (name.to_string(), standard_column_name(name)))
        .collect()
}

/// Return `table` with every column label in standard form
pub fn rename_columns_to_standard_format(table: Table) -> Table {
    table.rename_columns(standard_column_name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::ColumnType;
    use crate::table::Column;

    fn table_with(names: &[&str]) -> Table {
        Table::new(
            names
                .iter()
                .map(|name| Column::new(*name, ColumnType::Str))
                .collect(),
        )
    }

    #[test]
    fn test_rename_dict() {
        let dict = rename_columns_dict(&table_with(&["UserKey", "Hold time"]));

        assert_eq!(dict.len(), 2);
        assert_eq!(dict["UserKey"], "userkey");
        assert_eq!(dict["Hold time"], "hold_time");
    }

    #[test]
    fn test_rename_is_idempotent() {
        let once = rename_columns_to_standard_format(table_with(&["Latency time", "DA"]));
        let twice = rename_columns_to_standard_format(once.clone());

        assert_eq!(once.column_names(), vec!["latency_time", "da"]);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_only_spaces_are_replaced() {
        assert_eq!(standard_column_name("Flight  time-ms"), "flight__time-ms");
    }
}
