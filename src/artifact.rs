//! On-disk artifacts
//!
//! Intermediate and final artifacts are staged next to their destination and
//! renamed into place, so a reader never sees a half-written file and an aborted
//! run leaves nothing behind.

use crate::error::PrepError;
use crate::schema::Schema;
use crate::table::{Column, Table};
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

fn staging_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(OsString::from)
        .unwrap_or_else(|| OsString::from("artifact"));
    name.push(".tmp");
    path.with_file_name(name)
}

/// Write `contents` to `path` through a sibling staging file
pub fn commit_artifact(path: &Path, contents: &[u8]) -> Result<(), PrepError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| PrepError::io(parent, e))?;
    }

    let staging = staging_path(path);
    fs::write(&staging, contents).map_err(|e| PrepError::io(&staging, e))?;
    fs::rename(&staging, path).map_err(|e| {
        let _ = fs::remove_file(&staging);
        PrepError::io(path, e)
    })
}

/// Write raw lines back to back, keeping each line's own terminator. A line
/// without one gets `\n` so it never runs into the next.
pub fn write_lines(path: &Path, lines: &[String]) -> Result<(), PrepError> {
    let mut contents = String::with_capacity(lines.iter().map(|l| l.len() + 1).sum());
    for line in lines {
        contents.push_str(line);
        if !line.ends_with('\n') {
            contents.push('\n');
        }
    }
    commit_artifact(path, contents.as_bytes())
}

/// Load a whitespace-separated artifact with one row per non-blank line and a
/// `0..n` index. Every row must have exactly one token per schema column.
pub fn read_token_table(path: &Path, schema: &Schema) -> Result<Table, PrepError> {
    let contents = fs::read_to_string(path).map_err(|e| PrepError::io(path, e))?;
    let kinds: Vec<_> = schema.iter().map(|(_, kind)| kind).collect();
    let mut table = Table::from_schema(schema);

    for (line_number, line) in contents.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }

        let tokens: Vec<&str> = line.split_whitespace().collect();
        if tokens.len() != kinds.len() {
            return Err(PrepError::MalformedArtifact {
                path: path.to_path_buf(),
                row: line_number + 1,
                reason: format!("expected {} fields, found {}", kinds.len(), tokens.len()),
            });
        }

        let values = kinds
            .iter()
            .zip(tokens)
            .map(|(kind, token)| kind.cast(token))
            .collect();
        let index = table.len().to_string();
        table.push_row(index, values);
    }

    Ok(table)
}

/// Write `table` as CSV: header row, index as the unnamed first column
pub fn write_table_csv(path: &Path, table: &Table) -> Result<(), PrepError> {
    let mut writer = csv::Writer::from_writer(Vec::new());

    let mut header = Vec::with_capacity(table.columns().len() + 1);
    header.push("");
    header.extend(table.column_names());
    writer.write_record(&header)?;

    for (label, row) in table.index().iter().zip(table.rows()) {
        let mut record = Vec::with_capacity(row.len() + 1);
        record.push(label.clone());
        record.extend(row.iter().map(ToString::to_string));
        writer.write_record(&record)?;
    }

    let bytes = writer.into_inner().map_err(|e| {
        PrepError::io(path, std::io::Error::new(e.error().kind(), e.error().to_string()))
    })?;
    commit_artifact(path, &bytes)
}

/// Read a CSV artifact written by [`write_table_csv`], casting every column with
/// its declared type in `schema`
pub fn read_table_csv(path: &Path, schema: &Schema) -> Result<Table, PrepError> {
    let file = fs::File::open(path).map_err(|e| PrepError::io(path, e))?;
    let mut reader = csv::ReaderBuilder::new().has_headers(true).from_reader(file);

    let header = reader.headers()?.clone();
    let columns: Vec<Column> = header
        .iter()
        .skip(1)
        .map(|name| Column::new(name, schema.column_type(name)))
        .collect();
    let kinds: Vec<_> = columns.iter().map(|c| c.kind).collect();
    let mut table = Table::new(columns);

    for (row_number, record) in reader.records().enumerate() {
        let record = record?;
        let mut fields = record.iter();
        let label = fields.next().ok_or_else(|| PrepError::MalformedArtifact {
            path: path.to_path_buf(),
            row: row_number + 2,
            reason: "missing index column".to_string(),
        })?;

        let values = kinds
            .iter()
            .zip(fields)
            .map(|(kind, field)| kind.cast(field))
            .collect();
        table.push_row(label, values);
    }

    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::ColumnType;
    use crate::table::Value;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_write_lines_preserves_terminators() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data").join("good_lines.txt");
        let lines = vec![
            "one\n".to_string(),
            "two\r\n".to_string(),
            "three".to_string(),
            "four".to_string(),
        ];

        write_lines(&path, &lines).unwrap();

        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "one\ntwo\r\nthree\nfour\n"
        );
        assert!(!staging_path(&path).exists());
    }

    #[test]
    fn test_read_token_table() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("good_lines.txt");
        fs::write(
            &path,
            "ABCDEFGHIJ 210315 14:22:01.123 R 1234.5 RL 0123.4 0456.7\r\n\n\
             ABCDEFGHIJ 210316 09:00:00.000 L 0100.0 LL 0001.0 0002.0\n",
        )
        .unwrap();

        let table = read_token_table(&path, &Schema::tappy()).unwrap();

        assert_eq!(table.len(), 2);
        assert_eq!(table.index(), &["0".to_string(), "1".to_string()]);
        assert_eq!(table.value(0, "Hold time"), Some(&Value::Float(1234.5)));
        assert_eq!(table.value(1, "Direction"), Some(&Value::Str("LL".into())));
        assert_eq!(table.value(1, "Date"), Some(&Value::Str("210316".into())));
    }

    #[test]
    fn test_read_token_table_rejects_short_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("good_lines.txt");
        fs::write(&path, "ABCDEFGHIJ 210315 14:22:01.123\n").unwrap();

        let err = read_token_table(&path, &Schema::tappy()).unwrap_err();
        assert!(matches!(err, PrepError::MalformedArtifact { row: 1, .. }));
    }

    #[test]
    fn test_csv_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("users.csv");
        let schema = Schema::new([
            ("Gender", ColumnType::Str),
            ("BirthYear", ColumnType::Int64),
            ("Parkinsons", ColumnType::Bool),
            ("Hold time", ColumnType::Float64),
        ]);

        let mut table = Table::from_schema(&schema);
        table.push_row(
            "ABCDEFGHIJ",
            vec![
                Value::Str("Female, retired".into()),
                Value::Int(1952),
                Value::Bool(true),
                Value::Float(100.0),
            ],
        );
        table.push_row("KLMNOPQRST", vec![Value::Null, Value::Null, Value::Bool(false)]);

        write_table_csv(&path, &table).unwrap();
        let contents = fs::read_to_string(&path).unwrap();
        assert!(contents.starts_with(",Gender,BirthYear,Parkinsons,Hold time\n"));
        assert!(contents.contains("KLMNOPQRST,,,False,\n"));

        let reloaded = read_table_csv(&path, &schema).unwrap();
        assert_eq!(reloaded, table);
    }
}
