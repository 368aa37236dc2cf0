//! User file-set processor

use crate::artifact::write_table_csv;
use crate::config::ProjectConfig;
use crate::discovery::discover_raw_files;
use crate::error::PrepError;
use crate::schema::{ColumnType, Schema};
use crate::table::{Column, Table, Value};
use crate::types::UserRecord;
use crate::users::parser::parse_user_file;
use indexmap::IndexSet;
use std::path::{Path, PathBuf};
use tracing::info;

/// Union of all records as an untyped table indexed by user key.
///
/// Columns are the schema's columns in declared order followed by any other
/// attribute in the order it was first seen. Unset cells are `Null`.
pub fn users_to_table(records: &[UserRecord], schema: &Schema) -> Table {
    let mut names: IndexSet<&str> = schema.names().collect();
    for record in records {
        names.extend(record.attributes.keys().map(String::as_str));
    }

    let mut table = Table::new(
        names
            .iter()
            .map(|name| Column::new(*name, ColumnType::Str))
            .collect(),
    );

    for record in records {
        let values = names
            .iter()
            .map(|name| {
                record
                    .get(name)
                    .map(|value| Value::Str(value.to_string()))
                    .unwrap_or(Value::Null)
            })
            .collect();
        table.push_row(record.user_key.clone(), values);
    }

    table
}

/// Parses all user files of a project
pub struct UsersFilesParser {
    config: ProjectConfig,
    users_files: Vec<PathBuf>,
}

impl UsersFilesParser {
    /// Discover the user files of `config`
    pub fn new(config: ProjectConfig) -> Result<Self, PrepError> {
        config.validate()?;
        let users_files = discover_raw_files(&config.raw_users_dir())?;
        Ok(Self {
            config,
            users_files,
        })
    }

    pub fn users_files(&self) -> &[PathBuf] {
        &self.users_files
    }

    pub fn raw_parsed_users_file(&self) -> PathBuf {
        self.config.raw_users_file()
    }

    /// Parse every user file into one record each, in file order
    pub fn parse(&self) -> Result<Vec<UserRecord>, PrepError> {
        let verbosity = self.config.verbosity;
        if verbosity.shows_progress() {
            info!("Starting to parse users files");
            info!("Files to process: {}", self.users_files.len());
        }

        let total_files = self.users_files.len();
        let mut records = Vec::with_capacity(total_files);

        for (file_count, file_path) in self.users_files.iter().enumerate() {
            if verbosity.shows_files() {
                info!("Processing {}", file_path.display());
            }

            records.push(parse_user_file(file_path, verbosity)?);

            if verbosity.shows_files() {
                info!(
                    "Finished processing - ({}/{}) {}",
                    file_count + 1,
                    total_files,
                    file_path.display()
                );
            }
        }

        if verbosity.shows_progress() {
            info!("Finished processing - all files");
        }

        Ok(records)
    }

    /// Parse all files and write `raw_parsed_users.txt`
    pub fn generate_output_files(&self) -> Result<Table, PrepError> {
        let records = self.parse()?;
        let table = users_to_table(&records, &Schema::users());

        let output_file = self.raw_parsed_users_file();
        write_table_csv(&output_file, &table)?;
        self.log_output_file(&output_file);

        Ok(table)
    }

    fn log_output_file(&self, path: &Path) {
        if self.config.verbosity.shows_progress() {
            info!("Output file created: {}", path.display());
        }
    }
}
