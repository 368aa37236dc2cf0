//! Cached dataset loading
//!
//! Each dataset goes through two cached stages:
//!
//! 1. raw: the file-set processor's intermediate artifact, loaded with the
//!    declared schema
//! 2. final: the raw table with standard column names, stored as CSV
//!
//! A stage is regenerated only when its artifact is missing. Artifacts are
//! never checked for staleness; delete them to force a re-parse.

use crate::artifact::{read_table_csv, read_token_table, write_table_csv};
use crate::config::ProjectConfig;
use crate::error::PrepError;
use crate::renamer::rename_columns_to_standard_format;
use crate::schema::{ColumnType, Schema, USER_KEY_COLUMN};
use crate::table::Table;
use crate::tappy::TappyFilesParser;
use crate::users::UsersFilesParser;
use std::path::PathBuf;
use tracing::info;

/// One dataset's artifacts and how to produce them
pub trait DatasetSource {
    /// Short dataset name used in messages
    fn name(&self) -> &'static str;

    /// Location of the intermediate artifact
    fn raw_artifact(&self) -> PathBuf;

    /// Location of the final CSV artifact
    fn final_artifact(&self) -> PathBuf;

    /// Parse the source files and write the intermediate artifact
    fn generate_raw_artifact(&self) -> Result<(), PrepError>;

    /// Load the intermediate artifact with the declared schema
    fn read_raw_artifact(&self) -> Result<Table, PrepError>;

    /// Schema of the final artifact
    fn final_schema(&self) -> Schema;

    /// Turn the raw table into its final form
    fn finalize(&self, raw: Table) -> Table;
}

/// Tap events: `good_lines.txt` → `tappy_parsed_dataframe_file.csv`
#[derive(Debug, Clone)]
pub struct TappyDataset {
    config: ProjectConfig,
}

impl TappyDataset {
    pub fn new(config: ProjectConfig) -> Self {
        Self { config }
    }
}

impl DatasetSource for TappyDataset {
    fn name(&self) -> &'static str {
        "tappy"
    }

    fn raw_artifact(&self) -> PathBuf {
        self.config.good_lines_file()
    }

    fn final_artifact(&self) -> PathBuf {
        self.config.tappy_dataframe_file()
    }

    fn generate_raw_artifact(&self) -> Result<(), PrepError> {
        TappyFilesParser::new(self.config.clone())?.generate_output_files()
    }

    fn read_raw_artifact(&self) -> Result<Table, PrepError> {
        read_token_table(&self.raw_artifact(), &Schema::tappy())
    }

    fn final_schema(&self) -> Schema {
        Schema::tappy().renamed()
    }

    fn finalize(&self, raw: Table) -> Table {
        rename_columns_to_standard_format(raw)
    }
}

/// User attributes: `raw_parsed_users.txt` → `users_parsed_dataframe_file.csv`
#[derive(Debug, Clone)]
pub struct UsersDataset {
    config: ProjectConfig,
}

impl UsersDataset {
    pub fn new(config: ProjectConfig) -> Self {
        Self { config }
    }
}

impl DatasetSource for UsersDataset {
    fn name(&self) -> &'static str {
        "users"
    }

    fn raw_artifact(&self) -> PathBuf {
        self.config.raw_users_file()
    }

    fn final_artifact(&self) -> PathBuf {
        self.config.users_dataframe_file()
    }

    fn generate_raw_artifact(&self) -> Result<(), PrepError> {
        UsersFilesParser::new(self.config.clone())?
            .generate_output_files()
            .map(|_| ())
    }

    fn read_raw_artifact(&self) -> Result<Table, PrepError> {
        read_table_csv(&self.raw_artifact(), &Schema::users())
    }

    fn final_schema(&self) -> Schema {
        Schema::users()
            .with_leading(USER_KEY_COLUMN, ColumnType::Str)
            .renamed()
    }

    fn finalize(&self, raw: Table) -> Table {
        rename_columns_to_standard_format(raw.reset_index(USER_KEY_COLUMN))
    }
}

/// Two-stage cached loader over any dataset
#[derive(Debug, Clone)]
pub struct DatasetLoader<S> {
    source: S,
}

pub type TappyLoader = DatasetLoader<TappyDataset>;
pub type UsersLoader = DatasetLoader<UsersDataset>;

impl TappyLoader {
    pub fn tappy(config: ProjectConfig) -> Self {
        DatasetLoader::new(TappyDataset::new(config))
    }
}

impl UsersLoader {
    pub fn users(config: ProjectConfig) -> Self {
        DatasetLoader::new(UsersDataset::new(config))
    }
}

impl<S: DatasetSource> DatasetLoader<S> {
    pub fn new(source: S) -> Self {
        Self { source }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Stage 1: the intermediate artifact as a typed table, generating the
    /// artifact first if it does not exist
    pub fn load_raw_table(&self) -> Result<Table, PrepError> {
        if !self.source.raw_artifact().is_file() {
            info!(
                "The {} files are not parsed yet. Please hang on while we parse them and instantiate the dataframe...",
                self.source.name()
            );
            self.source.generate_raw_artifact()?;
        }

        self.source.read_raw_artifact()
    }

    /// Stage 2: the final table, from cache when its artifact exists
    pub fn load_table(&self) -> Result<Table, PrepError> {
        let final_artifact = self.source.final_artifact();
        if final_artifact.is_file() {
            return read_table_csv(&final_artifact, &self.source.final_schema());
        }

        info!(
            "There is no {} dataframe available. Please hang on while we parse and load it...",
            self.source.name()
        );
        let raw = self.load_raw_table()?;
        self.convert_and_dump(raw)
    }

    /// Finalize `raw` and store it as the final artifact
    pub fn convert_and_dump(&self, raw: Table) -> Result<Table, PrepError> {
        let table = self.source.finalize(raw);
        let final_artifact = self.source.final_artifact();
        write_table_csv(&final_artifact, &table)?;
        info!("Dataframe exported to {}", final_artifact.display());
        Ok(table)
    }

    /// Re-parse the source files, rewriting the intermediate artifact, and
    /// finalize the result without reading or writing the final artifact
    pub fn reprocess(&self) -> Result<Table, PrepError> {
        self.source.generate_raw_artifact()?;
        let raw = self.source.read_raw_artifact()?;
        Ok(self.source.finalize(raw))
    }
}
