//! Project configuration
//!
//! Centralizes the directories the pipeline reads from and writes to, plus the
//! tunables for the tap-event parser. A `ProjectConfig` is passed explicitly into
//! every component; nothing here is global.

use crate::error::PrepError;
use crate::types::round_percentage;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Default maximum fraction of rejected lines tolerated per tap file (6%)
pub const DEFAULT_ERROR_THRESHOLD: f64 = 0.06;

/// Highest supported verbosity tier
pub const MAX_VERBOSITY: u8 = 3;

/// Output verbosity tier
///
/// - 0: silent
/// - 1: run start/end and output files
/// - 2: per-file progress
/// - 3: per-line diagnostics and parsed records
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Verbosity(pub u8);

impl Default for Verbosity {
    fn default() -> Self {
        Verbosity(1)
    }
}

impl Verbosity {
    pub const SILENT: Verbosity = Verbosity(0);
    pub const DIAGNOSTIC: Verbosity = Verbosity(MAX_VERBOSITY);

    /// Run-level progress (start, aggregate stats, output files)
    pub fn shows_progress(self) -> bool {
        self.0 > 0
    }

    /// Per-file progress
    pub fn shows_files(self) -> bool {
        self.0 > 1
    }

    /// Per-line and per-record diagnostics
    pub fn shows_diagnostics(self) -> bool {
        self.0 > 2
    }

    /// Matching `tracing` level name for subscriber filters
    pub fn level_name(self) -> &'static str {
        match self.0 {
            0 => "warn",
            1 | 2 => "info",
            _ => "debug",
        }
    }
}

/// Directory layout and parser settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectConfig {
    /// Project root; everything else is derived from it
    pub home_dir: PathBuf,
    /// Maximum fraction of rejected lines per tap file before aborting
    pub error_threshold: f64,
    /// Output verbosity tier
    pub verbosity: Verbosity,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            home_dir: PathBuf::from("."),
            error_threshold: DEFAULT_ERROR_THRESHOLD,
            verbosity: Verbosity::default(),
        }
    }
}

impl ProjectConfig {
    /// Create a configuration rooted at `home_dir` with default tunables
    pub fn new(home_dir: impl Into<PathBuf>) -> Self {
        Self {
            home_dir: home_dir.into(),
            ..Self::default()
        }
    }

    pub fn with_error_threshold(mut self, error_threshold: f64) -> Self {
        self.error_threshold = error_threshold;
        self
    }

    pub fn with_verbosity(mut self, verbosity: u8) -> Self {
        self.verbosity = Verbosity(verbosity);
        self
    }

    /// Parse a JSON configuration document
    pub fn from_json(json: &str) -> Result<Self, PrepError> {
        let config: ProjectConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a JSON configuration file
    pub fn load(path: &Path) -> Result<Self, PrepError> {
        let json = fs::read_to_string(path).map_err(|e| PrepError::io(path, e))?;
        Self::from_json(&json)
    }

    /// Reject settings the pipeline cannot honor
    pub fn validate(&self) -> Result<(), PrepError> {
        if !self.error_threshold.is_finite()
            || self.error_threshold <= 0.0
            || self.error_threshold > 1.0
        {
            return Err(PrepError::InvalidConfig(format!(
                "error_threshold must be within (0, 1], got {}",
                self.error_threshold
            )));
        }
        if self.verbosity.0 > MAX_VERBOSITY {
            return Err(PrepError::InvalidConfig(format!(
                "verbosity must be between 0 and {}, got {}",
                MAX_VERBOSITY, self.verbosity.0
            )));
        }
        Ok(())
    }

    /// Error threshold expressed as a percentage, rounded like error percentages
    pub fn threshold_percentage(&self) -> f64 {
        round_percentage(self.error_threshold * 100.0)
    }

    pub fn data_dir(&self) -> PathBuf {
        self.home_dir.join("data")
    }

    pub fn raw_downloaded_dir(&self) -> PathBuf {
        self.data_dir().join("raw_downloaded")
    }

    /// Directory holding `<user_key>_<YYMM>.txt` tap files
    pub fn raw_tappy_dir(&self) -> PathBuf {
        self.raw_downloaded_dir().join("Tappy Data")
    }

    /// Directory holding `User_<user_key>.txt` attribute files
    pub fn raw_users_dir(&self) -> PathBuf {
        self.raw_downloaded_dir().join("Archived users")
    }

    pub fn good_lines_file(&self) -> PathBuf {
        self.data_dir().join("good_lines.txt")
    }

    pub fn bad_lines_file(&self) -> PathBuf {
        self.data_dir().join("bad_lines.txt")
    }

    pub fn raw_users_file(&self) -> PathBuf {
        self.data_dir().join("raw_parsed_users.txt")
    }

    pub fn tappy_dataframe_file(&self) -> PathBuf {
        self.data_dir().join("tappy_parsed_dataframe_file.csv")
    }

    pub fn users_dataframe_file(&self) -> PathBuf {
        self.data_dir().join("users_parsed_dataframe_file.csv")
    }
}
