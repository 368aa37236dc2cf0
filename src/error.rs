//! Error types for tappy-prep

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur while preparing the dataset
#[derive(Debug, Error)]
pub enum PrepError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("File name does not follow the {convention} convention: {path}")]
    MalformedFileName {
        path: PathBuf,
        convention: &'static str,
    },

    #[error(
        "File {path} has an error rate of {error_percentage}% which is higher than {threshold_percentage}%. Aborting the parse."
    )]
    ErrorThresholdExceeded {
        path: PathBuf,
        error_percentage: f64,
        threshold_percentage: f64,
    },

    #[error("Malformed artifact {path} at row {row}: {reason}")]
    MalformedArtifact {
        path: PathBuf,
        row: usize,
        reason: String,
    },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Invalid file pattern: {0}")]
    PatternError(#[from] glob::PatternError),

    #[error("Failed to list input files: {0}")]
    GlobError(#[from] glob::GlobError),
}

impl PrepError {
    /// Wrap an I/O error together with the path it happened on
    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        PrepError::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    /// True when the error aborted a run because too many lines were rejected
    pub fn is_threshold_breach(&self) -> bool {
        matches!(self, PrepError::ErrorThresholdExceeded { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_threshold_message_names_file_and_percentages() {
        let err = PrepError::ErrorThresholdExceeded {
            path: PathBuf::from("/data/ABCDEFGHIJ_2103.txt"),
            error_percentage: 100.0,
            threshold_percentage: 6.0,
        };

        assert_eq!(
            err.to_string(),
            "File /data/ABCDEFGHIJ_2103.txt has an error rate of 100% which is higher than 6%. Aborting the parse."
        );
        assert!(err.is_threshold_breach());
    }

    #[test]
    fn test_io_helper_keeps_path() {
        let err = PrepError::io(
            "missing.txt",
            std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        );
        assert!(err.to_string().starts_with("I/O error on missing.txt"));
        assert!(!err.is_threshold_breach());
    }
}
