//! Tappy Prep - data preparation for the Tappy keystroke-timing dataset
//!
//! Turns the raw Tappy text files into cached tables through a deterministic
//! pipeline: file discovery → per-line classification → aggregation → column
//! normalization → CSV caching.
//!
//! ## Datasets
//!
//! - **Tap events**: fixed-format keystroke records, one per line, validated
//!   against the user and month in the file name
//! - **User attributes**: free-form `Name: value` lines, one file per user

pub mod artifact;
pub mod config;
pub mod discovery;
pub mod error;
pub mod loader;
pub mod renamer;
pub mod schema;
pub mod table;
pub mod tappy;
pub mod types;
pub mod users;

pub use config::{ProjectConfig, Verbosity};
pub use error::PrepError;
pub use loader::{DatasetLoader, DatasetSource, TappyLoader, UsersLoader};
pub use table::{Table, Value};

// Tap event exports
pub use tappy::{classify_line, TappyFileIdentity, TappyFilesParser};

// User attribute exports
pub use users::{parse_user_file, UsersFilesParser};

/// Crate version
pub const PREP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name reported by the CLI
pub const PRODUCER_NAME: &str = "tappy-prep";
