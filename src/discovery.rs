//! Input file discovery

use crate::error::PrepError;
use std::path::{Path, PathBuf};

/// File pattern shared by both raw datasets
pub const RAW_FILE_PATTERN: &str = "*.txt";

/// List files in `dir` whose name matches `pattern`, sorted by path.
///
/// A missing directory yields an empty list.
pub fn discover_files(dir: &Path, pattern: &str) -> Result<Vec<PathBuf>, PrepError> {
    let escaped_dir = glob::Pattern::escape(&dir.to_string_lossy());
    let full_pattern = format!("{}/{}", escaped_dir.trim_end_matches('/'), pattern);

    let mut files = glob::glob(&full_pattern)?
        .filter_map(|entry| match entry {
            Ok(path) if path.is_file() => Some(Ok(path)),
            Ok(_) => None,
            Err(e) => Some(Err(PrepError::from(e))),
        })
        .collect::<Result<Vec<_>, _>>()?;
    files.sort();
    Ok(files)
}

/// List `*.txt` files in `dir`
pub fn discover_raw_files(dir: &Path) -> Result<Vec<PathBuf>, PrepError> {
    discover_files(dir, RAW_FILE_PATTERN)
}
