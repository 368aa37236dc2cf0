//! User attribute extractor

use crate::config::Verbosity;
use crate::error::PrepError;
use crate::types::UserRecord;
use regex::Regex;
use std::fs;
use std::path::Path;
use std::sync::LazyLock;
use tracing::{debug, info};

/// `User_<user_key>.txt`
static USERS_FILE_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^User_(?P<user_key>\w{10})\.txt$").expect("valid user file name pattern")
});

const ATTRIBUTE_SEPARATOR: &str = ": ";

/// User key embedded in the name of the file at `path`
pub fn user_key_from_path(path: &Path) -> Result<String, PrepError> {
    path.file_name()
        .and_then(|name| name.to_str())
        .and_then(|name| USERS_FILE_NAME.captures(name))
        .map(|captures| captures["user_key"].to_string())
        .ok_or_else(|| PrepError::MalformedFileName {
            path: path.to_path_buf(),
            convention: "User_<user_key>.txt",
        })
}

/// Split a line at its first `": "` into a trimmed attribute name and the raw
/// value without line terminator. `None` when there is no separator or no name.
pub fn parse_attribute_line(line: &str) -> Option<(&str, &str)> {
    let line = line.trim_end_matches(['\r', '\n']);
    let (name, value) = line.split_once(ATTRIBUTE_SEPARATOR)?;
    let name = name.trim();
    if name.is_empty() {
        return None;
    }
    Some((name, value))
}

/// Build the record of `user_key` from the text of its file
pub fn parse_user_lines(user_key: &str, contents: &str) -> UserRecord {
    let mut record = UserRecord::new(user_key);
    for (name, value) in contents.lines().filter_map(parse_attribute_line) {
        record.set(name, value);
    }
    record
}

/// Read one user file into a record
pub fn parse_user_file(path: &Path, verbosity: Verbosity) -> Result<UserRecord, PrepError> {
    let user_key = user_key_from_path(path)?;

    if verbosity.shows_files() {
        info!("Parsing {}", path.display());
    }

    let contents = fs::read_to_string(path).map_err(|e| PrepError::io(path, e))?;
    let record = parse_user_lines(&user_key, &contents);

    if verbosity.shows_diagnostics() {
        debug!("Parsed data: {:?}", record);
    }

    Ok(record)
}
