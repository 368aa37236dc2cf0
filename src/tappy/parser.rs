//! Tap event line classifier
//!
//! Every good line has the user the file was named after, a date inside the
//! file's month, no missing fields, and every field in its fixed format. Such a
//! line can be loaded into a table as-is.

use crate::config::Verbosity;
use crate::error::PrepError;
use crate::types::{Direction, Hand, LineClass, ParseResult, TapEvent};
use regex::Regex;
use serde::Serialize;
use std::fs;
use std::path::Path;
use std::sync::LazyLock;
use tracing::warn;

/// `<user_key>_<YYMM>.txt`
static TAPPY_FILE_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<user_key>\w{10})_(?P<year_month>[0-9]{4})\.txt$")
        .expect("valid tap file name pattern")
});

/// Whitespace separated record fields, trailing whitespace only
static TAP_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"^(?P<user_key>\w{10})",
        r"\s+(?P<date>[0-9]{6})",
        r"\s+(?P<timestamp>[0-9]{2}:[0-9]{2}:[0-9]{2}\.[0-9]{3})",
        r"\s+(?P<hand>[RLS])",
        r"\s+(?P<hold_time>[0-9]{4,6}\.[0-9])",
        r"\s+(?P<direction>[RLS]{2})",
        r"\s+(?P<latency_time>[0-9]{4}\.[0-9])",
        r"\s+(?P<flight_time>[0-9]{4}\.[0-9])",
        r"\s*$",
    ))
    .expect("valid tap line pattern")
});

/// Metadata carried by a tap file's name
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TappyFileIdentity {
    /// 10-character user identifier
    pub user_key: String,
    /// `YYMM` every record date must start with
    pub year_month: String,
}

impl TappyFileIdentity {
    pub fn from_file_name(name: &str) -> Option<Self> {
        let captures = TAPPY_FILE_NAME.captures(name)?;
        Some(Self {
            user_key: captures["user_key"].to_string(),
            year_month: captures["year_month"].to_string(),
        })
    }

    /// Identity of the file at `path`; fails when the name breaks the convention
    pub fn from_path(path: &Path) -> Result<Self, PrepError> {
        path.file_name()
            .and_then(|name| name.to_str())
            .and_then(Self::from_file_name)
            .ok_or_else(|| PrepError::MalformedFileName {
                path: path.to_path_buf(),
                convention: "<user_key>_<YYMM>.txt",
            })
    }
}

/// Typed record for `line`, or `None` when the line is not a valid record of
/// the file identified by `identity`
pub fn parse_tap_event(identity: &TappyFileIdentity, line: &str) -> Option<TapEvent> {
    let captures = TAP_LINE.captures(line)?;

    let user_key = &captures["user_key"];
    let date = &captures["date"];
    if user_key != identity.user_key || !date.starts_with(&identity.year_month) {
        return None;
    }

    Some(TapEvent {
        user_key: user_key.to_string(),
        date: date.to_string(),
        timestamp: captures["timestamp"].to_string(),
        hand: captures["hand"].chars().next().and_then(Hand::from_char)?,
        hold_time: captures["hold_time"].parse().ok()?,
        direction: Direction::parse(&captures["direction"])?,
        latency_time: captures["latency_time"].parse().ok()?,
        flight_time: captures["flight_time"].parse().ok()?,
    })
}

/// Accept or reject a single line. No state is carried between lines.
pub fn classify_line(identity: &TappyFileIdentity, line: &str) -> LineClass {
    if parse_tap_event(identity, line).is_some() {
        LineClass::Accepted
    } else {
        LineClass::Rejected
    }
}

/// Classify every line of `contents`, keeping each line with its terminator
pub fn classify_lines(
    identity: &TappyFileIdentity,
    contents: &str,
    verbosity: Verbosity,
) -> ParseResult {
    let mut result = ParseResult::default();

    for line in contents.split_inclusive('\n') {
        let class = classify_line(identity, line);
        if class == LineClass::Rejected && verbosity.shows_diagnostics() {
            warn!(
                "unparseable line at {}: {}",
                result.total() + 1,
                line.trim_end_matches(['\r', '\n'])
            );
        }
        result.push(class, line.to_string());
    }

    result
}

/// Read and classify one tap file
pub fn parse_file(path: &Path, verbosity: Verbosity) -> Result<ParseResult, PrepError> {
    let identity = TappyFileIdentity::from_path(path)?;
    let contents = fs::read_to_string(path).map_err(|e| PrepError::io(path, e))?;
    Ok(classify_lines(&identity, &contents, verbosity))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    const GOOD_LINE: &str = "ABCDEFGHIJ 210315 14:22:01.123 R 1234.5 RL 0123.4 0456.7\n";

    fn identity() -> TappyFileIdentity {
        TappyFileIdentity::from_path(Path::new("/raw/Tappy Data/ABCDEFGHIJ_2103.txt")).unwrap()
    }

    #[test]
    fn test_identity_from_path() {
        let identity = identity();
        assert_eq!(identity.user_key, "ABCDEFGHIJ");
        assert_eq!(identity.year_month, "2103");
    }

    #[test]
    fn test_malformed_file_name_fails_fast() {
        for name in ["ABCDEFGHI_2103.txt", "ABCDEFGHIJ_21030.txt", "ABCDEFGHIJ_2103.csv"] {
            let path = PathBuf::from("/raw").join(name);
            let err = TappyFileIdentity::from_path(&path).unwrap_err();
            assert!(matches!(err, PrepError::MalformedFileName { .. }), "{name}");
        }
    }

    #[test]
    fn test_good_line_accepted() {
        assert_eq!(classify_line(&identity(), GOOD_LINE), LineClass::Accepted);

        let event = parse_tap_event(&identity(), GOOD_LINE).unwrap();
        assert_eq!(event.hand, Hand::Right);
        assert_eq!(event.direction.to_string(), "RL");
        assert_eq!(event.hold_time, 1234.5);
        assert_eq!(event.latency_time, 123.4);
        assert_eq!(event.flight_time, 456.7);
    }

    #[test]
    fn test_other_user_rejected() {
        let line = GOOD_LINE.replace("ABCDEFGHIJ", "ZZZZZZZZZZ");
        assert_eq!(classify_line(&identity(), &line), LineClass::Rejected);
    }

    #[test]
    fn test_field_format_violations_rejected() {
        let bad_lines = [
            // date outside the file's month
            "ABCDEFGHIJ 210415 14:22:01.123 R 1234.5 RL 0123.4 0456.7\n",
            // hand outside R/L/S
            "ABCDEFGHIJ 210315 14:22:01.123 X 1234.5 RL 0123.4 0456.7\n",
            // hold time too short
            "ABCDEFGHIJ 210315 14:22:01.123 R 123.5 RL 0123.4 0456.7\n",
            // three-character direction
            "ABCDEFGHIJ 210315 14:22:01.123 R 1234.5 RLS 0123.4 0456.7\n",
            // truncated line
            "ABCDEFGHIJ 210315 14:22:01.123 R 1234.5 RL 0123.4\n",
            // trailing garbage
            "ABCDEFGHIJ 210315 14:22:01.123 R 1234.5 RL 0123.4 0456.7 x\n",
            // leading whitespace
            " ABCDEFGHIJ 210315 14:22:01.123 R 1234.5 RL 0123.4 0456.7\n",
            "\n",
        ];

        for line in bad_lines {
            assert_eq!(classify_line(&identity(), line), LineClass::Rejected, "{line:?}");
        }
    }

    #[test]
    fn test_six_digit_hold_time_and_crlf_accepted() {
        let line = "ABCDEFGHIJ 210301 00:00:00.000 S 123456.7 SS 0000.0 0000.0 \r\n";
        assert_eq!(classify_line(&identity(), line), LineClass::Accepted);
    }

    #[test]
    fn test_classify_lines_partitions_verbatim() {
        let bad = "ABCDEFGHIJ 210315 14:22:01.123 R 1234.5 RL\r\n";
        let last = "ABCDEFGHIJ 210316 08:00:00.500 L 1000.0 LR 0001.0 0002.0";
        let contents = format!("{GOOD_LINE}{bad}{last}");

        let result = classify_lines(&identity(), &contents, Verbosity::DIAGNOSTIC);

        assert_eq!(result.accepted, vec![GOOD_LINE, last]);
        assert_eq!(result.rejected, vec![bad]);
        assert_eq!(result.accepted.concat().len() + result.rejected.concat().len(), contents.len());
    }

    #[test]
    fn test_empty_file_has_no_lines() {
        let result = classify_lines(&identity(), "", Verbosity::SILENT);
        assert_eq!(result.total(), 0);
        assert_eq!(result.error_percentage(), 0.0);
    }

    #[test]
    fn test_parse_file_reads_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ABCDEFGHIJ_2103.txt");
        fs::write(&path, format!("{GOOD_LINE}garbage\n")).unwrap();

        let result = parse_file(&path, Verbosity::SILENT).unwrap();
        assert_eq!(result.accepted.len(), 1);
        assert_eq!(result.rejected, vec!["garbage\n"]);
    }

    #[test]
    fn test_parse_file_bad_name_does_not_read() {
        let err = parse_file(Path::new("/does/not/exist/notes.txt"), Verbosity::SILENT)
            .unwrap_err();
        assert!(matches!(err, PrepError::MalformedFileName { .. }));
    }
}
