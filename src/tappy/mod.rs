//! Tap event dataset
//!
//! Tap files are named `<user_key>_<YYMM>.txt` and hold one keystroke per line.
//! Lines are classified one at a time against the record layout and the identity
//! carried by the file name; accepted and rejected lines are kept verbatim.
//!
//! Pipeline: tap files → line classifier → accepted/rejected buckets → `good_lines.txt`

pub mod files_parser;
pub mod parser;

pub use files_parser::{
    check_error_threshold, validate_file, FileReport, FileValidation, TappyFilesParser,
};
pub use parser::{classify_line, classify_lines, parse_file, parse_tap_event, TappyFileIdentity};
