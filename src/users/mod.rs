//! User attribute dataset
//!
//! User files are named `User_<user_key>.txt` and hold free-form
//! `<Attribute Name>: <value>` lines. Each file becomes one record; records are
//! union-concatenated into a single table keyed by user.

pub mod files_parser;
pub mod parser;

pub use files_parser::{users_to_table, UsersFilesParser};
pub use parser::{parse_attribute_line, parse_user_file, parse_user_lines, user_key_from_path};
