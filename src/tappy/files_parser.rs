//! Tap file-set processor
//!
//! Parses every tap file under the configured directory, keeps a per-file error
//! budget, and writes the accepted and rejected lines to `good_lines.txt` and
//! `bad_lines.txt`. Nothing is written unless every file stays within budget.

use crate::artifact::write_lines;
use crate::config::{ProjectConfig, Verbosity};
use crate::discovery::discover_raw_files;
use crate::error::PrepError;
use crate::tappy::parser::{parse_file, parse_tap_event, TappyFileIdentity};
use crate::types::ParseResult;
use chrono::NaiveDateTime;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::info;

/// Line counts for one parsed tap file
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileReport {
    pub path: PathBuf,
    pub accepted: usize,
    pub rejected: usize,
    pub error_percentage: f64,
}

impl FileReport {
    fn new(path: &Path, result: &ParseResult) -> Self {
        Self {
            path: path.to_path_buf(),
            accepted: result.accepted.len(),
            rejected: result.rejected.len(),
            error_percentage: result.error_percentage(),
        }
    }
}

/// Fail when a file's rejected share meets or exceeds the configured threshold
pub fn check_error_threshold(
    path: &Path,
    result: &ParseResult,
    config: &ProjectConfig,
) -> Result<(), PrepError> {
    check_error_percentage(path, result.error_percentage(), config)
}

fn check_error_percentage(
    path: &Path,
    error_percentage: f64,
    config: &ProjectConfig,
) -> Result<(), PrepError> {
    let threshold_percentage = config.threshold_percentage();

    if error_percentage < threshold_percentage {
        Ok(())
    } else {
        Err(PrepError::ErrorThresholdExceeded {
            path: path.to_path_buf(),
            error_percentage,
            threshold_percentage,
        })
    }
}

/// Classification summary of a single tap file
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileValidation {
    pub identity: TappyFileIdentity,
    pub report: FileReport,
    pub first_recorded_at: Option<NaiveDateTime>,
    pub last_recorded_at: Option<NaiveDateTime>,
    /// Rejected lines without their terminators
    pub rejected_lines: Vec<String>,
}

impl FileValidation {
    /// Same budget check the file-set parse applies to this file
    pub fn check_error_threshold(&self, config: &ProjectConfig) -> Result<(), PrepError> {
        check_error_percentage(&self.report.path, self.report.error_percentage, config)
    }
}

/// Classify one tap file on its own, without writing any artifact
pub fn validate_file(path: &Path, verbosity: Verbosity) -> Result<FileValidation, PrepError> {
    let identity = TappyFileIdentity::from_path(path)?;
    let parsed_lines = parse_file(path, verbosity)?;

    let recorded: Vec<NaiveDateTime> = parsed_lines
        .accepted
        .iter()
        .filter_map(|line| parse_tap_event(&identity, line))
        .filter_map(|event| event.recorded_at())
        .collect();

    Ok(FileValidation {
        report: FileReport::new(path, &parsed_lines),
        first_recorded_at: recorded.iter().min().copied(),
        last_recorded_at: recorded.iter().max().copied(),
        rejected_lines: parsed_lines
            .rejected
            .iter()
            .map(|line| line.trim_end_matches(['\r', '\n']).to_string())
            .collect(),
        identity,
    })
}

/// Parses all tap files of a project
pub struct TappyFilesParser {
    config: ProjectConfig,
    tappy_files: Vec<PathBuf>,
    parsed_lines: Option<ParseResult>,
    file_reports: Vec<FileReport>,
}

impl TappyFilesParser {
    /// Discover the tap files of `config`
    pub fn new(config: ProjectConfig) -> Result<Self, PrepError> {
        config.validate()?;
        let tappy_files = discover_raw_files(&config.raw_tappy_dir())?;
        Ok(Self {
            config,
            tappy_files,
            parsed_lines: None,
            file_reports: Vec::new(),
        })
    }

    pub fn tappy_files(&self) -> &[PathBuf] {
        &self.tappy_files
    }

    /// Per-file counts of the last successful `parse`
    pub fn file_reports(&self) -> &[FileReport] {
        &self.file_reports
    }

    pub fn good_lines_output_file(&self) -> PathBuf {
        self.config.good_lines_file()
    }

    pub fn bad_lines_output_file(&self) -> PathBuf {
        self.config.bad_lines_file()
    }

    /// Parse every file in memory, stopping at the first file over budget
    pub fn parse(&mut self) -> Result<&ParseResult, PrepError> {
        self.log_start();

        let total_files = self.tappy_files.len();
        let mut all_lines = ParseResult::default();
        let mut reports = Vec::with_capacity(total_files);

        for (file_count, file_path) in self.tappy_files.iter().enumerate() {
            if self.config.verbosity.shows_files() {
                info!("Processing {}", file_path.display());
            }

            let parsed_lines = parse_file(file_path, self.config.verbosity)?;

            if self.config.verbosity.shows_files() {
                let message = format!("({}/{}) {}", file_count + 1, total_files, file_path.display());
                log_stats(&parsed_lines, &message);
            }

            check_error_threshold(file_path, &parsed_lines, &self.config)?;
            reports.push(FileReport::new(file_path, &parsed_lines));
            all_lines.extend(parsed_lines);
        }

        if self.config.verbosity.shows_progress() {
            log_stats(&all_lines, "all files");
        }

        self.file_reports = reports;
        Ok(&*self.parsed_lines.insert(all_lines))
    }

    /// Write `bad_lines.txt` then `good_lines.txt`, parsing first if needed
    pub fn generate_output_files(&mut self) -> Result<(), PrepError> {
        if self.parsed_lines.is_none() {
            self.parse()?;
        }
        let Some(parsed_lines) = self.parsed_lines.as_ref() else {
            return Ok(());
        };

        // good_lines.txt marks the dataset as parsed, so it is committed last
        let bad_lines_file = self.bad_lines_output_file();
        write_lines(&bad_lines_file, &parsed_lines.rejected)?;
        self.log_output_file(&bad_lines_file);

        let good_lines_file = self.good_lines_output_file();
        write_lines(&good_lines_file, &parsed_lines.accepted)?;
        self.log_output_file(&good_lines_file);

        Ok(())
    }

    fn log_start(&self) {
        if self.config.verbosity.shows_progress() {
            info!("Starting to parse tappy files");
            info!("Files to process: {}", self.tappy_files.len());
        }
    }

    fn log_output_file(&self, path: &Path) {
        if self.config.verbosity.shows_progress() {
            info!("Output file created: {}", path.display());
        }
    }
}

fn log_stats(parsed_lines: &ParseResult, message: &str) {
    info!("Finished processing - {}", message);
    info!("  - Lines processed: {}", parsed_lines.total());
    info!("  - Unparseable lines: {}", parsed_lines.rejected.len());
    info!("  - Error percentage: {}%", parsed_lines.error_percentage());
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const GOOD: &str = "ABCDEFGHIJ 210315 14:22:01.123 R 1234.5 RL 0123.4 0456.7\n";
    const OTHER_GOOD: &str = "KLMNOPQRST 160801 09:00:00.000 L 0100.0 LL 0001.0 0002.0\n";

    fn project() -> (tempfile::TempDir, ProjectConfig) {
        let dir = tempfile::tempdir().unwrap();
        let config = ProjectConfig::new(dir.path()).with_verbosity(0);
        fs::create_dir_all(config.raw_tappy_dir()).unwrap();
        (dir, config)
    }

    fn write_tap_file(config: &ProjectConfig, name: &str, contents: &str) {
        fs::write(config.raw_tappy_dir().join(name), contents).unwrap();
    }

    #[test]
    fn test_concatenates_files_in_order() {
        let (_dir, config) = project();
        let first = GOOD.repeat(19) + "broken line\n";
        write_tap_file(&config, "ABCDEFGHIJ_2103.txt", &first);
        write_tap_file(&config, "KLMNOPQRST_1608.txt", OTHER_GOOD);

        let mut parser = TappyFilesParser::new(config.clone()).unwrap();
        let result = parser.parse().unwrap().clone();

        assert_eq!(result.accepted.len(), 20);
        assert_eq!(result.accepted.last().map(String::as_str), Some(OTHER_GOOD));
        assert_eq!(result.rejected, vec!["broken line\n"]);

        let reports = parser.file_reports();
        assert_eq!(reports.len(), 2);
        assert_eq!(reports[0].error_percentage, 5.0);
        assert_eq!(reports[1].error_percentage, 0.0);
    }

    #[test]
    fn test_generate_output_files() {
        let (_dir, config) = project();
        write_tap_file(&config, "ABCDEFGHIJ_2103.txt", &(GOOD.repeat(19) + "x\r\n"));

        let mut parser = TappyFilesParser::new(config.clone()).unwrap();
        parser.generate_output_files().unwrap();

        assert_eq!(
            fs::read_to_string(config.good_lines_file()).unwrap(),
            GOOD.repeat(19)
        );
        assert_eq!(fs::read_to_string(config.bad_lines_file()).unwrap(), "x\r\n");
    }

    #[test]
    fn test_threshold_breach_writes_nothing() {
        let (_dir, config) = project();
        write_tap_file(&config, "ABCDEFGHIJ_2103.txt", GOOD);
        write_tap_file(&config, "KLMNOPQRST_1608.txt", "not a record\nnor this\n");

        let mut parser = TappyFilesParser::new(config.clone()).unwrap();
        let err = parser.generate_output_files().unwrap_err();

        match err {
            PrepError::ErrorThresholdExceeded {
                path,
                error_percentage,
                threshold_percentage,
            } => {
                assert!(path.ends_with("KLMNOPQRST_1608.txt"));
                assert_eq!(error_percentage, 100.0);
                assert_eq!(threshold_percentage, 6.0);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(!config.good_lines_file().exists());
        assert!(!config.bad_lines_file().exists());
    }

    #[test]
    fn test_threshold_is_inclusive() {
        let (_dir, config) = project();
        let config = config.with_error_threshold(0.05);
        let mut parser = TappyFilesParser::new(config.clone()).unwrap();

        let mut result = ParseResult {
            accepted: vec![GOOD.to_string(); 19],
            rejected: vec!["bad\n".to_string()],
        };
        assert!(check_error_threshold(Path::new("f.txt"), &result, &config).is_err());

        result.accepted.push(GOOD.to_string());
        assert!(check_error_threshold(Path::new("f.txt"), &result, &config).is_ok());

        // empty project parses to nothing
        assert_eq!(parser.parse().unwrap().total(), 0);
    }

    #[test]
    fn test_malformed_name_aborts_run() {
        let (_dir, config) = project();
        write_tap_file(&config, "readme.txt", GOOD);

        let mut parser = TappyFilesParser::new(config).unwrap();
        let err = parser.parse().unwrap_err();
        assert!(matches!(err, PrepError::MalformedFileName { .. }));
    }

    #[test]
    fn test_unterminated_last_line_stays_on_its_own_row() {
        let (_dir, config) = project();
        write_tap_file(&config, "ABCDEFGHIJ_2103.txt", GOOD.trim_end());
        write_tap_file(&config, "KLMNOPQRST_1608.txt", OTHER_GOOD);

        let mut parser = TappyFilesParser::new(config.clone()).unwrap();
        let result = parser.parse().unwrap().clone();
        assert_eq!(result.accepted[0], GOOD.trim_end());

        parser.generate_output_files().unwrap();
        assert_eq!(
            fs::read_to_string(config.good_lines_file()).unwrap(),
            format!("{GOOD}{OTHER_GOOD}")
        );
    }

    #[test]
    fn test_threshold_boundary_survives_float_scaling() {
        let (_dir, config) = project();
        let config = config.with_error_threshold(0.07);
        let mut result = ParseResult {
            accepted: vec![GOOD.to_string(); 93],
            rejected: vec!["bad\n".to_string(); 7],
        };
        assert_eq!(result.error_percentage(), 7.0);
        assert!(check_error_threshold(Path::new("f.txt"), &result, &config).is_err());

        result.accepted.push(GOOD.to_string());
        assert!(check_error_threshold(Path::new("f.txt"), &result, &config).is_ok());
    }

    #[test]
    fn test_validate_file() {
        let (_dir, config) = project();
        let contents = format!(
            "{GOOD}ABCDEFGHIJ 210315 14:22:03.500 L 0100.0 LR 0200.0 0100.0\nnot a record\r\n"
        );
        write_tap_file(&config, "ABCDEFGHIJ_2103.txt", &contents);
        let path = config.raw_tappy_dir().join("ABCDEFGHIJ_2103.txt");

        let validation = validate_file(&path, config.verbosity).unwrap();

        assert_eq!(validation.identity.user_key, "ABCDEFGHIJ");
        assert_eq!(validation.report.accepted, 2);
        assert_eq!(validation.report.rejected, 1);
        assert_eq!(validation.report.error_percentage, 33.3333);
        assert_eq!(validation.rejected_lines, vec!["not a record"]);
        assert_eq!(
            validation.first_recorded_at.map(|t| t.to_string()),
            Some("2021-03-15 14:22:01.123".to_string())
        );
        assert_eq!(
            validation.last_recorded_at.map(|t| t.to_string()),
            Some("2021-03-15 14:22:03.500".to_string())
        );
        assert!(validation
            .check_error_threshold(&config)
            .unwrap_err()
            .is_threshold_breach());
        assert!(!config.good_lines_file().exists());
    }

    #[test]
    fn test_validate_file_matches_file_set_parse() {
        let (_dir, config) = project();
        write_tap_file(&config, "ABCDEFGHIJ_2103.txt", &(GOOD.repeat(19) + "x"));
        let path = config.raw_tappy_dir().join("ABCDEFGHIJ_2103.txt");

        let validation = validate_file(&path, config.verbosity).unwrap();
        let mut parser = TappyFilesParser::new(config.clone()).unwrap();
        parser.parse().unwrap();

        let report = &parser.file_reports()[0];
        assert_eq!(report.accepted, validation.report.accepted);
        assert_eq!(report.rejected, validation.report.rejected);
        assert_eq!(report.error_percentage, validation.report.error_percentage);
        assert!(validation.check_error_threshold(&config).is_ok());
    }
}
