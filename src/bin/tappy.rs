//! Tappy CLI - Command-line interface for tappy-prep
//!
//! Commands:
//! - load: Load the cached tables, parsing source files when needed
//! - parse: Regenerate the intermediate artifacts from the source files
//! - validate: Classify the lines of a single tap file
//! - doctor: Diagnose configuration, inputs and cached artifacts

use clap::{Parser, Subcommand, ValueEnum};
use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use tappy_prep::tappy::validate_file;
use tappy_prep::{
    DatasetSource, PrepError, ProjectConfig, Table, TappyFilesParser, TappyLoader,
    UsersFilesParser, UsersLoader, Verbosity, PREP_VERSION, PRODUCER_NAME,
};

/// Tappy - data preparation for the Tappy keystroke dataset
#[derive(Parser)]
#[command(name = "tappy")]
#[command(version = PREP_VERSION)]
#[command(about = "Parse and cache the Tappy keystroke dataset", long_about = None)]
struct Cli {
    /// Project home directory (contains data/raw_downloaded)
    #[arg(long, global = true)]
    home: Option<PathBuf>,

    /// JSON configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Maximum fraction of rejected lines per tap file (e.g. 0.06)
    #[arg(long, global = true)]
    error_threshold: Option<f64>,

    /// Increase output (-v per-file progress, -vv per-line diagnostics)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Only report errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load the final tables, parsing and caching whatever is missing
    Load {
        /// Dataset to load
        #[arg(value_enum, default_value = "all")]
        dataset: Dataset,

        /// Stop at the intermediate (pre-normalization) table
        #[arg(long)]
        raw: bool,
    },

    /// Regenerate the intermediate artifacts from the source files
    Parse {
        /// Dataset to parse
        #[arg(value_enum, default_value = "all")]
        dataset: Dataset,
    },

    /// Classify the lines of a single tap file
    Validate {
        /// Tap file named <user_key>_<YYMM>.txt
        #[arg(short, long)]
        input: PathBuf,

        /// Output validation report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Diagnose configuration, inputs and cached artifacts
    Doctor {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Dataset {
    /// Tap events
    Tappy,
    /// User attributes
    Users,
    /// Both datasets
    All,
}

impl Dataset {
    fn includes_tappy(self) -> bool {
        matches!(self, Dataset::Tappy | Dataset::All)
    }

    fn includes_users(self) -> bool {
        matches!(self, Dataset::Users | Dataset::All)
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!(
                "{}",
                serde_json::to_string(&CliError::from(e))
                    .unwrap_or_else(|_| "Unknown error".to_string())
            );
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), TappyCliError> {
    let config = resolve_config(&cli)?;
    init_logging(config.verbosity);

    match cli.command {
        Commands::Load { dataset, raw } => cmd_load(&config, dataset, raw),
        Commands::Parse { dataset } => cmd_parse(&config, dataset),
        Commands::Validate { input, json } => cmd_validate(&config, &input, json),
        Commands::Doctor { json } => cmd_doctor(&config, json),
    }
}

fn resolve_config(cli: &Cli) -> Result<ProjectConfig, TappyCliError> {
    let mut config = match &cli.config {
        Some(path) => ProjectConfig::load(path)?,
        None => ProjectConfig::default(),
    };

    if let Some(home) = &cli.home {
        config.home_dir = home.clone();
    }
    if let Some(threshold) = cli.error_threshold {
        config.error_threshold = threshold;
    }
    if cli.quiet {
        config.verbosity = Verbosity::SILENT;
    } else if cli.verbose > 0 {
        config.verbosity = Verbosity(cli.verbose.saturating_add(1).min(Verbosity::DIAGNOSTIC.0));
    }

    config.validate()?;
    Ok(config)
}

fn init_logging(verbosity: Verbosity) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(verbosity.level_name()));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

fn cmd_load(config: &ProjectConfig, dataset: Dataset, raw: bool) -> Result<(), TappyCliError> {
    if dataset.includes_tappy() {
        let loader = TappyLoader::tappy(config.clone());
        let table = if raw {
            loader.load_raw_table()?
        } else {
            loader.load_table()?
        };
        print_summary(loader.source(), raw, &table);
    }

    if dataset.includes_users() {
        let loader = UsersLoader::users(config.clone());
        let table = if raw {
            loader.load_raw_table()?
        } else {
            loader.load_table()?
        };
        print_summary(loader.source(), raw, &table);
    }

    Ok(())
}

fn print_summary(source: &impl DatasetSource, raw: bool, table: &Table) {
    let artifact = if raw {
        source.raw_artifact()
    } else {
        source.final_artifact()
    };
    println!(
        "{}: {} rows x {} columns ({}) from {}",
        source.name(),
        table.len(),
        table.columns().len(),
        table.column_names().join(", "),
        artifact.display()
    );
}

fn cmd_parse(config: &ProjectConfig, dataset: Dataset) -> Result<(), TappyCliError> {
    if dataset.includes_tappy() {
        TappyFilesParser::new(config.clone())?.generate_output_files()?;
    }
    if dataset.includes_users() {
        UsersFilesParser::new(config.clone())?.generate_output_files()?;
    }
    Ok(())
}

fn cmd_validate(config: &ProjectConfig, input: &Path, json: bool) -> Result<(), TappyCliError> {
    let validation = validate_file(input, config.verbosity)?;

    let report = ValidationReport {
        path: input.display().to_string(),
        user_key: validation.identity.user_key.clone(),
        year_month: validation.identity.year_month.clone(),
        total_lines: validation.report.accepted + validation.report.rejected,
        accepted_lines: validation.report.accepted,
        rejected_lines: validation.report.rejected,
        error_percentage: validation.report.error_percentage,
        threshold_percentage: config.threshold_percentage(),
        first_recorded_at: validation.first_recorded_at.map(|t| t.to_string()),
        last_recorded_at: validation.last_recorded_at.map(|t| t.to_string()),
        rejected: validation.rejected_lines.clone(),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Validation Report");
        println!("=================");
        println!("File:             {}", report.path);
        println!("User key:         {}", report.user_key);
        println!("Lines processed:  {}", report.total_lines);
        println!("Accepted lines:   {}", report.accepted_lines);
        println!("Unparseable:      {}", report.rejected_lines);
        println!("Error percentage: {}%", report.error_percentage);
        if let (Some(first), Some(last)) = (&report.first_recorded_at, &report.last_recorded_at) {
            println!("Recorded:         {} .. {}", first, last);
        }

        if !report.rejected.is_empty() {
            println!("\nRejected lines:");
            for line in &report.rejected {
                println!("  - {}", line);
            }
        }
    }

    validation.check_error_threshold(config)?;
    Ok(())
}

fn cmd_doctor(config: &ProjectConfig, json: bool) -> Result<(), TappyCliError> {
    let mut checks: Vec<DoctorCheck> = Vec::new();

    checks.push(DoctorCheck {
        name: "config".to_string(),
        status: CheckStatus::Ok,
        message: format!(
            "home {} (error threshold {}%, verbosity {})",
            config.home_dir.display(),
            config.threshold_percentage(),
            config.verbosity.0
        ),
    });

    let tappy_dir = config.raw_tappy_dir();
    checks.push(if tappy_dir.is_dir() {
        let parser = TappyFilesParser::new(config.clone())?;
        input_files_check("tappy_files", &tappy_dir, parser.tappy_files())
    } else {
        missing_dir_check("tappy_files", &tappy_dir)
    });

    let users_dir = config.raw_users_dir();
    checks.push(if users_dir.is_dir() {
        let parser = UsersFilesParser::new(config.clone())?;
        input_files_check("users_files", &users_dir, parser.users_files())
    } else {
        missing_dir_check("users_files", &users_dir)
    });

    for (name, path) in [
        ("good_lines", config.good_lines_file()),
        ("bad_lines", config.bad_lines_file()),
        ("raw_parsed_users", config.raw_users_file()),
        ("tappy_dataframe", config.tappy_dataframe_file()),
        ("users_dataframe", config.users_dataframe_file()),
    ] {
        checks.push(artifact_check(name, &path));
    }

    let report = DoctorReport {
        producer: PRODUCER_NAME.to_string(),
        version: PREP_VERSION.to_string(),
        checks,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Tappy Doctor Report");
        println!("===================");
        println!("Producer: {}", report.producer);
        println!("Version:  {}", report.version);
        println!("\nChecks:");

        for check in &report.checks {
            let status_icon = match check.status {
                CheckStatus::Ok => "[OK]",
                CheckStatus::Warning => "[WARN]",
                CheckStatus::Error => "[ERR]",
            };
            println!("  {} {}: {}", status_icon, check.name, check.message);
        }
    }

    let has_errors = report
        .checks
        .iter()
        .any(|c| matches!(c.status, CheckStatus::Error));
    if has_errors {
        Err(TappyCliError::DoctorFailed)
    } else {
        Ok(())
    }
}

fn missing_dir_check(name: &str, dir: &Path) -> DoctorCheck {
    DoctorCheck {
        name: name.to_string(),
        status: CheckStatus::Error,
        message: format!("Directory does not exist: {}", dir.display()),
    }
}

fn input_files_check(name: &str, dir: &Path, files: &[PathBuf]) -> DoctorCheck {
    let status = if files.is_empty() {
        CheckStatus::Warning
    } else {
        CheckStatus::Ok
    };
    DoctorCheck {
        name: name.to_string(),
        status,
        message: format!("{} .txt files in {}", files.len(), dir.display()),
    }
}

fn artifact_check(name: &str, path: &Path) -> DoctorCheck {
    if path.is_file() {
        DoctorCheck {
            name: name.to_string(),
            status: CheckStatus::Ok,
            message: format!("cached at {}", path.display()),
        }
    } else {
        DoctorCheck {
            name: name.to_string(),
            status: CheckStatus::Warning,
            message: format!("not generated yet ({})", path.display()),
        }
    }
}

#[derive(Debug)]
enum TappyCliError {
    Prep(PrepError),
    Json(serde_json::Error),
    DoctorFailed,
}

impl From<PrepError> for TappyCliError {
    fn from(e: PrepError) -> Self {
        TappyCliError::Prep(e)
    }
}

impl From<serde_json::Error> for TappyCliError {
    fn from(e: serde_json::Error) -> Self {
        TappyCliError::Json(e)
    }
}

#[derive(serde::Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<TappyCliError> for CliError {
    fn from(e: TappyCliError) -> Self {
        match e {
            TappyCliError::Prep(e) => {
                let (code, hint) = match &e {
                    PrepError::Io { .. } => ("IO_ERROR", "Check file paths and permissions"),
                    PrepError::MalformedFileName { .. } => (
                        "MALFORMED_FILE_NAME",
                        "Rename or remove files that break the naming convention",
                    ),
                    PrepError::ErrorThresholdExceeded { .. } => (
                        "ERROR_THRESHOLD_EXCEEDED",
                        "Inspect the file with 'tappy validate' or raise --error-threshold",
                    ),
                    PrepError::InvalidConfig(_) | PrepError::JsonError(_) => {
                        ("CONFIG_ERROR", "Check the configuration values")
                    }
                    PrepError::MalformedArtifact { .. } => (
                        "MALFORMED_ARTIFACT",
                        "Delete the cached artifact to regenerate it",
                    ),
                    _ => ("PREP_ERROR", "Check file paths and permissions"),
                };
                CliError {
                    code: code.to_string(),
                    message: e.to_string(),
                    hint: Some(hint.to_string()),
                }
            }
            TappyCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: None,
            },
            TappyCliError::DoctorFailed => CliError {
                code: "DOCTOR_FAILED".to_string(),
                message: "One or more health checks failed".to_string(),
                hint: Some("Review the doctor report for details".to_string()),
            },
        }
    }
}

// Report types

#[derive(serde::Serialize)]
struct ValidationReport {
    path: String,
    user_key: String,
    year_month: String,
    total_lines: usize,
    accepted_lines: usize,
    rejected_lines: usize,
    error_percentage: f64,
    threshold_percentage: f64,
    first_recorded_at: Option<String>,
    last_recorded_at: Option<String>,
    rejected: Vec<String>,
}

#[derive(serde::Serialize)]
struct DoctorReport {
    producer: String,
    version: String,
    checks: Vec<DoctorCheck>,
}

#[derive(serde::Serialize)]
struct DoctorCheck {
    name: String,
    status: CheckStatus,
    message: String,
}

#[derive(serde::Serialize)]
enum CheckStatus {
    Ok,
    Warning,
    Error,
}
