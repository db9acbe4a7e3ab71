//! BookingLens - exploratory analysis of shipment-booking exports
//!
//! A CLI tool that loads a booking CSV, derives per-company booking
//! sequences, and reports inter-booking gaps, shipment-type transitions
//! and day-of-week patterns, with SVG plots.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Load failure or runtime error (missing file, bad CSV, config, I/O)
//!   2 - A record could not be parsed; date-dependent sections were skipped

mod analysis;
mod cli;
mod config;
mod error;
mod loader;
mod models;
mod plot;
mod report;
mod sequencer;

use anyhow::{Context, Result};
use chrono::Utc;
use cli::Args;
use config::{Config, ReportFormat, CONFIG_FILE};
use loader::RawTable;
use models::{Report, ReportMetadata};
use std::time::Instant;
use tracing::{debug, error, info, warn};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    init_logging(&args);

    info!("BookingLens v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);

    let exit_code = match run(args) {
        Ok(exit_code) => exit_code,
        Err(e) => {
            error!("Analysis failed: {:#}", e);
            eprintln!("\n❌ Error: {:#}", e);
            1
        }
    };
    std::process::exit(exit_code);
}

/// Handle --init-config: generate a default .bookinglens.toml.
fn handle_init_config() -> Result<()> {
    let path = std::path::Path::new(CONFIG_FILE);

    if path.exists() {
        eprintln!(
            "⚠️  {} already exists. Remove it first or edit it manually.",
            CONFIG_FILE
        );
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", CONFIG_FILE))?;

    println!("✅ Created {} with default settings.", CONFIG_FILE);
    Ok(())
}

/// Initialize logging based on verbosity settings.
///
/// Logs go to stderr so the report on stdout stays clean. `RUST_LOG`
/// applies unless `--verbose` or `--quiet` is given.
fn init_logging(args: &Args) {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(log_filter(args))
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }
}

fn log_filter(args: &Args) -> EnvFilter {
    let level = LevelFilter::from_level(args.log_level());
    match EnvFilter::try_from_default_env() {
        Ok(filter) if !args.verbose && !args.quiet => filter,
        _ => EnvFilter::default().add_directive(level.into()),
    }
}

/// Resolve settings, run the analysis and emit the report.
fn run(args: Args) -> Result<i32> {
    let mut config = load_config(&args)?;
    config.merge_with_args(&args);
    config.validate().context("Invalid configuration")?;

    let (report, exit_code) = execute(&config, !args.quiet)?;

    let output = match config.report.format {
        ReportFormat::Json => report::generate_json_report(&report)?,
        ReportFormat::Table => report::generate_text_report(&report),
    };

    match config.report.output {
        Some(ref path) => {
            std::fs::write(path, &output)
                .with_context(|| format!("Failed to write report to {}", path.display()))?;
            info!("Report saved to: {}", path.display());
        }
        None => print!("{}", output),
    }

    Ok(exit_code)
}

/// Run the pipeline for `config`. Returns the report and its exit code.
///
/// The exit code is 0, or 2 when a record error skipped the
/// date-dependent sections. Load failures are returned as errors.
fn execute(config: &Config, show_progress: bool) -> Result<(Report, i32)> {
    let start_time = Instant::now();
    let mode = config.analysis.mode;

    // Step 1: Load the file; any failure here aborts the run
    let input = &config.input.path;
    let table = RawTable::from_path(input, show_progress)
        .with_context(|| format!("Error loading data from {}", input.display()))?;
    if table.is_empty() {
        warn!("{} has no data rows", input.display());
    }

    let mut errors = Vec::new();
    let mut exit_code = 0;

    // Step 2: Parse bookings; date-dependent sections need them
    let bookings = match loader::parse_bookings(&table) {
        Ok(bookings) => Some(bookings),
        Err(e) => {
            error!("Date conversion failed: {}", e);
            errors.push(format!("Date-dependent analysis skipped: {}", e));
            exit_code = 2;
            None
        }
    };

    // Step 3: Profile the dataset
    let profile = mode.includes_profile().then(|| {
        analysis::profile(
            &table,
            bookings.as_deref(),
            config.analysis.future_cutoff,
        )
    });

    // Step 4: Sequence, aggregate, plot
    let mut artifacts = Vec::new();
    let results = match (mode.includes_analysis(), bookings.as_deref()) {
        (true, Some(bookings)) => {
            let sequence = sequencer::sequence(bookings);
            if sequence.is_empty() {
                warn!("No bookings to analyze");
            }
            let results = analysis::analyze(bookings, &sequence, &config.analysis);

            if config.plots.enabled {
                artifacts = plot::write_plots(&sequence, &results, &config.plots)?
                    .into_iter()
                    .map(|p| p.display().to_string())
                    .collect();
            }
            Some(results)
        }
        (true, None) => {
            warn!("Skipping gap, transition and day-of-week analysis");
            None
        }
        (false, _) => None,
    };

    let report = Report {
        metadata: ReportMetadata {
            input_path: input.display().to_string(),
            analysis_date: Utc::now(),
            rows_loaded: table.len(),
            columns_loaded: table.headers().len(),
            duration_seconds: start_time.elapsed().as_secs_f64(),
        },
        profile,
        analysis: results,
        artifacts,
        errors,
    };

    Ok((report, exit_code))
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<Config> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        info!("Loading config from: {}", config_path.display());
        return Config::load(config_path);
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => {
            info!("Loaded default config from {}", CONFIG_FILE);
            Ok(config)
        }
        Ok(None) => {
            debug!("No config file found, using defaults");
            Ok(Config::default())
        }
        Err(e) => {
            warn!("Failed to load config: {:#}", e);
            Ok(Config::default())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RunMode;
    use std::io::Write;
    use tempfile::{NamedTempFile, TempDir};

    fn csv_file(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{}", content).unwrap();
        file
    }

    fn config_for(input: &std::path::Path, plot_dir: &TempDir) -> Config {
        let mut config = Config::default();
        config.input.path = input.to_path_buf();
        config.analysis.mode = RunMode::All;
        config.plots.output_dir = plot_dir.path().join("plots");
        config
    }

    #[test]
    fn test_log_filter_flags_win() {
        use clap::Parser;

        let verbose = Args::try_parse_from(["bookinglens", "--verbose"]).unwrap();
        assert!(log_filter(&verbose).to_string().to_lowercase().contains("debug"));

        let quiet = Args::try_parse_from(["bookinglens", "--quiet"]).unwrap();
        assert!(log_filter(&quiet).to_string().to_lowercase().contains("error"));
    }

    #[test]
    fn test_execute_sample_succeeds() {
        let file = csv_file(include_str!("../fixtures/sample_bookings.csv"));
        let plot_dir = TempDir::new().unwrap();
        let config = config_for(file.path(), &plot_dir);

        let (report, exit_code) = execute(&config, false).unwrap();

        assert_eq!(exit_code, 0);
        assert!(report.errors.is_empty());
        assert_eq!(report.metadata.rows_loaded, 14);
        assert!(report.analysis.is_some());
        assert!(report.profile.unwrap().dates.is_some());
        assert_eq!(report.artifacts.len(), 2);
        assert!(config.plots.gap_density_path().exists());
    }

    #[test]
    fn test_record_error_skips_date_sections() {
        let file = csv_file(
            "company_name,booking_date,shipment_type\nA,2025-01-01,Air\nA,not-a-date,Air\n",
        );
        let plot_dir = TempDir::new().unwrap();
        let config = config_for(file.path(), &plot_dir);

        let (report, exit_code) = execute(&config, false).unwrap();

        assert_eq!(exit_code, 2);
        assert!(report.analysis.is_none());
        assert!(report.artifacts.is_empty());
        assert!(!config.plots.output_dir.exists());
        assert_eq!(report.errors.len(), 1);
        assert!(report.errors[0].contains("not-a-date"));

        let profile = report.profile.unwrap();
        assert_eq!(profile.rows, 2);
        assert_eq!(profile.company_counts[0].count, 2);
        assert!(profile.dates.is_none());
    }

    #[test]
    fn test_missing_input_is_an_error() {
        let plot_dir = TempDir::new().unwrap();
        let missing = plot_dir.path().join("missing.csv");
        let config = config_for(&missing, &plot_dir);

        let err = execute(&config, false).unwrap_err();
        assert!(format!("{:#}", err).contains("Error loading data from"));
    }

    #[test]
    fn test_plots_disabled_writes_nothing() {
        let file = csv_file(include_str!("../fixtures/sample_bookings.csv"));
        let plot_dir = TempDir::new().unwrap();
        let mut config = config_for(file.path(), &plot_dir);
        config.plots.enabled = false;

        let (report, exit_code) = execute(&config, false).unwrap();

        assert_eq!(exit_code, 0);
        assert!(report.analysis.is_some());
        assert!(report.artifacts.is_empty());
        assert!(!config.plots.output_dir.exists());
    }

    #[test]
    fn test_profile_mode_skips_analysis() {
        let file = csv_file(include_str!("../fixtures/sample_bookings.csv"));
        let plot_dir = TempDir::new().unwrap();
        let mut config = config_for(file.path(), &plot_dir);
        config.analysis.mode = RunMode::Profile;

        let (report, exit_code) = execute(&config, false).unwrap();

        assert_eq!(exit_code, 0);
        assert!(report.analysis.is_none());
        assert!(report.profile.is_some());
        assert!(report.artifacts.is_empty());
    }
}
