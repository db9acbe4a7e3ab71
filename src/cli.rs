//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation. Options left unset fall back to the
//! configuration file.

use crate::config::{ReportFormat, RunMode};
use chrono::NaiveDate;
use clap::Parser;
use std::path::PathBuf;

/// BookingLens - exploratory analysis of shipment-booking exports
///
/// Loads a booking CSV, measures the days between each company's
/// bookings, estimates shipment-type transition probabilities and
/// day-of-week patterns, and renders a gap density plot and a
/// transition heatmap.
///
/// Examples:
///   bookinglens shipment_booking_data_2021_2025.csv
///   bookinglens bookings.csv --mode all --format json --output report.json
///   bookinglens bookings.csv --top-companies 8 --output-dir plots
///   bookinglens --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Booking CSV to analyze
    ///
    /// Must contain company_name, booking_date and shipment_type columns.
    /// Defaults to the path in .bookinglens.toml, or
    /// shipment_booking_data_2021_2025.csv.
    #[arg(value_name = "FILE", env = "BOOKINGLENS_INPUT")]
    pub input: Option<PathBuf>,

    /// Sections to produce (analyze, profile, all)
    #[arg(long, value_name = "MODE")]
    pub mode: Option<RunMode>,

    /// Output format (table, json)
    #[arg(long, value_name = "FORMAT")]
    pub format: Option<ReportFormat>,

    /// Write the report to a file instead of standard output
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Directory for the rendered plots
    #[arg(long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Skip rendering plots
    #[arg(long)]
    pub no_plots: bool,

    /// Number of busiest companies drawn in the gap density plot
    #[arg(long, value_name = "COUNT")]
    pub top_companies: Option<usize>,

    /// Number of busiest companies given a day-of-week table
    #[arg(long, value_name = "COUNT")]
    pub dow_companies: Option<usize>,

    /// Flag bookings dated after this day (YYYY-MM-DD) in the profile
    #[arg(long, value_name = "DATE")]
    pub future_cutoff: Option<NaiveDate>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .bookinglens.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,

    /// Generate a default .bookinglens.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        if self.init_config {
            return Ok(());
        }

        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if self.top_companies == Some(0) {
            return Err("Top companies must be at least 1".to_string());
        }

        if self.dow_companies == Some(0) {
            return Err("Day-of-week companies must be at least 1".to_string());
        }

        if let Some(ref dir) = self.output_dir {
            if dir.exists() && !dir.is_dir() {
                return Err(format!(
                    "Output path is not a directory: {}",
                    dir.display()
                ));
            }
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}
