//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.bookinglens.toml` files.

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default configuration file name, looked up in the working directory.
pub const CONFIG_FILE: &str = ".bookinglens.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Input settings.
    #[serde(default)]
    pub input: InputConfig,

    /// Analysis settings.
    #[serde(default)]
    pub analysis: AnalysisConfig,

    /// Plot settings.
    #[serde(default)]
    pub plots: PlotConfig,

    /// Report settings.
    #[serde(default)]
    pub report: ReportConfig,
}

/// Input file settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputConfig {
    /// Booking CSV to analyze.
    #[serde(default = "default_input_path")]
    pub path: PathBuf,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            path: default_input_path(),
        }
    }
}

fn default_input_path() -> PathBuf {
    PathBuf::from("shipment_booking_data_2021_2025.csv")
}

/// Which sections a run produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum RunMode {
    /// Gap statistics, transitions and day-of-week tables (default)
    #[default]
    Analyze,
    /// Dataset inspection only
    Profile,
    /// Both
    All,
}

impl RunMode {
    pub fn includes_analysis(self) -> bool {
        matches!(self, RunMode::Analyze | RunMode::All)
    }

    pub fn includes_profile(self) -> bool {
        matches!(self, RunMode::Profile | RunMode::All)
    }
}

/// Analysis settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Sections to produce.
    #[serde(default)]
    pub mode: RunMode,

    /// Companies drawn in the gap density plot.
    #[serde(default = "default_top_companies")]
    pub top_companies: usize,

    /// Companies given a day-of-week table.
    #[serde(default = "default_day_of_week_companies")]
    pub day_of_week_companies: usize,

    /// Bookings after this date are flagged by the profile.
    #[serde(default = "default_future_cutoff")]
    pub future_cutoff: NaiveDate,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            mode: RunMode::default(),
            top_companies: default_top_companies(),
            day_of_week_companies: default_day_of_week_companies(),
            future_cutoff: default_future_cutoff(),
        }
    }
}

fn default_top_companies() -> usize {
    5
}

fn default_day_of_week_companies() -> usize {
    3
}

fn default_future_cutoff() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 12, 31).unwrap_or(NaiveDate::MAX)
}

/// Plot rendering settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlotConfig {
    /// Render plots at all.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Directory the plot files are written to.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// File name of the gap density plot.
    #[serde(default = "default_gap_density_file")]
    pub gap_density_file: String,

    /// File name of the transition heatmap.
    #[serde(default = "default_transition_heatmap_file")]
    pub transition_heatmap_file: String,

    /// Density is only evaluated within this range of days.
    #[serde(default)]
    pub clip_min: f64,

    #[serde(default = "default_clip_max")]
    pub clip_max: f64,

    /// Visible x-axis window in days.
    #[serde(default)]
    pub x_min: f64,

    #[serde(default = "default_x_max")]
    pub x_max: f64,

    /// Density evaluation points.
    #[serde(default = "default_grid_points")]
    pub grid_points: usize,
}

impl Default for PlotConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            output_dir: default_output_dir(),
            gap_density_file: default_gap_density_file(),
            transition_heatmap_file: default_transition_heatmap_file(),
            clip_min: 0.0,
            clip_max: default_clip_max(),
            x_min: 0.0,
            x_max: default_x_max(),
            grid_points: default_grid_points(),
        }
    }
}

impl PlotConfig {
    pub fn gap_density_path(&self) -> PathBuf {
        self.output_dir.join(&self.gap_density_file)
    }

    pub fn transition_heatmap_path(&self) -> PathBuf {
        self.output_dir.join(&self.transition_heatmap_file)
    }
}

fn default_true() -> bool {
    true
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_gap_density_file() -> String {
    "booking_gaps_kde.svg".to_string()
}

fn default_transition_heatmap_file() -> String {
    "transition_matrix.svg".to_string()
}

fn default_clip_max() -> f64 {
    30.0
}

fn default_x_max() -> f64 {
    15.0
}

fn default_grid_points() -> usize {
    200
}

/// Output format for the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    /// Console tables (default)
    #[default]
    Table,
    /// JSON document
    Json,
}

/// Report settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Output format.
    #[serde(default)]
    pub format: ReportFormat,

    /// Write the report here instead of standard output.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<PathBuf>,
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(CONFIG_FILE);

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence, but only when explicitly given.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref input) = args.input {
            self.input.path = input.clone();
        }

        if let Some(mode) = args.mode {
            self.analysis.mode = mode;
        }
        if let Some(n) = args.top_companies {
            self.analysis.top_companies = n;
        }
        if let Some(n) = args.dow_companies {
            self.analysis.day_of_week_companies = n;
        }
        if let Some(cutoff) = args.future_cutoff {
            self.analysis.future_cutoff = cutoff;
        }

        if let Some(ref dir) = args.output_dir {
            self.plots.output_dir = dir.clone();
        }
        // Flags always override
        if args.no_plots {
            self.plots.enabled = false;
        }

        if let Some(format) = args.format {
            self.report.format = format;
        }
        if let Some(ref output) = args.output {
            self.report.output = Some(output.clone());
        }
    }

    /// Check settings that would make the analysis meaningless.
    ///
    /// Runs after merging, so values from the file are covered too.
    pub fn validate(&self) -> Result<()> {
        if self.analysis.top_companies == 0 {
            bail!("top_companies must be at least 1");
        }
        if self.analysis.day_of_week_companies == 0 {
            bail!("day_of_week_companies must be at least 1");
        }
        if !(self.plots.clip_min < self.plots.clip_max) {
            bail!(
                "clip_min ({}) must be below clip_max ({})",
                self.plots.clip_min,
                self.plots.clip_max
            );
        }
        if !(self.plots.x_min < self.plots.x_max) {
            bail!(
                "x_min ({}) must be below x_max ({})",
                self.plots.x_min,
                self.plots.x_max
            );
        }
        if self.plots.grid_points < 2 {
            bail!("grid_points must be at least 2");
        }
        Ok(())
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}
