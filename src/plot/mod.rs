//! Plot rendering.
//!
//! Renders the gap density plot and the transition heatmap as SVG files.

pub mod density;
pub mod heatmap;
pub mod svg;

pub use density::render_gap_density;
pub use heatmap::render_transition_heatmap;

use crate::analysis::gaps_by_company;
use crate::config::PlotConfig;
use crate::models::AnalysisResults;
use crate::sequencer::Sequence;
use anyhow::{Context, Result};
use std::path::PathBuf;
use tracing::{info, warn};

/// Line colours for successive series.
pub const PALETTE: [&str; 10] = [
    "#1f77b4", "#ff7f0e", "#2ca02c", "#d62728", "#9467bd", "#8c564b", "#e377c2", "#7f7f7f",
    "#bcbd22", "#17becf",
];

/// Render both plots into the configured directory. Returns the files written.
pub fn write_plots(
    sequence: &Sequence,
    results: &AnalysisResults,
    settings: &PlotConfig,
) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(&settings.output_dir).with_context(|| {
        format!(
            "Failed to create plot directory {}",
            settings.output_dir.display()
        )
    })?;

    let mut written = Vec::new();

    let mut gaps = gaps_by_company(sequence);
    let series: Vec<(String, Vec<f64>)> = results
        .top_companies
        .iter()
        .map(|c| (c.value.clone(), gaps.remove(&c.value).unwrap_or_default()))
        .collect();

    match render_gap_density(&series, settings) {
        Some(svg) => {
            let path = settings.gap_density_path();
            std::fs::write(&path, svg)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            info!("Saved {}", path.display());
            written.push(path);
        }
        None => warn!("No company has enough gaps for a density plot"),
    }

    match render_transition_heatmap(&results.transition_matrix) {
        Some(svg) => {
            let path = settings.transition_heatmap_path();
            std::fs::write(&path, svg)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            info!("Saved {}", path.display());
            written.push(path);
        }
        None => warn!("Transition matrix is empty, skipping heatmap"),
    }

    Ok(written)
}
