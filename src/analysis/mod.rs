//! Analysis modules.
//!
//! Aggregation over sequenced bookings, and inspection of the raw dataset.

pub mod aggregator;
pub mod profile;

pub use aggregator::*;
pub use profile::profile;

use crate::config::AnalysisConfig;
use crate::models::{AnalysisResults, Booking};
use crate::sequencer::Sequence;
use tracing::info;

/// Run every aggregation over an already sequenced booking set.
pub fn analyze(
    bookings: &[Booking],
    sequence: &Sequence,
    config: &AnalysisConfig,
) -> AnalysisResults {
    let dow_companies: Vec<String> = top_companies(bookings, config.day_of_week_companies)
        .into_iter()
        .map(|c| c.value)
        .collect();

    let results = AnalysisResults {
        top_companies: top_companies(bookings, config.top_companies),
        gap_statistics: gap_statistics(sequence),
        transition_matrix: transition_matrix(sequence),
        day_of_week: day_of_week_breakdown(sequence, &dow_companies),
    };

    info!(
        "Analyzed {} bookings across {} companies",
        bookings.len(),
        sequence.companies().len()
    );
    results
}
