//! Data models for the booking analyzer.
//!
//! This module contains the core data structures used throughout the
//! application: loaded bookings, the records derived from them, the
//! aggregated statistics, and the final report.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc, Weekday};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A single shipment booking as loaded from the input file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Booking {
    /// Company that placed the booking.
    pub company_name: String,
    /// When the booking was made. Date-only inputs are midnight.
    pub booking_date: NaiveDateTime,
    /// Shipment mode (e.g. "Air", "Sea").
    pub shipment_type: String,
}

impl Booking {
    /// Creates a booking.
    pub fn new(
        company_name: impl Into<String>,
        booking_date: NaiveDateTime,
        shipment_type: impl Into<String>,
    ) -> Self {
        Self {
            company_name: company_name.into(),
            booking_date,
            shipment_type: shipment_type.into(),
        }
    }

    /// Calendar day of the booking.
    pub fn day(&self) -> NaiveDate {
        self.booking_date.date()
    }
}

/// Day of the week, ordered Monday first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum DayOfWeek {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl From<Weekday> for DayOfWeek {
    fn from(day: Weekday) -> Self {
        match day {
            Weekday::Mon => DayOfWeek::Monday,
            Weekday::Tue => DayOfWeek::Tuesday,
            Weekday::Wed => DayOfWeek::Wednesday,
            Weekday::Thu => DayOfWeek::Thursday,
            Weekday::Fri => DayOfWeek::Friday,
            Weekday::Sat => DayOfWeek::Saturday,
            Weekday::Sun => DayOfWeek::Sunday,
        }
    }
}

impl fmt::Display for DayOfWeek {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DayOfWeek::Monday => "Monday",
            DayOfWeek::Tuesday => "Tuesday",
            DayOfWeek::Wednesday => "Wednesday",
            DayOfWeek::Thursday => "Thursday",
            DayOfWeek::Friday => "Friday",
            DayOfWeek::Saturday => "Saturday",
            DayOfWeek::Sunday => "Sunday",
        };
        write!(f, "{}", name)
    }
}

/// Per-booking gap relative to the same company's previous booking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GapRecord {
    pub company_name: String,
    pub booking_date: NaiveDateTime,
    /// `None` for the company's earliest booking.
    pub prev_booking_date: Option<NaiveDateTime>,
    /// Whole days since the previous booking; `None` iff there is none.
    pub days_gap: Option<i64>,
}

/// Consecutive shipment types within one company's booking sequence.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TransitionPair {
    pub current_type: String,
    pub next_type: String,
}

/// A value and how often it occurs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValueCount {
    pub value: String,
    pub count: usize,
}

/// Gap statistics for one company.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GapStats {
    /// Number of gaps the statistics were computed from.
    pub count: usize,
    pub mean: f64,
    pub median: f64,
    /// Sample standard deviation; undefined with fewer than two gaps.
    pub std_dev: Option<f64>,
    pub max: f64,
}

/// Gap statistics for every company.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GapStatistics {
    /// Companies with at least one gap.
    pub by_company: BTreeMap<String, GapStats>,
    /// Companies with a single booking, so no gap at all.
    pub undefined: Vec<String>,
}

/// Outgoing transition probabilities for one shipment type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransitionRow {
    /// Number of transitions observed out of this type.
    pub observations: usize,
    /// Probability per next type; covers every matrix column.
    pub probabilities: BTreeMap<String, f64>,
}

/// Empirical shipment-type transition matrix.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransitionMatrix {
    /// Every next type observed in any row.
    pub columns: Vec<String>,
    /// Rows keyed by current type; only types with observations.
    pub rows: BTreeMap<String, TransitionRow>,
    /// Types never followed by another booking.
    pub undefined: Vec<String>,
}

impl TransitionMatrix {
    /// Probability of moving from `current` to `next`, if the row is defined.
    pub fn probability(&self, current: &str, next: &str) -> Option<f64> {
        self.rows
            .get(current)
            .map(|row| row.probabilities.get(next).copied().unwrap_or(0.0))
    }

    /// Whether no row is defined.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Shipment-type distribution by day of week for one company.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayOfWeekTable {
    pub company_name: String,
    /// Shipment types the company used.
    pub columns: Vec<String>,
    /// Normalized distribution per day; only days with bookings.
    pub rows: BTreeMap<DayOfWeek, BTreeMap<String, f64>>,
}

/// Day-of-week tables for the selected companies.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DayOfWeekBreakdown {
    pub tables: Vec<DayOfWeekTable>,
    /// Selected companies without any booking.
    pub undefined: Vec<String>,
}

/// Everything computed from the sequenced bookings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResults {
    /// Companies ranked by booking count (used for the density plot).
    pub top_companies: Vec<ValueCount>,
    pub gap_statistics: GapStatistics,
    pub transition_matrix: TransitionMatrix,
    pub day_of_week: DayOfWeekBreakdown,
}

/// Inferred type of a raw column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    Integer,
    Float,
    Text,
    /// Every cell is blank.
    Empty,
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnType::Integer => write!(f, "integer"),
            ColumnType::Float => write!(f, "float"),
            ColumnType::Text => write!(f, "text"),
            ColumnType::Empty => write!(f, "empty"),
        }
    }
}

/// Shape and completeness of one raw column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnProfile {
    pub name: String,
    pub inferred_type: ColumnType,
    /// Blank cells.
    pub missing: usize,
}

/// Descriptive statistics of a numeric series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Describe {
    pub count: usize,
    pub mean: f64,
    pub std_dev: Option<f64>,
    pub min: f64,
    pub q25: f64,
    pub median: f64,
    pub q75: f64,
    pub max: f64,
}

/// Calendar coverage of one company's bookings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompanyCalendar {
    pub company_name: String,
    pub first: NaiveDate,
    pub last: NaiveDate,
    /// Days in `first..=last` without a booking.
    pub missing_days: usize,
}

/// Date-dependent part of the dataset profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DateProfile {
    pub first: NaiveDateTime,
    pub last: NaiveDateTime,
    /// Bookings per calendar day.
    pub daily_bookings: Describe,
    pub future_cutoff: NaiveDate,
    /// Bookings dated after `future_cutoff`.
    pub future_bookings: usize,
    pub calendars: Vec<CompanyCalendar>,
}

/// Inspection of the raw dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetProfile {
    pub rows: usize,
    pub columns: Vec<ColumnProfile>,
    /// First rows of the file, as read.
    pub head: Vec<Vec<String>>,
    /// Rows identical to an earlier row.
    pub duplicate_rows: usize,
    pub company_counts: Vec<ValueCount>,
    pub shipment_type_counts: Vec<ValueCount>,
    /// `None` when booking dates could not be parsed.
    pub dates: Option<DateProfile>,
}

/// Metadata about the analysis run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportMetadata {
    /// Path of the analyzed file.
    pub input_path: String,
    /// Date and time of the analysis.
    pub analysis_date: DateTime<Utc>,
    /// Data rows read from the file.
    pub rows_loaded: usize,
    /// Columns read from the file.
    pub columns_loaded: usize,
    /// Duration of the run in seconds.
    pub duration_seconds: f64,
}

/// The complete analysis report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    pub metadata: ReportMetadata,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile: Option<DatasetProfile>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analysis: Option<AnalysisResults>,
    /// Image files written during the run.
    pub artifacts: Vec<String>,
    /// Errors that caused sections to be skipped.
    pub errors: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(date: &str) -> NaiveDateTime {
        NaiveDate::parse_from_str(date, "%Y-%m-%d")
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_day_of_week_ordering() {
        assert!(DayOfWeek::Monday < DayOfWeek::Tuesday);
        assert!(DayOfWeek::Saturday < DayOfWeek::Sunday);
    }

    #[test]
    fn test_booking_day_of_week() {
        use chrono::Datelike;

        // 2025-01-03 was a Friday
        let booking = Booking::new("A", at("2025-01-03"), "Air");
        let day = DayOfWeek::from(booking.booking_date.weekday());
        assert_eq!(day, DayOfWeek::Friday);
        assert_eq!(day.to_string(), "Friday");
        assert_eq!(booking.day(), at("2025-01-03").date());
    }

    #[test]
    fn test_transition_matrix_probability() {
        let mut matrix = TransitionMatrix {
            columns: vec!["Air".to_string(), "Sea".to_string()],
            ..Default::default()
        };
        matrix.rows.insert(
            "Air".to_string(),
            TransitionRow {
                observations: 2,
                probabilities: [("Air".to_string(), 1.0), ("Sea".to_string(), 0.0)]
                    .into_iter()
                    .collect(),
            },
        );
        matrix.undefined.push("Sea".to_string());

        assert_eq!(matrix.probability("Air", "Air"), Some(1.0));
        assert_eq!(matrix.probability("Air", "Sea"), Some(0.0));
        assert_eq!(matrix.probability("Sea", "Air"), None);
        assert!(!matrix.is_empty());
    }

    #[test]
    fn test_column_type_display() {
        assert_eq!(ColumnType::Integer.to_string(), "integer");
        assert_eq!(ColumnType::Empty.to_string(), "empty");
    }
}
