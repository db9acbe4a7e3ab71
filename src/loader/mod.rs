//! Booking file loader.
//!
//! Reads the input CSV into a raw string table, checks that the required
//! columns are present, and turns rows into [`Booking`]s.

use crate::error::{LoadError, RecordError};
use crate::models::Booking;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use indicatif::{ProgressBar, ProgressStyle};
use std::io;
use std::path::Path;
use tracing::{debug, info};

pub const COMPANY_COLUMN: &str = "company_name";
pub const DATE_COLUMN: &str = "booking_date";
pub const SHIPMENT_TYPE_COLUMN: &str = "shipment_type";

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d"];

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// The input file as trimmed strings, with required columns located.
#[derive(Debug, Clone)]
pub struct RawTable {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
    company_idx: usize,
    date_idx: usize,
    shipment_type_idx: usize,
}

impl RawTable {
    /// Load a CSV file from disk.
    pub fn from_path(path: &Path, show_progress: bool) -> Result<Self, LoadError> {
        info!("Loading bookings from: {}", path.display());

        let reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_path(path)
            .map_err(|source| LoadError::Open {
                path: path.to_path_buf(),
                source,
            })?;

        Self::from_csv(reader, show_progress)
    }

    /// Load CSV data from any reader.
    pub fn from_reader<R: io::Read>(reader: R) -> Result<Self, LoadError> {
        let reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        Self::from_csv(reader, false)
    }

    fn from_csv<R: io::Read>(
        mut reader: csv::Reader<R>,
        show_progress: bool,
    ) -> Result<Self, LoadError> {
        let headers: Vec<String> = reader
            .headers()
            .map_err(|source| LoadError::Malformed { row: 0, source })?
            .iter()
            .map(|h| h.trim_start_matches('\u{feff}').to_string())
            .collect();

        debug!("Columns: {:?}", headers);

        let locate = |name: &'static str| {
            headers
                .iter()
                .position(|h| h == name)
                .ok_or(LoadError::MissingColumn(name))
        };
        let company_idx = locate(COMPANY_COLUMN)?;
        let date_idx = locate(DATE_COLUMN)?;
        let shipment_type_idx = locate(SHIPMENT_TYPE_COLUMN)?;

        let spinner = show_progress.then(|| {
            let pb = ProgressBar::new_spinner();
            pb.set_style(
                ProgressStyle::default_spinner()
                    .template("{spinner:.green} [{elapsed_precise}] {pos} rows read")
                    .unwrap_or_else(|_| ProgressStyle::default_spinner()),
            );
            pb
        });

        let mut rows = Vec::new();
        for (i, result) in reader.records().enumerate() {
            let record = result.map_err(|source| LoadError::Malformed { row: i + 1, source })?;
            rows.push(record.iter().map(String::from).collect());

            if let Some(ref pb) = spinner {
                pb.inc(1);
            }
        }

        if let Some(pb) = spinner {
            pb.finish_and_clear();
        }

        info!("Data loaded. Shape: ({}, {})", rows.len(), headers.len());

        Ok(Self {
            headers,
            rows,
            company_idx,
            date_idx,
            shipment_type_idx,
        })
    }

    /// Column names in file order.
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Data rows in file order.
    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    /// Number of data rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the file has no data rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// All cells of one column.
    pub fn column(&self, idx: usize) -> impl Iterator<Item = &str> {
        self.rows
            .iter()
            .map(move |row| row.get(idx).map(String::as_str).unwrap_or(""))
    }

    /// Company names in file order, blanks included.
    pub fn companies(&self) -> impl Iterator<Item = &str> {
        self.column(self.company_idx)
    }

    /// Shipment types in file order, blanks included.
    pub fn shipment_types(&self) -> impl Iterator<Item = &str> {
        self.column(self.shipment_type_idx)
    }
}

/// Convert every row of the table into a booking.
///
/// Fails on the first row with a blank required field or an unparsable date.
pub fn parse_bookings(table: &RawTable) -> Result<Vec<Booking>, RecordError> {
    let mut bookings = Vec::with_capacity(table.len());

    for (i, row) in table.rows().iter().enumerate() {
        let row_number = i + 1;
        let field = |idx: usize, column: &'static str| {
            row.get(idx)
                .map(String::as_str)
                .filter(|v| !v.is_empty())
                .ok_or(RecordError::MissingField {
                    row: row_number,
                    column,
                })
        };

        let company = field(table.company_idx, COMPANY_COLUMN)?;
        let raw_date = field(table.date_idx, DATE_COLUMN)?;
        let shipment_type = field(table.shipment_type_idx, SHIPMENT_TYPE_COLUMN)?;

        let booking_date =
            parse_booking_date(raw_date).ok_or_else(|| RecordError::InvalidDate {
                row: row_number,
                value: raw_date.to_string(),
            })?;

        bookings.push(Booking::new(company, booking_date, shipment_type));
    }

    debug!("Parsed {} bookings", bookings.len());
    Ok(bookings)
}

/// Parse a booking timestamp. Dates without a time become midnight.
pub fn parse_booking_date(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.naive_utc());
    }

    for format in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, format) {
            return Some(dt);
        }
    }

    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(value, format).ok())
        .and_then(|date| date.and_hms_opt(0, 0, 0))
}
