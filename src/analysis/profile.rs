//! Dataset inspection.
//!
//! Shape, column types, completeness, duplicates, value counts and
//! calendar coverage of the loaded file.

use super::aggregator::value_counts;
use crate::loader::RawTable;
use crate::models::{
    Booking, ColumnProfile, ColumnType, CompanyCalendar, DatasetProfile, DateProfile, Describe,
};
use chrono::{NaiveDate, NaiveTime};
use statrs::statistics::Statistics;
use std::collections::{BTreeMap, BTreeSet, HashSet};
use tracing::debug;

/// Rows kept in the profile's head.
const HEAD_ROWS: usize = 5;

/// Profile the raw table, and the parsed bookings when available.
pub fn profile(
    table: &RawTable,
    bookings: Option<&[Booking]>,
    future_cutoff: NaiveDate,
) -> DatasetProfile {
    let columns = table
        .headers()
        .iter()
        .enumerate()
        .map(|(idx, name)| ColumnProfile {
            name: name.clone(),
            inferred_type: infer_column_type(table.column(idx)),
            missing: table.column(idx).filter(|v| v.is_empty()).count(),
        })
        .collect();

    let mut seen: HashSet<&[String]> = HashSet::new();
    let duplicate_rows = table
        .rows()
        .iter()
        .filter(|row| !seen.insert(row.as_slice()))
        .count();

    let company_counts = value_counts(table.companies().filter(|v| !v.is_empty()));
    let shipment_type_counts = value_counts(table.shipment_types().filter(|v| !v.is_empty()));

    debug!(
        "Profiled {} rows: {} duplicates, {} companies",
        table.len(),
        duplicate_rows,
        company_counts.len()
    );

    DatasetProfile {
        rows: table.len(),
        columns,
        head: table.rows().iter().take(HEAD_ROWS).cloned().collect(),
        duplicate_rows,
        company_counts,
        shipment_type_counts,
        dates: bookings.and_then(|b| date_profile(b, future_cutoff)),
    }
}

/// Infer the narrowest type that fits every non-blank cell.
pub fn infer_column_type<'a>(values: impl Iterator<Item = &'a str>) -> ColumnType {
    let mut inferred = ColumnType::Empty;

    for value in values.filter(|v| !v.is_empty()) {
        let cell = if value.parse::<i64>().is_ok() {
            ColumnType::Integer
        } else if value.parse::<f64>().is_ok() {
            ColumnType::Float
        } else {
            return ColumnType::Text;
        };

        inferred = match (inferred, cell) {
            (ColumnType::Float, _) | (_, ColumnType::Float) => ColumnType::Float,
            _ => ColumnType::Integer,
        };
    }

    inferred
}

fn date_profile(bookings: &[Booking], future_cutoff: NaiveDate) -> Option<DateProfile> {
    let first = bookings.iter().map(|b| b.booking_date).min()?;
    let last = bookings.iter().map(|b| b.booking_date).max()?;

    let mut per_day: BTreeMap<NaiveDate, usize> = BTreeMap::new();
    let mut per_company: BTreeMap<&str, BTreeSet<NaiveDate>> = BTreeMap::new();
    for booking in bookings {
        *per_day.entry(booking.day()).or_default() += 1;
        per_company
            .entry(booking.company_name.as_str())
            .or_default()
            .insert(booking.day());
    }

    let daily: Vec<f64> = per_day.values().map(|&c| c as f64).collect();
    let daily_bookings = describe(&daily)?;

    let cutoff = future_cutoff.and_time(NaiveTime::MIN);
    let future_bookings = bookings.iter().filter(|b| b.booking_date > cutoff).count();

    let calendars = per_company
        .into_iter()
        .filter_map(|(company, days)| {
            let first = *days.first()?;
            let last = *days.last()?;
            let span = (last - first).num_days() as usize + 1;
            Some(CompanyCalendar {
                company_name: company.to_string(),
                first,
                last,
                missing_days: span - days.len(),
            })
        })
        .collect();

    Some(DateProfile {
        first,
        last,
        daily_bookings,
        future_cutoff,
        future_bookings,
        calendars,
    })
}

/// Count, mean, sample std, min, quartiles and max of a series.
pub fn describe(values: &[f64]) -> Option<Describe> {
    if values.is_empty() {
        return None;
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    let std_dev = if values.len() > 1 {
        Some(values.iter().std_dev())
    } else {
        None
    };

    Some(Describe {
        count: values.len(),
        mean: values.iter().mean(),
        std_dev,
        min: sorted[0],
        q25: quantile(&sorted, 0.25),
        median: quantile(&sorted, 0.5),
        q75: quantile(&sorted, 0.75),
        max: sorted[sorted.len() - 1],
    })
}

/// Linearly interpolated quantile of an ascending, non-empty slice.
fn quantile(sorted: &[f64], q: f64) -> f64 {
    let pos = q * (sorted.len() - 1) as f64;
    let lower = pos.floor() as usize;
    let upper = pos.ceil() as usize;
    sorted[lower] + (sorted[upper] - sorted[lower]) * (pos - lower as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::parse_bookings;

    fn sample_table() -> RawTable {
        let data = include_str!("../../fixtures/sample_bookings.csv");
        RawTable::from_reader(data.as_bytes()).unwrap()
    }

    fn cutoff() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 12, 31).unwrap()
    }

    #[test]
    fn test_profile_sample() {
        let table = sample_table();
        let bookings = parse_bookings(&table).unwrap();
        let profile = profile(&table, Some(&bookings), cutoff());

        assert_eq!(profile.rows, 14);
        assert_eq!(profile.columns.len(), 4);
        assert_eq!(profile.columns[0].inferred_type, ColumnType::Integer);
        assert_eq!(profile.columns[1].inferred_type, ColumnType::Text);
        assert!(profile.columns.iter().all(|c| c.missing == 0));
        assert_eq!(profile.head.len(), 5);
        assert_eq!(profile.duplicate_rows, 0);
        assert_eq!(profile.company_counts[0].value, "Acme Logistics");
        assert_eq!(profile.company_counts[0].count, 6);
        assert_eq!(profile.shipment_type_counts.len(), 3);

        let dates = profile.dates.unwrap();
        assert_eq!(dates.first.date(), NaiveDate::from_ymd_opt(2025, 1, 1).unwrap());
        assert_eq!(dates.last.date(), NaiveDate::from_ymd_opt(2025, 1, 16).unwrap());
        assert_eq!(dates.future_bookings, 0);
        assert_eq!(dates.daily_bookings.count, 10);
        assert!((dates.daily_bookings.mean - 1.4).abs() < 1e-9);
        assert_eq!(dates.daily_bookings.max, 2.0);

        let missing: Vec<(&str, usize)> = dates
            .calendars
            .iter()
            .map(|c| (c.company_name.as_str(), c.missing_days))
            .collect();
        assert_eq!(
            missing,
            vec![
                ("Acme Logistics", 8),
                ("Borealis Trading", 10),
                ("Cobalt Foods", 0),
                ("Delta Textiles", 0),
            ]
        );
    }

    #[test]
    fn test_profile_without_dates() {
        let table = sample_table();
        let profile = profile(&table, None, cutoff());
        assert!(profile.dates.is_none());
        assert_eq!(profile.rows, 14);
    }

    #[test]
    fn test_duplicates_and_missing() {
        let data = "company_name,booking_date,shipment_type\nA,2025-01-01,Air\nA,2025-01-01,Air\nB,,Sea\nA,2025-01-01,Air\n";
        let table = RawTable::from_reader(data.as_bytes()).unwrap();
        let profile = profile(&table, None, cutoff());

        assert_eq!(profile.duplicate_rows, 2);
        assert_eq!(profile.columns[1].missing, 1);
    }

    #[test]
    fn test_future_bookings() {
        let data = "company_name,booking_date,shipment_type\nA,2025-12-31,Air\nA,2026-01-02,Air\n";
        let table = RawTable::from_reader(data.as_bytes()).unwrap();
        let bookings = parse_bookings(&table).unwrap();
        let profile = profile(&table, Some(&bookings), cutoff());

        assert_eq!(profile.dates.unwrap().future_bookings, 1);
    }

    #[test]
    fn test_future_bookings_compare_timestamps() {
        let data = "company_name,booking_date,shipment_type\nA,2025-12-31 10:00:00,Air\nA,2025-12-31 00:00:00,Sea\n";
        let table = RawTable::from_reader(data.as_bytes()).unwrap();
        let bookings = parse_bookings(&table).unwrap();
        let profile = profile(&table, Some(&bookings), cutoff());

        assert_eq!(profile.dates.unwrap().future_bookings, 1);
    }

    #[test]
    fn test_header_only_file_has_no_dates() {
        let table = RawTable::from_reader("company_name,booking_date,shipment_type\n".as_bytes())
            .unwrap();
        let bookings = parse_bookings(&table).unwrap();
        let profile = profile(&table, Some(&bookings), cutoff());

        assert_eq!(profile.rows, 0);
        assert!(profile.dates.is_none());
    }

    #[test]
    fn test_infer_column_type() {
        assert_eq!(infer_column_type(["1", "2", ""].into_iter()), ColumnType::Integer);
        assert_eq!(infer_column_type(["1", "2.5"].into_iter()), ColumnType::Float);
        assert_eq!(infer_column_type(["1", "x"].into_iter()), ColumnType::Text);
        assert_eq!(infer_column_type(["", ""].into_iter()), ColumnType::Empty);
    }

    #[test]
    fn test_describe_quartiles() {
        let stats = describe(&[1.0, 2.0, 3.0, 4.0]).unwrap();
        assert_eq!(stats.count, 4);
        assert_eq!(stats.min, 1.0);
        assert!((stats.q25 - 1.75).abs() < 1e-9);
        assert!((stats.median - 2.5).abs() < 1e-9);
        assert!((stats.q75 - 3.25).abs() < 1e-9);
        assert_eq!(stats.max, 4.0);

        let single = describe(&[7.0]).unwrap();
        assert_eq!(single.std_dev, None);
        assert!(describe(&[]).is_none());
    }
}
