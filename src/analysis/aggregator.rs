//! Booking aggregation and statistics.
//!
//! This module computes per-company gap statistics, the cross-company
//! shipment-type transition matrix, and day-of-week breakdowns from a
//! sequenced booking set.

use crate::models::{
    Booking, DayOfWeek, DayOfWeekBreakdown, DayOfWeekTable, GapStatistics, GapStats,
    TransitionMatrix, TransitionRow, ValueCount,
};
use crate::sequencer::Sequence;
use chrono::Datelike;
use statrs::statistics::{Data, Median, Statistics};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use tracing::debug;

/// Count occurrences of each value, most frequent first, ties by value.
pub fn value_counts<'a>(values: impl IntoIterator<Item = &'a str>) -> Vec<ValueCount> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for value in values {
        *counts.entry(value).or_default() += 1;
    }

    let mut counts: Vec<ValueCount> = counts
        .into_iter()
        .map(|(value, count)| ValueCount {
            value: value.to_string(),
            count,
        })
        .collect();
    counts.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.value.cmp(&b.value)));
    counts
}

/// The `n` companies with the most bookings.
pub fn top_companies(bookings: &[Booking], n: usize) -> Vec<ValueCount> {
    let mut counts = value_counts(bookings.iter().map(|b| b.company_name.as_str()));
    counts.truncate(n);
    counts
}

/// Non-null gaps per company, in sequence order.
///
/// Companies without any gap are absent.
pub fn gaps_by_company(sequence: &Sequence) -> BTreeMap<String, Vec<f64>> {
    let mut series: BTreeMap<String, Vec<f64>> = BTreeMap::new();
    for record in sequence.gap_records() {
        if let Some(gap) = record.days_gap {
            series
                .entry(record.company_name)
                .or_default()
                .push(gap as f64);
        }
    }
    series
}

/// Summarize a gap series. `None` when there is nothing to summarize.
pub fn summarize_gaps(gaps: &[f64]) -> Option<GapStats> {
    if gaps.is_empty() {
        return None;
    }

    let std_dev = if gaps.len() > 1 {
        Some(gaps.iter().std_dev())
    } else {
        None
    };

    Some(GapStats {
        count: gaps.len(),
        mean: gaps.iter().mean(),
        median: Data::new(gaps.to_vec()).median(),
        std_dev,
        max: Statistics::max(gaps.iter()),
    })
}

/// Mean, median, sample standard deviation and max of each company's gaps.
pub fn gap_statistics(sequence: &Sequence) -> GapStatistics {
    let series = gaps_by_company(sequence);
    let mut stats = GapStatistics::default();

    for company in sequence.companies() {
        match series.get(company).and_then(|gaps| summarize_gaps(gaps)) {
            Some(summary) => {
                stats.by_company.insert(company.to_string(), summary);
            }
            None => stats.undefined.push(company.to_string()),
        }
    }

    debug!(
        "Gap statistics: {} companies, {} undefined",
        stats.by_company.len(),
        stats.undefined.len()
    );
    stats
}

/// Empirical next-type distribution for every current shipment type.
pub fn transition_matrix(sequence: &Sequence) -> TransitionMatrix {
    let mut counts: BTreeMap<String, BTreeMap<String, usize>> = BTreeMap::new();
    for pair in sequence.transition_pairs() {
        *counts
            .entry(pair.current_type)
            .or_default()
            .entry(pair.next_type)
            .or_default() += 1;
    }

    let columns: BTreeSet<String> = counts
        .values()
        .flat_map(|row| row.keys().cloned())
        .collect();

    let rows: BTreeMap<String, TransitionRow> = counts
        .into_iter()
        .map(|(current, nexts)| {
            let observations: usize = nexts.values().sum();
            let probabilities = columns
                .iter()
                .map(|next| {
                    let count = nexts.get(next).copied().unwrap_or(0);
                    (next.clone(), count as f64 / observations as f64)
                })
                .collect();
            (
                current,
                TransitionRow {
                    observations,
                    probabilities,
                },
            )
        })
        .collect();

    let undefined: Vec<String> = sequence
        .records()
        .iter()
        .map(|r| r.shipment_type.as_str())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .filter(|t| !rows.contains_key(*t))
        .map(String::from)
        .collect();

    debug!(
        "Transition matrix: {} rows, {} columns, {} undefined",
        rows.len(),
        columns.len(),
        undefined.len()
    );

    TransitionMatrix {
        columns: columns.into_iter().collect(),
        rows,
        undefined,
    }
}

/// Shipment-type distribution by day of week for each selected company.
pub fn day_of_week_breakdown(sequence: &Sequence, companies: &[String]) -> DayOfWeekBreakdown {
    let mut breakdown = DayOfWeekBreakdown::default();

    for company in companies {
        let records = sequence.company_records(company);
        if records.is_empty() {
            breakdown.undefined.push(company.clone());
            continue;
        }

        let mut counts: BTreeMap<DayOfWeek, BTreeMap<&str, usize>> = BTreeMap::new();
        let mut columns: BTreeSet<&str> = BTreeSet::new();

        for record in records {
            let day = DayOfWeek::from(record.booking_date.weekday());
            *counts
                .entry(day)
                .or_default()
                .entry(record.shipment_type.as_str())
                .or_default() += 1;
            columns.insert(record.shipment_type.as_str());
        }

        let rows: BTreeMap<DayOfWeek, BTreeMap<String, f64>> = counts
            .into_iter()
            .map(|(day, types)| {
                let total: usize = types.values().sum();
                let distribution: BTreeMap<String, f64> = columns
                    .iter()
                    .map(|t| {
                        let count = types.get(t).copied().unwrap_or(0);
                        (t.to_string(), count as f64 / total as f64)
                    })
                    .collect();
                (day, distribution)
            })
            .collect();

        breakdown.tables.push(DayOfWeekTable {
            company_name: company.clone(),
            columns: columns.into_iter().map(String::from).collect(),
            rows,
        });
    }

    breakdown
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sequencer::sequence;
    use chrono::NaiveDate;

    fn booking(company: &str, date: &str, shipment_type: &str) -> Booking {
        let date = NaiveDate::parse_from_str(date, "%Y-%m-%d")
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        Booking::new(company, date, shipment_type)
    }

    fn sample_bookings() -> Vec<Booking> {
        let data = include_str!("../../fixtures/sample_bookings.csv");
        let table = crate::loader::RawTable::from_reader(data.as_bytes()).unwrap();
        crate::loader::parse_bookings(&table).unwrap()
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_value_counts_order() {
        let counts = value_counts(["b", "a", "b", "c", "a", "b"]);
        let values: Vec<_> = counts.iter().map(|c| (c.value.as_str(), c.count)).collect();
        assert_eq!(values, vec![("b", 3), ("a", 2), ("c", 1)]);
    }

    #[test]
    fn test_top_companies() {
        let top = top_companies(&sample_bookings(), 2);
        assert_eq!(top.len(), 2);
        assert_eq!(top[0].value, "Acme Logistics");
        assert_eq!(top[0].count, 6);
        assert_eq!(top[1].value, "Borealis Trading");
    }

    #[test]
    fn test_gap_statistics() {
        let seq = sequence(&sample_bookings());
        let stats = gap_statistics(&seq);

        let acme = &stats.by_company["Acme Logistics"];
        assert_eq!(acme.count, 5);
        assert!(close(acme.mean, 2.4));
        assert!(close(acme.median, 3.0));
        assert!(close(acme.max, 4.0));
        assert!(close(acme.std_dev.unwrap(), 2.3f64.sqrt()));

        let borealis = &stats.by_company["Borealis Trading"];
        assert!(close(borealis.median, 3.5));
        assert!(close(borealis.std_dev.unwrap(), (1.0f64 / 3.0).sqrt()));

        let cobalt = &stats.by_company["Cobalt Foods"];
        assert_eq!(cobalt.count, 1);
        assert_eq!(cobalt.std_dev, None);
        assert!(close(cobalt.max, 0.0));

        assert_eq!(stats.undefined, vec!["Delta Textiles".to_string()]);
    }

    #[test]
    fn test_summarize_empty_is_undefined() {
        assert_eq!(summarize_gaps(&[]), None);
    }

    #[test]
    fn test_transition_matrix() {
        let seq = sequence(&sample_bookings());
        let matrix = transition_matrix(&seq);

        assert_eq!(matrix.columns, vec!["Air", "Road", "Sea"]);
        assert!(close(matrix.probability("Air", "Sea").unwrap(), 0.5));
        assert!(close(matrix.probability("Air", "Air").unwrap(), 0.25));
        assert!(close(matrix.probability("Sea", "Air").unwrap(), 0.5));
        assert!(close(matrix.probability("Road", "Road").unwrap(), 0.5));
        assert!(close(matrix.probability("Road", "Air").unwrap(), 0.0));
        assert_eq!(matrix.rows["Air"].observations, 4);
        assert!(matrix.undefined.is_empty());

        for row in matrix.rows.values() {
            assert!(close(row.probabilities.values().sum::<f64>(), 1.0));
        }
    }

    #[test]
    fn test_transition_row_without_observations_is_undefined() {
        let bookings = vec![
            booking("A", "2025-01-01", "Air"),
            booking("A", "2025-01-02", "Rail"),
            booking("B", "2025-01-01", "Air"),
        ];
        let matrix = transition_matrix(&sequence(&bookings));

        assert_eq!(matrix.rows.len(), 1);
        assert_eq!(matrix.probability("Air", "Rail"), Some(1.0));
        assert_eq!(matrix.probability("Rail", "Air"), None);
        assert_eq!(matrix.undefined, vec!["Rail".to_string()]);
    }

    #[test]
    fn test_transition_matrix_empty_input() {
        let matrix = transition_matrix(&sequence(&[]));
        assert!(matrix.is_empty());
        assert!(matrix.columns.is_empty());
    }

    #[test]
    fn test_day_of_week_breakdown() {
        let seq = sequence(&sample_bookings());
        let companies = vec!["Acme Logistics".to_string(), "Nobody Inc".to_string()];
        let breakdown = day_of_week_breakdown(&seq, &companies);

        assert_eq!(breakdown.undefined, vec!["Nobody Inc".to_string()]);
        assert_eq!(breakdown.tables.len(), 1);

        let acme = &breakdown.tables[0];
        assert_eq!(acme.columns, vec!["Air", "Road", "Sea"]);
        let days: Vec<_> = acme.rows.keys().copied().collect();
        assert_eq!(
            days,
            vec![DayOfWeek::Monday, DayOfWeek::Wednesday, DayOfWeek::Friday]
        );

        let monday = &acme.rows[&DayOfWeek::Monday];
        assert!(close(monday["Air"], 0.5));
        assert!(close(monday["Road"], 0.0));
        let friday = &acme.rows[&DayOfWeek::Friday];
        assert!(close(friday["Sea"], 1.0 / 3.0));

        for row in acme.rows.values() {
            assert!(close(row.values().sum::<f64>(), 1.0));
        }
    }

    #[test]
    fn test_statistics_are_idempotent() {
        let bookings = sample_bookings();
        let first = (
            gap_statistics(&sequence(&bookings)),
            transition_matrix(&sequence(&bookings)),
        );
        let second = (
            gap_statistics(&sequence(&bookings)),
            transition_matrix(&sequence(&bookings)),
        );
        assert_eq!(first, second);
    }
}
