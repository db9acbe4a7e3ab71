//! Report generation.
//!
//! This module renders the analysis results as console tables or as a
//! JSON document.

use crate::models::{
    AnalysisResults, DatasetProfile, DayOfWeekBreakdown, Describe, GapStatistics, Report,
    ReportMetadata, TransitionMatrix, ValueCount,
};
use anyhow::Result;

const UNDEFINED: &str = "undefined";

/// Render rows as an aligned text table. The first column is left-aligned.
pub fn render_table(headers: &[String], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            if let Some(w) = widths.get_mut(i) {
                *w = (*w).max(cell.chars().count());
            }
        }
    }

    let format_row = |cells: &[String]| {
        let line: Vec<String> = cells
            .iter()
            .zip(&widths)
            .enumerate()
            .map(|(i, (cell, &w))| {
                if i == 0 {
                    format!("{:<w$}", cell, w = w)
                } else {
                    format!("{:>w$}", cell, w = w)
                }
            })
            .collect();
        line.join("  ").trim_end().to_string()
    };

    let mut table = String::new();
    table.push_str(&format_row(headers));
    table.push('\n');
    let rule: Vec<String> = widths.iter().map(|&w| "-".repeat(w)).collect();
    table.push_str(&rule.join("  "));
    table.push('\n');
    for row in rows {
        table.push_str(&format_row(row));
        table.push('\n');
    }
    table
}

fn headers(names: &[&str]) -> Vec<String> {
    names.iter().map(|n| n.to_string()).collect()
}

fn format_value(value: f64, decimals: usize) -> String {
    if value.is_finite() {
        format!("{:.*}", decimals, value)
    } else {
        UNDEFINED.to_string()
    }
}

fn format_optional(value: Option<f64>, decimals: usize) -> String {
    value
        .map(|v| format_value(v, decimals))
        .unwrap_or_else(|| UNDEFINED.to_string())
}

/// Generate the complete console report.
pub fn generate_text_report(report: &Report) -> String {
    let mut output = String::new();

    output.push_str(&generate_metadata_section(&report.metadata));

    if let Some(ref profile) = report.profile {
        output.push_str(&generate_profile_section(profile));
    }

    if let Some(ref analysis) = report.analysis {
        output.push_str(&generate_analysis_section(analysis));
    }

    if !report.artifacts.is_empty() {
        output.push_str("\n--- Artifacts ---\n");
        for artifact in &report.artifacts {
            output.push_str(&format!("Saved {}\n", artifact));
        }
    }

    if !report.errors.is_empty() {
        output.push_str("\n--- Skipped ---\n");
        for error in &report.errors {
            output.push_str(&format!("{}\n", error));
        }
    }

    output
}

fn generate_metadata_section(metadata: &ReportMetadata) -> String {
    let mut section = String::new();

    section.push_str(&format!("Input: {}\n", metadata.input_path));
    section.push_str(&format!(
        "Analysis Date: {}\n",
        metadata.analysis_date.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    section.push_str(&format!(
        "Data Loaded. Shape: ({}, {})\n",
        metadata.rows_loaded, metadata.columns_loaded
    ));
    section.push_str(&format!("Duration: {:.2}s\n", metadata.duration_seconds));

    section
}

fn generate_value_counts(title: &str, label: &str, counts: &[ValueCount]) -> String {
    let rows: Vec<Vec<String>> = counts
        .iter()
        .map(|c| vec![c.value.clone(), c.count.to_string()])
        .collect();
    format!(
        "\n{} ({} unique):\n{}",
        title,
        counts.len(),
        render_table(&headers(&[label, "count"]), &rows)
    )
}

fn generate_describe(stats: &Describe) -> String {
    let rows = vec![
        vec!["count".to_string(), stats.count.to_string()],
        vec!["mean".to_string(), format_value(stats.mean, 4)],
        vec!["std".to_string(), format_optional(stats.std_dev, 4)],
        vec!["min".to_string(), format_value(stats.min, 2)],
        vec!["25%".to_string(), format_value(stats.q25, 2)],
        vec!["50%".to_string(), format_value(stats.median, 2)],
        vec!["75%".to_string(), format_value(stats.q75, 2)],
        vec!["max".to_string(), format_value(stats.max, 2)],
    ];
    render_table(&headers(&["statistic", "value"]), &rows)
}

/// Generate the dataset profile section.
pub fn generate_profile_section(profile: &DatasetProfile) -> String {
    let mut section = String::new();

    section.push_str("\n--- Dataset Profile ---\n");
    section.push_str(&format!(
        "Shape: ({}, {})\n",
        profile.rows,
        profile.columns.len()
    ));

    section.push_str("\nColumns:\n");
    let rows: Vec<Vec<String>> = profile
        .columns
        .iter()
        .map(|c| {
            vec![
                c.name.clone(),
                c.inferred_type.to_string(),
                c.missing.to_string(),
            ]
        })
        .collect();
    section.push_str(&render_table(&headers(&["column", "type", "missing"]), &rows));

    section.push_str(&format!("\nFirst {} rows:\n", profile.head.len()));
    let column_names: Vec<String> = profile.columns.iter().map(|c| c.name.clone()).collect();
    section.push_str(&render_table(&column_names, &profile.head));

    section.push_str(&format!("\nDuplicates: {}\n", profile.duplicate_rows));

    section.push_str(&generate_value_counts(
        "Companies",
        "company_name",
        &profile.company_counts,
    ));
    section.push_str(&generate_value_counts(
        "Shipment Types",
        "shipment_type",
        &profile.shipment_type_counts,
    ));

    match profile.dates {
        Some(ref dates) => {
            section.push_str(&format!(
                "\nDate Range: {} to {}\n",
                dates.first, dates.last
            ));

            section.push_str("\nDaily Booking Stats:\n");
            section.push_str(&generate_describe(&dates.daily_bookings));

            if dates.future_bookings > 0 {
                section.push_str(&format!(
                    "\nFound {} records after {}\n",
                    dates.future_bookings, dates.future_cutoff
                ));
            } else {
                section.push_str(&format!("\nNo dates after {}\n", dates.future_cutoff));
            }

            section.push_str("\nDate gaps per company:\n");
            for calendar in &dates.calendars {
                if calendar.missing_days > 0 {
                    section.push_str(&format!(
                        "Company {} has {} missing dates.\n",
                        calendar.company_name, calendar.missing_days
                    ));
                } else {
                    section.push_str(&format!(
                        "Company {} has continuous daily bookings from {} to {}.\n",
                        calendar.company_name, calendar.first, calendar.last
                    ));
                }
            }
        }
        None if profile.rows == 0 => section.push_str("\nNo bookings to profile.\n"),
        None => section.push_str("\nDate analysis unavailable: booking dates did not parse.\n"),
    }

    section
}

/// Generate the gap, transition and day-of-week sections.
pub fn generate_analysis_section(analysis: &AnalysisResults) -> String {
    let mut section = String::new();

    section.push_str(&generate_gap_section(&analysis.gap_statistics));
    section.push_str(&generate_transition_section(&analysis.transition_matrix));
    section.push_str(&generate_day_of_week_section(&analysis.day_of_week));

    section
}

fn generate_gap_section(stats: &GapStatistics) -> String {
    let mut section = String::new();

    section.push_str("\n--- Inter-Booking Gap Analysis ---\n");
    let rows: Vec<Vec<String>> = stats
        .by_company
        .iter()
        .map(|(company, s)| {
            vec![
                company.clone(),
                s.count.to_string(),
                format_value(s.mean, 4),
                format_value(s.median, 1),
                format_optional(s.std_dev, 4),
                format_value(s.max, 1),
            ]
        })
        .collect();
    section.push_str(&render_table(
        &headers(&["company_name", "gaps", "mean", "median", "std", "max"]),
        &rows,
    ));

    for company in &stats.undefined {
        section.push_str(&format!(
            "{}: {} (single booking, no gaps)\n",
            company, UNDEFINED
        ));
    }

    section
}

fn generate_transition_section(matrix: &TransitionMatrix) -> String {
    let mut section = String::new();

    section.push_str("\n--- Shipment Type Transition Matrix ---\n");
    if matrix.is_empty() {
        section.push_str("No transitions observed.\n");
    } else {
        section.push_str("Transition Probabilities (Row = Current, Col = Next):\n");

        let mut names = vec!["current \\ next".to_string()];
        names.extend(matrix.columns.iter().cloned());
        names.push("n".to_string());

        let rows: Vec<Vec<String>> = matrix
            .rows
            .iter()
            .map(|(current, row)| {
                let mut cells = vec![current.clone()];
                cells.extend(matrix.columns.iter().map(|next| {
                    format_value(matrix.probability(current, next).unwrap_or(0.0), 4)
                }));
                cells.push(row.observations.to_string());
                cells
            })
            .collect();
        section.push_str(&render_table(&names, &rows));
    }

    for current in &matrix.undefined {
        section.push_str(&format!(
            "{}: {} (never followed by another booking)\n",
            current, UNDEFINED
        ));
    }

    section
}

fn generate_day_of_week_section(breakdown: &DayOfWeekBreakdown) -> String {
    let mut section = String::new();

    section.push_str(&format!(
        "\n--- Shipment Type by Day of Week (Top {} Companies) ---\n",
        breakdown.tables.len() + breakdown.undefined.len()
    ));

    for table in &breakdown.tables {
        section.push_str(&format!("\n{}:\n", table.company_name));

        let mut names = vec!["day_of_week".to_string()];
        names.extend(table.columns.iter().cloned());

        let rows: Vec<Vec<String>> = table
            .rows
            .iter()
            .map(|(day, distribution)| {
                let mut cells = vec![day.to_string()];
                cells.extend(table.columns.iter().map(|t| {
                    format_value(distribution.get(t).copied().unwrap_or(0.0), 2)
                }));
                cells
            })
            .collect();
        section.push_str(&render_table(&names, &rows));
    }

    for company in &breakdown.undefined {
        section.push_str(&format!("\n{}: {} (no bookings)\n", company, UNDEFINED));
    }

    section
}

/// Generate a JSON report.
pub fn generate_json_report(report: &Report) -> Result<String> {
    serde_json::to_string_pretty(report).map_err(Into::into)
}
