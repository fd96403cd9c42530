//! Offline stats from a nation-level CSV export.
//!
//! The export is newest-first with a header row. Columns (0-indexed): 4 is
//! cumulative deaths, 5 is hospital cases, 6 is new cases by specimen date.

use crate::core::models::CsvSummary;
use anyhow::{Context, Result};
use std::path::Path;

const DEATHS_COLUMN: usize = 4;
const HOSPITAL_COLUMN: usize = 5;
const NEW_CASES_COLUMN: usize = 6;
const CASES_WINDOW_DAYS: usize = 7;

pub fn parse_csv_data(path: &Path) -> Result<Vec<String>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read CSV file: {}", path.display()))?;

    Ok(content.lines().map(str::to_string).collect())
}

fn column(line: &str, index: usize) -> &str {
    line.split(',').nth(index).unwrap_or("").trim()
}

fn non_empty_values(lines: &[String], index: usize) -> impl Iterator<Item = &str> {
    lines
        .iter()
        .skip(1)
        .map(move |line| column(line, index))
        .filter(|value| !value.is_empty())
}

/// Summarises an export into the 7-day case total, current hospital cases and
/// the latest death toll.
///
/// The first non-empty case count is incomplete and is skipped. Returns `None`
/// if the file runs out of rows or holds a non-numeric value.
pub fn process_covid_csv_data(lines: &[String]) -> Option<CsvSummary> {
    let cases = non_empty_values(lines, NEW_CASES_COLUMN)
        .skip(1)
        .take(CASES_WINDOW_DAYS)
        .map(|v| v.parse::<i64>().ok())
        .collect::<Option<Vec<_>>>()?;

    if cases.len() < CASES_WINDOW_DAYS {
        tracing::warn!(found = cases.len(), "Not enough daily case rows in CSV");
        return None;
    }

    let current_hospital_cases = non_empty_values(lines, HOSPITAL_COLUMN)
        .next()?
        .parse()
        .ok()?;
    let total_deaths = non_empty_values(lines, DEATHS_COLUMN).next()?.parse().ok()?;

    Some(CsvSummary {
        last_7_days_cases: cases.iter().sum(),
        current_hospital_cases,
        total_deaths,
    })
}
