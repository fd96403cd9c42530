use crate::providers::csv::{parse_csv_data, process_covid_csv_data};
use anyhow::{Context, Result};
use std::path::Path;

pub fn run(path: &Path, json: bool) -> Result<()> {
    let lines = parse_csv_data(path)?;
    let summary = process_covid_csv_data(&lines)
        .with_context(|| format!("Not enough covid data in {}", path.display()))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!("Last 7 days cases: {}", summary.last_7_days_cases);
        println!("Current hospital cases: {}", summary.current_hospital_cases);
        println!("Total deaths: {}", summary.total_deaths);
    }

    Ok(())
}
