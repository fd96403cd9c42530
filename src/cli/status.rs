use crate::core::models::CovidStats;
use crate::core::settings::Settings;
use crate::providers::{CovidApiClient, StatsProvider};
use anyhow::Result;

pub async fn run(settings: &Settings, json: bool) -> Result<()> {
    let client = CovidApiClient::new(settings);
    let stats = client.fetch_stats().await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
    } else {
        print_text_output(&stats);
    }

    Ok(())
}

fn print_text_output(stats: &CovidStats) {
    println!("{}", stats.area);
    println!("  Last 7 days infection rate: {}", stats.local_7day_cases);
    println!();
    println!("{}", stats.nation);
    println!("  Last 7 days infection rate: {}", stats.national_7day_cases);
    println!("  {}", stats.hospital_cases_label());
    println!("  {}", stats.total_deaths_label());
    println!();
    println!(
        "Fetched {}",
        stats.updated_at.format("%Y-%m-%d %H:%M:%S UTC")
    );
}
