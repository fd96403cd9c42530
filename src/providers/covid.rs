use crate::core::models::CovidStats;
use crate::core::settings::Settings;
use crate::providers::StatsProvider;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use reqwest::StatusCode;
use serde::Deserialize;

const DATA_PATH: &str = "/v1/data";
const NATION_AREA_TYPE: &str = "nation";
const CASES_WINDOW_DAYS: usize = 7;

const STRUCTURE: &str = r#"{"date":"date","areaName":"areaName","areaType":"areaType","newCasesByPublishDate":"newCasesByPublishDate","cumDeaths28DaysByPublishDate":"cumDeaths28DaysByPublishDate","hospitalCases":"hospitalCases"}"#;

/// One day of figures for an area. Records arrive newest first.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AreaRecord {
    pub date: NaiveDate,
    pub area_name: String,
    #[serde(rename = "newCasesByPublishDate")]
    pub new_cases_by_publish_date: Option<i64>,
    #[serde(rename = "cumDeaths28DaysByPublishDate")]
    pub cum_deaths_28_days_by_publish_date: Option<i64>,
    #[serde(rename = "hospitalCases")]
    pub hospital_cases: Option<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    NewCasesByPublishDate,
    CumDeaths28DaysByPublishDate,
    HospitalCases,
}

impl Metric {
    pub fn value(&self, record: &AreaRecord) -> Option<i64> {
        match self {
            Metric::NewCasesByPublishDate => record.new_cases_by_publish_date,
            Metric::CumDeaths28DaysByPublishDate => record.cum_deaths_28_days_by_publish_date,
            Metric::HospitalCases => record.hospital_cases,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CovidApiResponse {
    pub data: Vec<AreaRecord>,
    pub length: usize,
    pub total_pages: u32,
    pub last_update: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DataPage {
    #[serde(default)]
    data: Vec<AreaRecord>,
    #[serde(default)]
    pagination: Option<Pagination>,
}

#[derive(Debug, Deserialize)]
struct Pagination {
    next: Option<String>,
}

/// Sums up to `count` non-null values of `metric`, optionally skipping the
/// first one (the newest figure is often provisional).
///
/// Returns the area name of the first record with the sum, or `None` when
/// no value of `metric` is left to sum.
pub fn stats_from_records(
    records: &[AreaRecord],
    metric: Metric,
    count: usize,
    skip: bool,
) -> Option<(String, i64)> {
    let area = records.first()?.area_name.clone();

    let mut values = records
        .iter()
        .filter_map(|r| metric.value(r))
        .skip(usize::from(skip))
        .take(count)
        .peekable();
    values.peek()?;

    Some((area, values.sum()))
}

pub struct CovidApiClient {
    client: reqwest::Client,
    base_url: String,
    location: String,
    location_type: String,
    nation: String,
    max_pages: u32,
}

impl CovidApiClient {
    pub fn new(settings: &Settings) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: settings.covid.base_url.trim_end_matches('/').to_string(),
            location: settings.location.clone(),
            location_type: settings.location_type.clone(),
            nation: settings.nation.clone(),
            max_pages: settings.covid.max_pages.max(1),
        }
    }

    pub async fn fetch_area(&self, area_type: &str, area_name: &str) -> Result<CovidApiResponse> {
        let url = format!("{}{}", self.base_url, DATA_PATH);
        let filters = format!("areaType={area_type};areaName={area_name}");

        let mut data = Vec::new();
        let mut total_pages = 0;
        let mut last_update = None;

        for page in 1..=self.max_pages {
            let page = page.to_string();
            let response = self
                .client
                .get(&url)
                .query(&[
                    ("filters", filters.as_str()),
                    ("structure", STRUCTURE),
                    ("page", page.as_str()),
                ])
                .send()
                .await
                .context("Failed to fetch covid data")?;

            let status = response.status();
            if status == StatusCode::NO_CONTENT {
                break;
            }
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                anyhow::bail!("Covid API error: {} - {}", status, body);
            }

            if last_update.is_none() {
                last_update = response
                    .headers()
                    .get(reqwest::header::LAST_MODIFIED)
                    .and_then(|v| v.to_str().ok())
                    .map(str::to_string);
            }

            let body: DataPage = response
                .json()
                .await
                .context("Failed to parse covid API response")?;

            total_pages += 1;
            data.extend(body.data);

            if body.pagination.and_then(|p| p.next).is_none() {
                break;
            }
        }

        tracing::info!(
            area_type,
            area_name,
            records = data.len(),
            pages = total_pages,
            "Covid API request"
        );

        Ok(CovidApiResponse {
            length: data.len(),
            data,
            total_pages,
            last_update,
        })
    }

    pub async fn get_covid_stats(&self) -> Result<CovidStats> {
        let local = self
            .fetch_area(&self.location_type, &self.location)
            .await?;
        let nation = self.fetch_area(NATION_AREA_TYPE, &self.nation).await?;
        tracing::debug!(
            local_pages = local.total_pages,
            nation_records = nation.length,
            last_update = ?nation.last_update,
            latest = ?nation.data.first().map(|r| r.date),
            "Covid API requests complete"
        );

        let (area, local_7day_cases) = stats_from_records(
            &local.data,
            Metric::NewCasesByPublishDate,
            CASES_WINDOW_DAYS,
            true,
        )
        .with_context(|| format!("No covid data returned for {}", self.location))?;

        let (nation_name, national_7day_cases) = stats_from_records(
            &nation.data,
            Metric::NewCasesByPublishDate,
            CASES_WINDOW_DAYS,
            true,
        )
        .with_context(|| format!("No covid data returned for {}", self.nation))?;

        let (_, hospital_cases) = stats_from_records(&nation.data, Metric::HospitalCases, 1, false)
            .context("No hospital case data returned")?;
        let (_, total_deaths) =
            stats_from_records(&nation.data, Metric::CumDeaths28DaysByPublishDate, 1, false)
                .context("No death toll data returned")?;

        Ok(CovidStats {
            area,
            local_7day_cases,
            nation: nation_name,
            national_7day_cases,
            hospital_cases,
            total_deaths,
            updated_at: Utc::now(),
        })
    }
}

#[async_trait]
impl StatsProvider for CovidApiClient {
    fn name(&self) -> &'static str {
        "UK Coronavirus API"
    }

    async fn fetch_stats(&self) -> Result<CovidStats> {
        self.get_covid_stats().await
    }
}
