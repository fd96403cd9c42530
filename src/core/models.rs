use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CovidStats {
    pub area: String,
    pub local_7day_cases: i64,
    pub nation: String,
    pub national_7day_cases: i64,
    pub hospital_cases: i64,
    pub total_deaths: i64,
    pub updated_at: DateTime<Utc>,
}

impl CovidStats {
    pub fn hospital_cases_label(&self) -> String {
        format!("Hospital Cases: {}", self.hospital_cases)
    }

    pub fn total_deaths_label(&self) -> String {
        format!("Total Deaths: {}", self.total_deaths)
    }
}

/// A news story as shown on the dashboard.
///
/// `content` is an HTML fragment: the escaped description followed by a link
/// to the source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewsArticle {
    pub title: String,
    pub content: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CsvSummary {
    pub last_7_days_cases: i64,
    pub current_hospital_cases: i64,
    pub total_deaths: i64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateTargets {
    pub covid_data: bool,
    pub news: bool,
}

impl UpdateTargets {
    pub fn any(&self) -> bool {
        self.covid_data || self.news
    }

    pub fn describe(&self) -> Option<&'static str> {
        match (self.covid_data, self.news) {
            (true, true) => Some("Covid Data and News"),
            (true, false) => Some("Covid Data"),
            (false, true) => Some("News"),
            (false, false) => None,
        }
    }
}

pub fn escape_html(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_stats() -> CovidStats {
        CovidStats {
            area: "Exeter".to_string(),
            local_7day_cases: 1_234,
            nation: "England".to_string(),
            national_7day_cases: 240_299,
            hospital_cases: 7_019,
            total_deaths: 141_544,
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_stats_labels() {
        let stats = make_stats();
        assert_eq!(stats.hospital_cases_label(), "Hospital Cases: 7019");
        assert_eq!(stats.total_deaths_label(), "Total Deaths: 141544");
    }

    #[test]
    fn test_update_targets_describe() {
        let both = UpdateTargets {
            covid_data: true,
            news: true,
        };
        let covid = UpdateTargets {
            covid_data: true,
            news: false,
        };
        let news = UpdateTargets {
            covid_data: false,
            news: true,
        };

        assert_eq!(both.describe(), Some("Covid Data and News"));
        assert_eq!(covid.describe(), Some("Covid Data"));
        assert_eq!(news.describe(), Some("News"));
        assert_eq!(UpdateTargets::default().describe(), None);
        assert!(!UpdateTargets::default().any());
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html(r#"<b>"Tom" & 'Jerry'</b>"#),
            "&lt;b&gt;&quot;Tom&quot; &amp; &#39;Jerry&#39;&lt;/b&gt;"
        );
        assert_eq!(escape_html("plain text"), "plain text");
    }

    #[test]
    fn test_stats_serialization_roundtrip() {
        let stats = make_stats();
        let json = serde_json::to_string(&stats).unwrap();
        let deserialized: CovidStats = serde_json::from_str(&json).unwrap();
        assert_eq!(stats, deserialized);
    }
}
