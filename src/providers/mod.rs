pub mod covid;
pub mod csv;
pub mod news;

use crate::core::models::CovidStats;
use crate::core::settings::Settings;
use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;

pub use covid::CovidApiClient;
pub use news::{format_news_article, NewsApiClient, RawArticle};

#[async_trait]
pub trait StatsProvider: Send + Sync {
    fn name(&self) -> &'static str;
    async fn fetch_stats(&self) -> Result<CovidStats>;
}

#[async_trait]
pub trait NewsProvider: Send + Sync {
    fn name(&self) -> &'static str;
    async fn fetch_articles(&self, page_size: usize) -> Result<Vec<RawArticle>>;
}

/// The two data sources the dashboard refreshes from.
#[derive(Clone)]
pub struct Sources {
    pub stats: Arc<dyn StatsProvider>,
    pub news: Arc<dyn NewsProvider>,
}

impl Sources {
    pub fn new(settings: &Settings) -> Self {
        Self {
            stats: Arc::new(CovidApiClient::new(settings)),
            news: Arc::new(NewsApiClient::new(settings)),
        }
    }
}
