use crate::core::models::{CovidStats, NewsArticle};
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Default)]
struct StoreInner {
    stats: Option<CovidStats>,
    articles: Vec<NewsArticle>,
    removed_titles: Vec<String>,
}

/// In-memory caches shared between the request handler and the refreshers.
#[derive(Clone, Default)]
pub struct DashboardStore {
    inner: Arc<RwLock<StoreInner>>,
}

impl DashboardStore {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(StoreInner::default())),
        }
    }

    pub async fn stats(&self) -> Option<CovidStats> {
        self.inner.read().await.stats.clone()
    }

    pub async fn set_stats(&self, stats: CovidStats) {
        self.inner.write().await.stats = Some(stats);
    }

    pub async fn articles(&self) -> Vec<NewsArticle> {
        self.inner.read().await.articles.clone()
    }

    pub async fn set_articles(&self, articles: Vec<NewsArticle>) {
        self.inner.write().await.articles = articles;
    }

    pub async fn removed_titles(&self) -> Vec<String> {
        self.inner.read().await.removed_titles.clone()
    }

    /// Returns true if the title was not already removed.
    pub async fn remove_title(&self, title: &str) -> bool {
        let mut inner = self.inner.write().await;
        if inner.removed_titles.iter().any(|t| t == title) {
            return false;
        }
        inner.removed_titles.push(title.to_string());
        tracing::info!(title, "News story removed");
        true
    }

    /// Marks every displayed article as removed.
    pub async fn purge_articles(&self) {
        let mut inner = self.inner.write().await;
        let StoreInner {
            articles,
            removed_titles,
            ..
        } = &mut *inner;

        for article in articles.iter() {
            if !removed_titles.contains(&article.title) {
                removed_titles.push(article.title.clone());
            }
        }
    }
}
