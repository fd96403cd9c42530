use crate::core::scheduler::DueUpdates;
use crate::core::store::DashboardStore;
use crate::daemon::app::AppState;
use crate::providers::{format_news_article, Sources};
use chrono::{DateTime, Utc};

// The news API rejects larger pages.
const MAX_NEWS_PAGE_SIZE: usize = 100;

/// Replaces the cached stats. On failure the previous stats stay in place.
pub async fn update_covid_data(sources: &Sources, store: &DashboardStore) -> bool {
    match sources.stats.fetch_stats().await {
        Ok(stats) => {
            tracing::info!(
                area = %stats.area,
                local_7day_cases = stats.local_7day_cases,
                nation = %stats.nation,
                national_7day_cases = stats.national_7day_cases,
                hospital_cases = stats.hospital_cases,
                total_deaths = stats.total_deaths,
                "Covid stats updated"
            );
            store.set_stats(stats).await;
            true
        }
        Err(e) => {
            tracing::warn!(source = sources.stats.name(), error = %e, "Failed to fetch covid stats");
            false
        }
    }
}

/// Replaces the cached articles with up to `article_count` stories that have
/// not been removed.
///
/// With `purge` set, everything currently displayed is marked removed first so
/// a scheduled refresh brings in fresh stories.
pub async fn update_news(
    sources: &Sources,
    store: &DashboardStore,
    article_count: usize,
    purge: bool,
) -> bool {
    if purge {
        store.purge_articles().await;
    }

    let removed = store.removed_titles().await;
    let page_size = (article_count + removed.len()).min(MAX_NEWS_PAGE_SIZE);

    let raw = match sources.news.fetch_articles(page_size).await {
        Ok(raw) => raw,
        Err(e) => {
            tracing::warn!(source = sources.news.name(), error = %e, "Failed to fetch news");
            return false;
        }
    };

    let articles: Vec<_> = raw
        .iter()
        .filter(|a| {
            a.title
                .as_deref()
                .is_some_and(|title| !removed.iter().any(|r| r == title))
        })
        .filter_map(format_news_article)
        .take(article_count)
        .collect();

    if articles.len() < article_count {
        tracing::warn!(
            wanted = article_count,
            found = articles.len(),
            "Articles list exhausted"
        );
    }

    store.set_articles(articles).await;
    tracing::info!("Covid news updated");
    true
}

/// Polls the update registry once and runs whatever came due.
pub async fn run_scheduled(state: &AppState, now: DateTime<Utc>) -> DueUpdates {
    let due = state.scheduler.lock().await.run_pending(now);

    if due.is_empty() {
        return due;
    }

    tracing::info!(fired = ?due.fired, "Running scheduled updates");

    if due.targets.covid_data {
        update_covid_data(&state.sources, &state.store).await;
    }
    if due.targets.news {
        update_news(
            &state.sources,
            &state.store,
            state.settings.news.article_count,
            true,
        )
        .await;
    }

    for label in &due.completed {
        tracing::info!(label = %label, "Scheduled update finished, removed from interface");
    }

    due
}
