use crate::core::models::UpdateTargets;
use crate::core::scheduler::{ScheduleError, ScheduleRequest, UpdateScheduler};
use crate::core::settings::Settings;
use crate::core::store::DashboardStore;
use crate::daemon::page::{Page, PendingUpdate};
use crate::daemon::polling::{run_scheduled, update_news};
use crate::providers::Sources;
use axum::{
    extract::{Query, State},
    response::{Html, IntoResponse, Redirect, Response},
    routing::get,
    Router,
};
use chrono::{DateTime, Local, Utc};
use serde::Deserialize;
use std::sync::Arc;
use tokio::sync::Mutex;

pub const INDEX_PATH: &str = "/index";

#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub store: DashboardStore,
    pub scheduler: Arc<Mutex<UpdateScheduler>>,
    pub sources: Sources,
}

impl AppState {
    pub fn new(settings: Settings) -> Self {
        let sources = Sources::new(&settings);
        Self::with_sources(settings, sources)
    }

    pub fn with_sources(settings: Settings, sources: Sources) -> Self {
        Self {
            settings: Arc::new(settings),
            store: DashboardStore::new(),
            scheduler: Arc::new(Mutex::new(UpdateScheduler::new())),
            sources,
        }
    }

    async fn page(&self) -> Page {
        let updates = self
            .scheduler
            .lock()
            .await
            .pending()
            .iter()
            .map(PendingUpdate::from)
            .collect();

        Page {
            stats: self.store.stats().await,
            articles: self.store.articles().await,
            updates,
            refresh_seconds: self.settings.display.page_refresh_seconds,
        }
    }
}

/// Query parameters of the dashboard page. Names match the page's form.
#[derive(Debug, Default, Deserialize)]
pub struct IndexQuery {
    /// Time of day for a new update, `HH:MM`.
    pub update: Option<String>,
    /// Label of a new update.
    pub two: Option<String>,
    #[serde(rename = "covid-data")]
    pub covid_data: Option<String>,
    pub news: Option<String>,
    pub repeat: Option<String>,
    /// Title of an article to dismiss.
    pub notif: Option<String>,
    /// Label of an update to cancel.
    pub update_item: Option<String>,
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

impl IndexQuery {
    pub fn targets(&self) -> UpdateTargets {
        UpdateTargets {
            covid_data: present(&self.covid_data).is_some(),
            news: present(&self.news).is_some(),
        }
    }

    /// `None` when no update label was submitted.
    pub fn schedule_request(&self) -> Option<Result<ScheduleRequest, ScheduleError>> {
        let label = present(&self.two)?;
        Some(ScheduleRequest::parse(
            label,
            self.update.as_deref(),
            self.targets(),
            present(&self.repeat).is_some(),
        ))
    }
}

#[derive(Debug)]
pub enum Outcome {
    Redirect,
    Render(Page),
}

/// Handles one dashboard request.
///
/// Scheduling, dismissing an article and cancelling an update each answer with
/// a redirect back to the page. Every other request first runs the updates
/// that are due, then renders the page.
pub async fn dispatch(state: &AppState, query: IndexQuery, now: DateTime<Local>) -> Outcome {
    match query.schedule_request() {
        Some(Ok(request)) => {
            let label = request.label.clone();
            let targets = request.targets;
            let update = request.into_update(&now);
            let next_run = update.next_run;

            if state.scheduler.lock().await.schedule(update).is_some() {
                tracing::info!(label = %label, "Replaced scheduled update with the same label");
            }
            tracing::info!(
                label = %label,
                covid_data = targets.covid_data,
                news = targets.news,
                %next_run,
                "Update scheduled"
            );
            return Outcome::Redirect;
        }
        Some(Err(e)) => {
            tracing::warn!(error = %e, "Invalid update, nothing scheduled");
        }
        None => {}
    }

    if let Some(title) = present(&query.notif) {
        if !state.store.remove_title(title).await {
            tracing::debug!(title, "News story was already removed");
        }
        update_news(
            &state.sources,
            &state.store,
            state.settings.news.article_count,
            false,
        )
        .await;
        return Outcome::Redirect;
    }

    if let Some(label) = present(&query.update_item) {
        if state.scheduler.lock().await.cancel(label).is_some() {
            tracing::info!(label, "Scheduled update cancelled");
            return Outcome::Redirect;
        }
        tracing::warn!(label, "Scheduler not found");
    }

    run_scheduled(state, now.with_timezone(&Utc)).await;

    Outcome::Render(state.page().await)
}

async fn index(State(state): State<AppState>, Query(query): Query<IndexQuery>) -> Response {
    match dispatch(&state, query, Local::now()).await {
        Outcome::Redirect => Redirect::to(INDEX_PATH).into_response(),
        Outcome::Render(page) => Html(page.render()).into_response(),
    }
}

async fn root() -> Redirect {
    Redirect::to(INDEX_PATH)
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route(INDEX_PATH, get(index))
        .with_state(state)
}
