pub mod app;
pub mod page;
pub mod polling;

use crate::core::settings::Settings;
use anyhow::Result;
use std::net::SocketAddr;
use thiserror::Error;

pub use app::{router, AppState};

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },
    #[error("Server stopped: {source}")]
    Serve {
        #[source]
        source: std::io::Error,
    },
}

pub async fn run(settings: Settings) -> Result<()> {
    tracing::info!("Starting covid dashboard");

    let addr = settings.listen_addr()?;
    let state = AppState::new(settings);

    if !state.settings.has_news_api_key() {
        tracing::warn!("News API key not configured, news will stay empty");
    }

    polling::update_covid_data(&state.sources, &state.store).await;
    polling::update_news(
        &state.sources,
        &state.store,
        state.settings.news.article_count,
        false,
    )
    .await;

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|source| ServerError::Bind { addr, source })?;

    tracing::info!(%addr, "Dashboard listening on http://{}/index", addr);

    axum::serve(listener, router(state))
        .await
        .map_err(|source| ServerError::Serve { source })?;

    Ok(())
}
