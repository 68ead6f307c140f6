//! HTTP server for riddled

use crate::metrics::RiddleMetrics;
use crate::routes;
use crate::session::{SessionBook, DEFAULT_MAX_SESSIONS};
use anyhow::{Context, Result};
use axum::Router;
use riddle_common::{FeedbackStore, JsonlFeedbackStore, Judge, RiddleConfig, Scenario};
use std::sync::Arc;
use std::time::Instant;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Application state shared across handlers
pub struct AppState {
    pub judge: Arc<Judge>,
    pub scenario: Scenario,
    pub sessions: SessionBook,
    pub feedback: Arc<dyn FeedbackStore>,
    pub metrics: RiddleMetrics,
    pub start_time: Instant,
}

impl AppState {
    pub fn new(
        judge: Arc<Judge>,
        scenario: Scenario,
        feedback: Arc<dyn FeedbackStore>,
        questions_per_session: u32,
    ) -> Result<Self> {
        let sessions = SessionBook::new(
            questions_per_session,
            scenario.hints.clone(),
            DEFAULT_MAX_SESSIONS,
        );
        Ok(Self {
            judge,
            scenario,
            sessions,
            feedback,
            metrics: RiddleMetrics::new().context("registering metrics")?,
            start_time: Instant::now(),
        })
    }

    /// Judge, scenario and stores as the config describes them.
    pub fn from_config(config: &RiddleConfig) -> Result<Self> {
        let judge = Judge::from_config(config).context("building judge")?;
        let scenario = match &config.judge.scenario_path {
            Some(path) => Scenario::load(path)
                .with_context(|| format!("loading scenario {}", path.display()))?,
            None => Scenario::builtin().context("loading built-in scenario")?,
        };
        let feedback = JsonlFeedbackStore::in_dir(&config.data_dir());
        info!("  Answer feedback at {}", feedback.path().display());
        Self::new(
            Arc::new(judge),
            scenario,
            Arc::new(feedback),
            config.server.questions_per_session,
        )
    }
}

/// Full router with tracing and the body size cap applied.
pub fn router(state: Arc<AppState>, max_body_bytes: usize) -> Router {
    Router::new()
        .merge(routes::game_routes())
        .merge(routes::feedback_routes())
        .merge(routes::info_routes())
        .with_state(state)
        .layer(RequestBodyLimitLayer::new(max_body_bytes))
        .layer(TraceLayer::new_for_http())
}

/// Run the HTTP server until ctrl-c
pub async fn run(state: AppState, config: &RiddleConfig) -> Result<()> {
    let app = router(Arc::new(state), config.server.max_body_bytes);

    let addr = config.server.bind.as_str();
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {}", addr))?;
    info!("  Listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("Shutting down gracefully");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Cannot listen for ctrl-c: {}", e);
        std::future::pending::<()>().await;
    }
}
