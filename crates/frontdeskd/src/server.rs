//! HTTP server for frontdeskd.
//!
//! Two endpoints: `/v1/turn` processes one conversational turn, `/health`
//! reports daemon status. Bound to localhost only.

use std::sync::Arc;

use anyhow::Result;
use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use frontdesk_common::rpc::{HealthReport, TurnRequest, TurnResponse};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::turn::TurnEngine;

type AppState = Arc<TurnEngine>;

pub fn app(engine: Arc<TurnEngine>) -> Router {
    Router::new()
        .route("/v1/turn", post(process_turn))
        .route("/health", get(health))
        .with_state(engine)
        .layer(TraceLayer::new_for_http())
}

async fn process_turn(
    State(engine): State<AppState>,
    Json(request): Json<TurnRequest>,
) -> Json<TurnResponse> {
    Json(engine.process_turn(request).await)
}

async fn health(State(engine): State<AppState>) -> Json<HealthReport> {
    Json(HealthReport {
        version: frontdesk_common::VERSION.to_string(),
        provider_available: engine.provider_available().await,
        registered_tools: engine.registry().len(),
    })
}

/// Bind and serve until shutdown.
pub async fn run(engine: Arc<TurnEngine>, listen_addr: &str) -> Result<()> {
    let router = app(engine);

    let listener = tokio::net::TcpListener::bind(listen_addr).await?;
    info!("[=]  Listening on http://{}", listen_addr);

    axum::serve(listener, router).await?;
    Ok(())
}
