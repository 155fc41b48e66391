//! HTTP inbound adapter: one message event in, one reply out
//!
//! The messaging bridge posts every inbound message here and relays the
//! `reply` back on the same chat. Each request runs a full pipeline turn
//! before responding.

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use sqlbot_core::Pipeline;

use crate::auth::SenderAllowList;
use crate::metrics::Metrics;

#[derive(Debug, Clone, Deserialize)]
pub struct InboundMessage {
    pub sender: String,
    pub body: String,
    /// Set by the bridge for messages the bot account sent itself
    #[serde(default)]
    pub from_me: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OutboundReply {
    pub reply: String,
}

pub struct AppState {
    pub pipeline: Pipeline,
    pub allow_list: SenderAllowList,
    pub metrics: Metrics,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/messages", post(handle_message))
        .route("/health", get(health))
        .route("/metrics", get(render_metrics))
        .with_state(state)
}

async fn handle_message(
    State(state): State<Arc<AppState>>,
    Json(message): Json<InboundMessage>,
) -> Response {
    if message.from_me {
        state.metrics.record_ignored("from_me");
        return StatusCode::NO_CONTENT.into_response();
    }

    if !state.allow_list.is_authorized(&message.sender) {
        tracing::info!(sender = %message.sender, "message from unauthorized sender ignored");
        state.metrics.record_ignored("unauthorized");
        return StatusCode::NO_CONTENT.into_response();
    }

    if message.body.trim().is_empty() {
        state.metrics.record_ignored("empty");
        return StatusCode::NO_CONTENT.into_response();
    }

    tracing::info!(sender = %message.sender, body = %message.body, "message received");

    let turn = state.pipeline.run(&message.body).await;
    state.metrics.record_turn(&turn);

    (StatusCode::OK, Json(OutboundReply { reply: turn.reply })).into_response()
}

async fn health() -> &'static str {
    "ok"
}

async fn render_metrics(State(state): State<Arc<AppState>>) -> String {
    state.metrics.render()
}
