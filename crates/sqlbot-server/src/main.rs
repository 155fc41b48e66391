//! sqlbot server
//!
//! Answers free-text questions from authorized senders with read-only
//! queries: OpenAI writes the SQL, DuckDB runs it, OpenAI phrases the rows.

use std::sync::Arc;

use anyhow::Context;
use sqlbot_core::Pipeline;
use sqlbot_duck::DuckExecutor;
use tracing::{info, warn};

mod auth;
mod config;
mod llm;
mod logging;
mod metrics;
mod webhook;

use crate::auth::SenderAllowList;
use crate::config::Config;
use crate::llm::OpenAiCompletion;
use crate::metrics::Metrics;
use crate::webhook::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let config_path =
        std::env::var("SQLBOT_CONFIG").unwrap_or_else(|_| "config.yaml".to_string());
    let config = Config::load_or_default(&config_path)
        .with_context(|| format!("failed to load configuration from {}", config_path))?;

    logging::init(&config.logging);

    let api_key = Config::get_openai_api_key()?;
    let schema = Arc::new(config.schema_descriptor()?);
    info!(tables = schema.tables().len(), "schema loaded");

    info!(database = %config.database.path, "connecting to DuckDB");
    let executor = DuckExecutor::open(&config.database.path)
        .with_context(|| format!("failed to open database {}", config.database.path))?;
    executor
        .ping()
        .context("database connectivity check failed")?;

    let completion = OpenAiCompletion::new(api_key, config.llm.model.clone());
    info!(model = %completion.model(), "using OpenAI model");

    let pipeline = Pipeline::new(
        schema,
        Arc::new(completion),
        Arc::new(executor),
        config.messages.clone(),
    );

    let allow_list = SenderAllowList::new(config.auth.allowed_senders.clone());
    if allow_list.is_empty() {
        warn!("no authorized senders configured; every message will be ignored");
    }

    let state = Arc::new(AppState {
        pipeline,
        allow_list,
        metrics: Metrics::new().context("failed to register metrics")?,
    });

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;

    info!("Starting sqlbot server on {}", addr);
    axum::serve(listener, webhook::router(state)).await?;

    Ok(())
}
