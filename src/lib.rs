pub(crate) mod api;
pub(crate) mod core;
pub(crate) mod db;
pub(crate) mod repositories;
pub(crate) mod schemas;
pub(crate) mod services;
pub(crate) mod tasks;

#[cfg(test)]
mod test_support;

use std::sync::Arc;

use anyhow::Context;

use crate::core::{config::Settings, state::AppState, telemetry};
use crate::services::ai_scoring::AiScoringService;
use crate::services::submission_store::PgSubmissionStore;

pub async fn run() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = Settings::load()?;
    telemetry::init_tracing(&settings)?;
    core::metrics::init(&settings)?;

    let db_pool = db::init_pool(&settings).await.context("Failed to connect to Postgres")?;
    db::run_migrations(&db_pool).await.context("Failed to run migrations")?;

    let store = Arc::new(PgSubmissionStore::new(db_pool.clone()));
    let scorer = Arc::new(AiScoringService::from_settings(&settings)?);
    let state = AppState::new(settings, store, scorer);

    let app = api::router::router(state.clone());
    let addr = state.settings().server_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;

    tracing::info!(
        addr = %addr,
        environment = %state.settings().runtime().environment.as_str(),
        model = %state.settings().ai().ai_model,
        "Classroom grader listening"
    );

    let result =
        axum::serve(listener, app).with_graceful_shutdown(core::shutdown::shutdown_signal()).await;

    db_pool.close().await;
    tracing::info!("Database pool closed");

    result?;

    Ok(())
}
