// This is the entry point of the review moderation service.
//
// **Architecture Overview:**
// - `core/` = Business logic (moderation rules, pipeline, ports)
// - `infra/` = Implementations of core traits (SQLite, Ollama)
// - `web/` = HTTP adapter for the admin and test endpoints
//
// This file's job is to:
// 1. Load configuration
// 2. Initialize stores and services (dependency injection)
// 3. Mount the routes and serve

// These attrs point each module declaration at a more descriptive root file
// so we don't end up with half a dozen mod.rs files that all look the same.
#[path = "core/core_layer.rs"]
mod core;
#[path = "infra/infra_layer.rs"]
mod infra;
#[path = "web/web_layer.rs"]
mod web;

mod config;

use crate::config::AppConfig;
use crate::core::moderation::{
    ModerationService, ModerationStore, RuleAnalyzer, ToxicityClassifier,
};
use crate::core::reviews::ReviewStore;
use crate::infra::ai::OllamaClient;
use crate::infra::db::connect_sqlite;
use crate::infra::moderation::{InMemoryModerationStore, SqliteModerationStore};
use crate::infra::reviews::{InMemoryReviewStore, SqliteReviewStore};
use crate::web::AppState;
use anyhow::Context;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Pick the moderation and review backends for `config`.
///
/// `DATABASE_URL=memory` keeps both in process memory; anything else is a
/// SQLite database shared by the two stores.
async fn build_stores(
    config: &AppConfig,
) -> anyhow::Result<(Box<dyn ModerationStore>, Arc<dyn ReviewStore>)> {
    if config.uses_memory_store() {
        tracing::info!("Using in-memory moderation and review stores");
        return Ok((
            Box::new(InMemoryModerationStore::new()),
            Arc::new(InMemoryReviewStore::new()),
        ));
    }

    tracing::info!(database = %config.database_url, "Using SQLite moderation store");
    let pool = connect_sqlite(&config.database_url)
        .await
        .context("Failed to open moderation database")?;

    let moderation_store = SqliteModerationStore::new(pool.clone());
    moderation_store.migrate().await?;
    let review_store = SqliteReviewStore::new(pool);
    review_store.migrate().await?;

    Ok((Box::new(moderation_store), Arc::new(review_store)))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file (if it exists)
    dotenv::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "review_moderation=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env();
    config.validate().context("Invalid configuration")?;

    tracing::info!(
        enabled = config.moderation.enabled,
        fallback_enabled = config.moderation.fallback_enabled,
        reject_threshold = config.moderation.reject_threshold,
        manual_review_floor_ai = config.moderation.manual_review_floor.ai,
        manual_review_floor_fallback = config.moderation.manual_review_floor.fallback,
        local_acceptability_floor = config.moderation.local_acceptability_floor,
        workers = config.moderation.worker_count,
        "Moderation configuration loaded"
    );
    tracing::info!(
        url = %config.classifier.base_url,
        model = %config.classifier.model,
        timeout_secs = config.classifier.timeout.as_secs(),
        "External classifier configured"
    );

    // ========================================================================
    // DEPENDENCY INJECTION
    // ========================================================================

    let (moderation_store, reviews) = build_stores(&config).await?;

    let classifier: Box<dyn ToxicityClassifier> = Box::new(
        OllamaClient::new(config.classifier.clone())
            .context("Failed to build classifier HTTP client")?,
    );

    let moderation = Arc::new(ModerationService::new(
        moderation_store,
        classifier,
        RuleAnalyzer::new(),
        config.moderation.clone(),
    ));

    let app = web::create_router(AppState {
        moderation,
        reviews,
    });

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind_addr))?;
    tracing::info!("Listening on {}", config.bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}
