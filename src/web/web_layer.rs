// Web layer - HTTP adapter for the admin/API collaborators.

#[path = "error.rs"]
pub mod error;

#[path = "health.rs"]
pub mod health;

#[path = "moderation_routes.rs"]
pub mod moderation;

use crate::core::moderation::{ModerationService, ModerationStore, ToxicityClassifier};
use crate::core::reviews::ReviewStore;
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// The moderation service as wired by the composition root.
pub type AppModerationService =
    ModerationService<Box<dyn ModerationStore>, Box<dyn ToxicityClassifier>>;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub moderation: Arc<AppModerationService>,
    pub reviews: Arc<dyn ReviewStore>,
}

/// Create the main router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::check))
        .route("/api/moderation/test", post(moderation::test_moderation))
        .route("/admin/moderation/stats", get(moderation::stats))
        .route("/admin/moderation/pending", get(moderation::pending))
        .route(
            "/admin/moderation/review/:review_id",
            get(moderation::review_details).post(moderation::remoderate),
        )
        .route(
            "/admin/moderation/external-status",
            get(moderation::external_status),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
