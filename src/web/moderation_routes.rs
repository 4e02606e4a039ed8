//! Moderation admin and test handlers

use super::error::{ApiError, ApiResult};
use super::AppState;
use crate::core::moderation::{ModerationRecord, ModerationStats};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};

const MAX_PAGE_SIZE: u32 = 100;

// ============================================================================
// Request / response types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct TestRequest {
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct TestResponse {
    pub approved: bool,
    pub toxicity_score: f64,
    pub reason: String,
    pub ai_processed: bool,
}

#[derive(Debug, Deserialize)]
pub struct PageParams {
    #[serde(default)]
    pub page: u32,
    #[serde(default = "default_page_size")]
    pub size: u32,
}

fn default_page_size() -> u32 {
    10
}

#[derive(Debug, Serialize)]
pub struct PendingPage {
    pub page: u32,
    pub size: u32,
    pub records: Vec<ModerationRecord>,
}

#[derive(Debug, Serialize)]
pub struct RemoderationAccepted {
    pub review_id: u64,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ExternalStatus {
    pub available: bool,
    pub message: String,
}

// ============================================================================
// Handlers
// ============================================================================

/// Run the pre-publish gate against arbitrary text.
pub async fn test_moderation(
    State(state): State<AppState>,
    Json(req): Json<TestRequest>,
) -> ApiResult<Json<TestResponse>> {
    if req.text.trim().is_empty() {
        return Err(ApiError::ValidationError("Text cannot be empty".to_string()));
    }

    let outcome = state.moderation.check_before_publish(&req.text).await?;

    Ok(Json(TestResponse {
        approved: true,
        toxicity_score: outcome.toxicity_score,
        reason: outcome.reason,
        ai_processed: outcome.ai_processed,
    }))
}

pub async fn stats(State(state): State<AppState>) -> ApiResult<Json<ModerationStats>> {
    Ok(Json(state.moderation.stats().await?))
}

/// Page through the manual review queue, oldest first.
pub async fn pending(
    State(state): State<AppState>,
    Query(params): Query<PageParams>,
) -> ApiResult<Json<PendingPage>> {
    let size = params.size.clamp(1, MAX_PAGE_SIZE);
    let records = state
        .moderation
        .manual_review_queue(params.page, size)
        .await?;

    Ok(Json(PendingPage {
        page: params.page,
        size,
        records,
    }))
}

pub async fn review_details(
    State(state): State<AppState>,
    Path(review_id): Path<u64>,
) -> ApiResult<Json<ModerationRecord>> {
    state
        .moderation
        .find_by_review_id(review_id)
        .await?
        .map(Json)
        .ok_or_else(|| {
            ApiError::NotFound(format!("No moderation record for review {}", review_id))
        })
}

/// Start the background pipeline for a committed review that has no record yet.
pub async fn remoderate(
    State(state): State<AppState>,
    Path(review_id): Path<u64>,
) -> ApiResult<(StatusCode, Json<RemoderationAccepted>)> {
    let review = state
        .reviews
        .find_review(review_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Review {} not found", review_id)))?;

    if state.moderation.find_by_review_id(review_id).await?.is_some() {
        return Err(ApiError::AlreadyExists(format!(
            "Review {} already has a moderation record",
            review_id
        )));
    }

    tracing::info!(review_id, "Re-moderation requested");
    // The task reports its own failures; the caller only gets the acknowledgement.
    let _ = state.moderation.moderate_async(review);

    Ok((
        StatusCode::ACCEPTED,
        Json(RemoderationAccepted {
            review_id,
            message: "Moderation started".to_string(),
        }),
    ))
}

pub async fn external_status(State(state): State<AppState>) -> Json<ExternalStatus> {
    let available = state.moderation.is_external_available().await;
    let message = if available {
        "External classifier is reachable".to_string()
    } else {
        "External classifier is unavailable, local rules are in use".to_string()
    };

    Json(ExternalStatus { available, message })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::moderation::{
        Classification, ClassifierError, ModerationConfig, ModerationService, ModerationStatus,
        ModerationStore, RuleAnalyzer, ToxicityClassifier,
    };
    use crate::core::reviews::{Review, ReviewError, ReviewStore};
    use crate::infra::moderation::InMemoryModerationStore;
    use async_trait::async_trait;
    use chrono::Utc;
    use dashmap::DashMap;
    use std::sync::Arc;
    use std::time::Duration;

    struct FixedClassifier {
        score: Option<f64>,
    }

    #[async_trait]
    impl ToxicityClassifier for FixedClassifier {
        async fn analyze(&self, _text: &str) -> Result<Classification, ClassifierError> {
            match self.score {
                Some(score) => Ok(Classification {
                    toxicity_score: score,
                    reason: "model verdict".to_string(),
                }),
                None => Err(ClassifierError::Unavailable("connection refused".to_string())),
            }
        }
    }

    struct MockReviewStore {
        reviews: DashMap<u64, Review>,
    }

    #[async_trait]
    impl ReviewStore for MockReviewStore {
        async fn find_review(&self, review_id: u64) -> Result<Option<Review>, ReviewError> {
            Ok(self.reviews.get(&review_id).map(|r| r.clone()))
        }
    }

    fn state_with(score: Option<f64>, store: InMemoryModerationStore) -> AppState {
        let reviews = DashMap::new();
        reviews.insert(
            7,
            Review {
                id: 7,
                text: "Great photography, weak script".to_string(),
                author_id: 42,
            },
        );

        let store: Box<dyn ModerationStore> = Box::new(store);
        let classifier: Box<dyn ToxicityClassifier> = Box::new(FixedClassifier { score });
        let service = ModerationService::new(
            store,
            classifier,
            RuleAnalyzer::new(),
            ModerationConfig::default(),
        );

        AppState {
            moderation: Arc::new(service),
            reviews: Arc::new(MockReviewStore { reviews }),
        }
    }

    fn state(score: Option<f64>) -> AppState {
        state_with(score, InMemoryModerationStore::new())
    }

    fn text(value: &str) -> Json<TestRequest> {
        Json(TestRequest {
            text: value.to_string(),
        })
    }

    #[tokio::test]
    async fn test_endpoint_approves_clean_text() {
        let Json(response) = test_moderation(State(state(Some(0.1))), text("Lovely film"))
            .await
            .unwrap();

        assert!(response.approved);
        assert_eq!(response.toxicity_score, 0.1);
        assert!(response.ai_processed);
    }

    #[tokio::test]
    async fn test_endpoint_rejects_toxic_text() {
        let result = test_moderation(State(state(Some(0.9))), text("awful words")).await;

        assert!(matches!(
            result,
            Err(ApiError::ContentRejected { score, .. }) if score == 0.9
        ));
    }

    #[tokio::test]
    async fn test_endpoint_uses_rules_when_classifier_is_down() {
        let Json(response) = test_moderation(State(state(None)), text("what a shit ending"))
            .await
            .unwrap();

        assert!(!response.ai_processed);
        assert!(response.reason.starts_with("Fallback: "));

        let result = test_moderation(State(state(None)), text("fuck this shit, idiota")).await;
        assert!(matches!(result, Err(ApiError::ContentRejected { .. })));
    }

    #[tokio::test]
    async fn test_endpoint_rejects_blank_text() {
        let result = test_moderation(State(state(Some(0.1))), text("   ")).await;

        assert!(matches!(result, Err(ApiError::ValidationError(_))));
    }

    #[tokio::test]
    async fn pending_clamps_page_size_and_lists_manual_reviews() {
        let store = InMemoryModerationStore::new();
        for review_id in 1..=3 {
            let mut record = store.create_pending(review_id, Utc::now()).await.unwrap();
            record.status = if review_id == 2 {
                ModerationStatus::Approved
            } else {
                ModerationStatus::ManualReview
            };
            store.save_decision(&record).await.unwrap();
        }
        let state = state_with(Some(0.1), store);

        let Json(page) = pending(
            State(state),
            Query(PageParams {
                page: 0,
                size: 1000,
            }),
        )
        .await
        .unwrap();

        assert_eq!(page.size, MAX_PAGE_SIZE);
        let ids: Vec<u64> = page.records.iter().map(|r| r.review_id).collect();
        assert_eq!(ids, vec![1, 3]);
    }

    #[tokio::test]
    async fn review_details_not_found() {
        let result = review_details(State(state(Some(0.1))), Path(99)).await;

        assert!(matches!(result, Err(ApiError::NotFound(_))));
    }

    #[tokio::test]
    async fn remoderate_unknown_review_is_not_found() {
        let result = remoderate(State(state(Some(0.1))), Path(99)).await;

        assert!(matches!(result, Err(ApiError::NotFound(_))));
    }

    #[tokio::test]
    async fn remoderate_runs_pipeline_once() {
        let state = state(Some(0.6));

        let (status, Json(body)) = remoderate(State(state.clone()), Path(7)).await.unwrap();
        assert_eq!(status, StatusCode::ACCEPTED);
        assert_eq!(body.review_id, 7);

        let mut decided = None;
        for _ in 0..100 {
            if let Some(record) = state.moderation.find_by_review_id(7).await.unwrap() {
                if record.status != ModerationStatus::Pending {
                    decided = Some(record);
                    break;
                }
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        let record = decided.expect("pipeline should finish");
        assert_eq!(record.status, ModerationStatus::ManualReview);
        assert!(record.ai_processed);

        let Json(details) = review_details(State(state.clone()), Path(7)).await.unwrap();
        assert_eq!(details, record);

        let again = remoderate(State(state), Path(7)).await;
        assert!(matches!(again, Err(ApiError::AlreadyExists(_))));
    }

    #[tokio::test]
    async fn stats_and_external_status_reflect_classifier() {
        let Json(stats) = stats(State(state(None))).await.unwrap();
        assert_eq!(stats.total, 0);
        assert!(!stats.external_available);

        let Json(status) = external_status(State(state(Some(0.0)))).await;
        assert!(status.available);
    }
}
