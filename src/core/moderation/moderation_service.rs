// Moderation service - core business logic for review moderation.
//
// This service handles:
// - The asynchronous pipeline (publish-then-moderate) on a bounded worker pool
// - The synchronous gate (moderate-then-publish) with hard rejections
// - Degrading to the local rule analyzer when the external classifier is down
// - Read queries for the admin collaborator (stats, manual review queue)
//
// NO HTTP or database dependencies here - just pure domain logic.

use super::classifier::{ClassifierError, ToxicityClassifier};
use super::moderation_models::{
    CheckOutcome, Decision, ModerationConfig, ModerationRecord, ModerationStats, ModerationStatus,
};
use super::moderation_store::ModerationStore;
use super::rule_analyzer::{LocalAnalyzer, RuleAnalyzer};
use crate::core::reviews::Review;
use chrono::Utc;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;

/// Reason recorded when moderation is switched off.
pub const DISABLED_REASON: &str = "Moderation disabled - automatically approved";

/// Reason recorded when the classifier is down and fallback is not allowed.
pub const SYSTEM_ERROR_REASON: &str = "moderation system error";

/// Prefix of every reason produced by the local rules.
pub const FALLBACK_REASON_PREFIX: &str = "Fallback: ";

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug, Error)]
pub enum ModerationError {
    /// Policy outcome of the synchronous gate. A hard stop, not a warning.
    #[error("Content rejected (toxicity {score:.2}): {reason}")]
    ContentRejected {
        score: f64,
        reason: String,
        ai_processed: bool,
    },

    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("Review {0} already has a moderation record")]
    DuplicateRecord(u64),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Moderation worker failed: {0}")]
    WorkerFailed(String),
}

// ============================================================================
// SCORING HELPERS
// ============================================================================

/// Convert the rule analyzer's clean score (1.0 = clean) into a toxicity
/// score (1.0 = toxic).
pub fn toxicity_from_clean_score(clean_score: f64) -> f64 {
    (1.0 - clean_score).clamp(0.0, 1.0)
}

/// Map a toxicity score onto a status given the reject threshold and the
/// lower bound of the manual review band.
pub fn status_for_score(score: f64, reject_threshold: f64, manual_review_floor: f64) -> ModerationStatus {
    if score >= reject_threshold {
        ModerationStatus::Rejected
    } else if score >= manual_review_floor {
        ModerationStatus::ManualReview
    } else {
        ModerationStatus::Approved
    }
}

// ============================================================================
// CORE SERVICE
// ============================================================================

/// Coordinates the external classifier, the local rules and the record store.
pub struct ModerationService<S, C, R = RuleAnalyzer>
where
    S: ModerationStore,
    C: ToxicityClassifier,
    R: LocalAnalyzer,
{
    store: S,
    classifier: C,
    rules: R,
    config: ModerationConfig,
    /// One permit per background worker.
    workers: Arc<Semaphore>,
}

impl<S, C, R> ModerationService<S, C, R>
where
    S: ModerationStore + 'static,
    C: ToxicityClassifier + 'static,
    R: LocalAnalyzer + 'static,
{
    pub fn new(store: S, classifier: C, rules: R, config: ModerationConfig) -> Self {
        let workers = Arc::new(Semaphore::new(config.worker_count.max(1)));
        Self {
            store,
            classifier,
            rules,
            config,
            workers,
        }
    }

    /// Moderate an already-committed review in the background.
    ///
    /// Returns immediately. The spawned task waits for a free worker, creates
    /// the PENDING record, decides and writes the final status. Nothing guards
    /// against two concurrent runs for the same review other than the store's
    /// uniqueness constraint.
    pub fn moderate_async(
        self: &Arc<Self>,
        review: Review,
    ) -> JoinHandle<Result<ModerationRecord, ModerationError>> {
        let service = Arc::clone(self);
        let workers = Arc::clone(&self.workers);

        tokio::spawn(async move {
            let _permit = workers
                .acquire_owned()
                .await
                .map_err(|e| ModerationError::WorkerFailed(e.to_string()))?;

            let result = service.moderate_review(&review).await;
            if let Err(ref e) = result {
                tracing::warn!(review_id = review.id, "Async moderation failed: {}", e);
            }
            result
        })
    }

    /// Run the whole pipeline for one review on the current task.
    ///
    /// The record is written exactly twice: created as PENDING, then updated
    /// with the decision. Storage errors propagate unchanged.
    pub async fn moderate_review(&self, review: &Review) -> Result<ModerationRecord, ModerationError> {
        tracing::info!(
            review_id = review.id,
            author_id = review.author_id,
            "Starting moderation"
        );

        let mut record = self.store.create_pending(review.id, Utc::now()).await?;

        let decision = self.decide(review).await;
        record.decide(decision, Utc::now());
        self.store.save_decision(&record).await?;

        tracing::info!(
            review_id = record.review_id,
            record_id = record.id,
            status = %record.status,
            score = ?record.toxicity_score,
            ai_processed = record.ai_processed,
            "Moderation saved"
        );

        Ok(record)
    }

    /// Produce the decision for a review. Never fails: an unreachable
    /// classifier degrades to the rules or to a fail-closed rejection.
    async fn decide(&self, review: &Review) -> Decision {
        if !self.config.enabled {
            tracing::debug!(review_id = review.id, "Moderation disabled, approving");
            return Decision {
                status: ModerationStatus::Approved,
                toxicity_score: Some(0.0),
                reason: DISABLED_REASON.to_string(),
                ai_processed: false,
            };
        }

        match self.classifier.analyze(&review.text).await {
            Ok(classification) => {
                let score = classification.toxicity_score;
                let status = status_for_score(
                    score,
                    self.config.reject_threshold,
                    self.config.manual_review_floor.ai,
                );
                Decision {
                    status,
                    toxicity_score: Some(score),
                    reason: classification.reason,
                    ai_processed: true,
                }
            }
            Err(ClassifierError::Unavailable(cause)) => {
                tracing::warn!(review_id = review.id, "Classifier unavailable: {}", cause);

                if self.config.fallback_enabled {
                    self.decide_with_rules(&review.text)
                } else {
                    tracing::error!(
                        review_id = review.id,
                        "Classifier unavailable and fallback disabled, rejecting"
                    );
                    Decision {
                        status: ModerationStatus::Rejected,
                        toxicity_score: None,
                        reason: SYSTEM_ERROR_REASON.to_string(),
                        ai_processed: false,
                    }
                }
            }
        }
    }

    fn decide_with_rules(&self, text: &str) -> Decision {
        let analysis = self.rules.analyze(text);
        let score = toxicity_from_clean_score(analysis.clean_score);
        let status = status_for_score(
            score,
            self.config.reject_threshold,
            self.config.manual_review_floor.fallback,
        );

        tracing::debug!(
            matched = analysis.matched_count,
            score,
            "Fallback analysis complete"
        );

        Decision {
            status,
            toxicity_score: Some(score),
            reason: format!("{}{}", FALLBACK_REASON_PREFIX, analysis.reason()),
            ai_processed: false,
        }
    }

    /// Gate text before the review is committed.
    ///
    /// # Returns
    /// A `CheckOutcome` when the text may be published, or
    /// `ModerationError::ContentRejected` when it must not be.
    pub async fn check_before_publish(&self, text: &str) -> Result<CheckOutcome, ModerationError> {
        if !self.config.enabled {
            return Ok(CheckOutcome {
                toxicity_score: 0.0,
                reason: DISABLED_REASON.to_string(),
                ai_processed: false,
            });
        }

        match self.classifier.analyze(text).await {
            Ok(classification) => {
                if classification.toxicity_score >= self.config.reject_threshold {
                    tracing::info!(
                        score = classification.toxicity_score,
                        "Content blocked by classifier"
                    );
                    return Err(ModerationError::ContentRejected {
                        score: classification.toxicity_score,
                        reason: classification.reason,
                        ai_processed: true,
                    });
                }

                Ok(CheckOutcome {
                    toxicity_score: classification.toxicity_score,
                    reason: classification.reason,
                    ai_processed: true,
                })
            }
            Err(ClassifierError::Unavailable(cause)) => {
                tracing::warn!("Classifier unavailable for pre-publish check: {}", cause);

                let analysis = self.rules.analyze(text);
                let score = toxicity_from_clean_score(analysis.clean_score);
                let reason = format!("{}{}", FALLBACK_REASON_PREFIX, analysis.reason());

                if analysis.clean_score < self.config.local_acceptability_floor {
                    tracing::info!(score, "Content blocked by local rules");
                    return Err(ModerationError::ContentRejected {
                        score,
                        reason,
                        ai_processed: false,
                    });
                }

                Ok(CheckOutcome {
                    toxicity_score: score,
                    reason,
                    ai_processed: false,
                })
            }
        }
    }

    /// Record counts per status plus a live availability probe.
    pub async fn stats(&self) -> Result<ModerationStats, ModerationError> {
        let counts = self.store.count_by_status().await?;
        let external_available = self.classifier.is_available().await;
        Ok(ModerationStats {
            total: counts.total(),
            counts,
            external_available,
        })
    }

    /// MANUAL_REVIEW records, oldest first.
    pub async fn manual_review_queue(
        &self,
        page: u32,
        page_size: u32,
    ) -> Result<Vec<ModerationRecord>, ModerationError> {
        self.store
            .list_by_status(ModerationStatus::ManualReview, page, page_size)
            .await
    }

    pub async fn find_by_review_id(
        &self,
        review_id: u64,
    ) -> Result<Option<ModerationRecord>, ModerationError> {
        self.store.find_by_review_id(review_id).await
    }

    pub async fn is_external_available(&self) -> bool {
        self.classifier.is_available().await
    }
}

// ============================================================================
// TESTS
// ============================================================================
