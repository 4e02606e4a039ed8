// Moderation domain models - data structures for the review moderation system.
//
// These are pure domain types with no HTTP or database dependencies.
// The web layer and the stores convert these to their own representations.

use super::moderation_service::ModerationError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Lifecycle state of a moderation record.
///
/// A record starts as `Pending` and is moved exactly once, automatically, to
/// one of the other three states. Leaving `ManualReview` is up to a human
/// moderator and happens outside this crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ModerationStatus {
    Pending,
    Approved,
    Rejected,
    ManualReview,
}

impl ModerationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModerationStatus::Pending => "PENDING",
            ModerationStatus::Approved => "APPROVED",
            ModerationStatus::Rejected => "REJECTED",
            ModerationStatus::ManualReview => "MANUAL_REVIEW",
        }
    }
}

impl fmt::Display for ModerationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModerationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(ModerationStatus::Pending),
            "APPROVED" => Ok(ModerationStatus::Approved),
            "REJECTED" => Ok(ModerationStatus::Rejected),
            "MANUAL_REVIEW" => Ok(ModerationStatus::ManualReview),
            other => Err(format!("unknown moderation status '{}'", other)),
        }
    }
}

/// The persisted decision attached to exactly one review.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModerationRecord {
    pub id: i64,
    pub review_id: u64,
    pub status: ModerationStatus,
    /// 1.0 = maximally toxic. `None` until a decision is computed.
    pub toxicity_score: Option<f64>,
    pub reason: Option<String>,
    /// True only when the external classifier produced the score.
    pub ai_processed: bool,
    pub created_at: DateTime<Utc>,
    pub reviewed_at: Option<DateTime<Utc>>,
    /// Human moderator; only ever set by the admin workflow.
    pub reviewed_by: Option<u64>,
}

impl ModerationRecord {
    /// A fresh record in the `Pending` state. The store assigns the id.
    pub fn pending(id: i64, review_id: u64, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            review_id,
            status: ModerationStatus::Pending,
            toxicity_score: None,
            reason: None,
            ai_processed: false,
            created_at,
            reviewed_at: None,
            reviewed_by: None,
        }
    }

    /// Apply an automatic decision and stamp `reviewed_at`.
    pub fn decide(&mut self, decision: Decision, reviewed_at: DateTime<Utc>) {
        self.status = decision.status;
        self.toxicity_score = decision.toxicity_score;
        self.reason = Some(decision.reason);
        self.ai_processed = decision.ai_processed;
        self.reviewed_at = Some(reviewed_at);
    }
}

/// The outcome of one pipeline run before it is written to the record.
#[derive(Debug, Clone, PartialEq)]
pub struct Decision {
    pub status: ModerationStatus,
    pub toxicity_score: Option<f64>,
    pub reason: String,
    pub ai_processed: bool,
}

/// Successful result of the synchronous gate.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CheckOutcome {
    pub toxicity_score: f64,
    pub reason: String,
    /// False when the verdict came from the local rules (or moderation is off).
    pub ai_processed: bool,
}

/// Number of records per status.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ModerationCounts {
    pub pending: u64,
    pub approved: u64,
    pub rejected: u64,
    pub manual_review: u64,
}

impl ModerationCounts {
    pub fn total(&self) -> u64 {
        self.pending + self.approved + self.rejected + self.manual_review
    }

    pub fn increment(&mut self, status: ModerationStatus) {
        match status {
            ModerationStatus::Pending => self.pending += 1,
            ModerationStatus::Approved => self.approved += 1,
            ModerationStatus::Rejected => self.rejected += 1,
            ModerationStatus::ManualReview => self.manual_review += 1,
        }
    }
}

/// Snapshot for the admin stats endpoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModerationStats {
    #[serde(flatten)]
    pub counts: ModerationCounts,
    pub total: u64,
    /// Live probe of the external classifier.
    pub external_available: bool,
}

/// Lower bounds of the MANUAL_REVIEW band, one per decision path.
/// The two floors are configured independently.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ManualReviewFloor {
    pub ai: f64,
    pub fallback: f64,
}

impl Default for ManualReviewFloor {
    fn default() -> Self {
        Self {
            ai: 0.5,
            fallback: 0.4,
        }
    }
}

/// Thresholds and toggles for the moderation service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModerationConfig {
    /// When false every review is approved without analysis.
    pub enabled: bool,
    /// When false an unreachable classifier rejects the review (fail-closed).
    pub fallback_enabled: bool,
    /// Toxicity at or above this is rejected on both paths.
    pub reject_threshold: f64,
    pub manual_review_floor: ManualReviewFloor,
    /// Clean-score (1.0 = clean) below which the synchronous gate rejects
    /// text judged by the local rules alone.
    pub local_acceptability_floor: f64,
    /// Number of background pipeline runs allowed at once.
    pub worker_count: usize,
}

impl Default for ModerationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            fallback_enabled: true,
            reject_threshold: 0.7,
            manual_review_floor: ManualReviewFloor::default(),
            local_acceptability_floor: 0.5,
            worker_count: 2,
        }
    }
}

impl ModerationConfig {
    /// Check that every threshold is a probability and that each manual
    /// review band sits below the reject threshold.
    pub fn validate(&self) -> Result<(), ModerationError> {
        let bounded = [
            ("reject_threshold", self.reject_threshold),
            ("manual_review_floor.ai", self.manual_review_floor.ai),
            ("manual_review_floor.fallback", self.manual_review_floor.fallback),
            ("local_acceptability_floor", self.local_acceptability_floor),
        ];
        for (name, value) in bounded {
            if !(0.0..=1.0).contains(&value) {
                return Err(ModerationError::ConfigError(format!(
                    "{} must be within [0, 1], got {}",
                    name, value
                )));
            }
        }

        if self.manual_review_floor.ai > self.reject_threshold {
            return Err(ModerationError::ConfigError(
                "manual_review_floor.ai is above reject_threshold".to_string(),
            ));
        }
        if self.manual_review_floor.fallback > self.reject_threshold {
            return Err(ModerationError::ConfigError(
                "manual_review_floor.fallback is above reject_threshold".to_string(),
            ));
        }
        if self.worker_count == 0 {
            return Err(ModerationError::ConfigError(
                "worker_count must be at least 1".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_round_trips_through_its_column_name() {
        for status in [
            ModerationStatus::Pending,
            ModerationStatus::Approved,
            ModerationStatus::Rejected,
            ModerationStatus::ManualReview,
        ] {
            assert_eq!(status.as_str().parse::<ModerationStatus>(), Ok(status));
        }
        assert!("approved".parse::<ModerationStatus>().is_err());
    }

    #[test]
    fn status_serializes_in_screaming_case() {
        let json = serde_json::to_string(&ModerationStatus::ManualReview).unwrap();
        assert_eq!(json, "\"MANUAL_REVIEW\"");
    }

    #[test]
    fn default_config_is_valid() {
        let config = ModerationConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.reject_threshold, 0.7);
        assert_eq!(config.manual_review_floor.ai, 0.5);
        assert_eq!(config.manual_review_floor.fallback, 0.4);
    }

    #[test]
    fn config_rejects_out_of_range_thresholds() {
        let config = ModerationConfig {
            reject_threshold: 1.2,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = ModerationConfig {
            manual_review_floor: ManualReviewFloor {
                ai: 0.8,
                fallback: 0.4,
            },
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = ModerationConfig {
            worker_count: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn decide_stamps_the_record() {
        let created = Utc::now();
        let mut record = ModerationRecord::pending(1, 42, created);
        assert_eq!(record.status, ModerationStatus::Pending);
        assert!(record.reviewed_at.is_none());

        record.decide(
            Decision {
                status: ModerationStatus::Approved,
                toxicity_score: Some(0.1),
                reason: "fine".to_string(),
                ai_processed: true,
            },
            created,
        );

        assert_eq!(record.status, ModerationStatus::Approved);
        assert_eq!(record.toxicity_score, Some(0.1));
        assert_eq!(record.reason.as_deref(), Some("fine"));
        assert!(record.ai_processed);
        assert_eq!(record.reviewed_at, Some(created));
    }

    #[test]
    fn counts_total_every_status() {
        let mut counts = ModerationCounts::default();
        counts.increment(ModerationStatus::Approved);
        counts.increment(ModerationStatus::Approved);
        counts.increment(ModerationStatus::ManualReview);
        assert_eq!(counts.approved, 2);
        assert_eq!(counts.manual_review, 1);
        assert_eq!(counts.total(), 3);
    }
}
