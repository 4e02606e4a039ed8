// Storage port for moderation records.
//
// The core defines WHAT it needs; infra provides SQLite and in-memory versions.

use super::moderation_models::{ModerationCounts, ModerationRecord, ModerationStatus};
use super::moderation_service::ModerationError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Trait for persisting moderation records.
///
/// Implementations must enforce at most one record per review: a second
/// `create_pending` for the same review fails with
/// `ModerationError::DuplicateRecord`.
#[async_trait]
pub trait ModerationStore: Send + Sync {
    /// Insert a new PENDING record and return it with its assigned id.
    async fn create_pending(
        &self,
        review_id: u64,
        created_at: DateTime<Utc>,
    ) -> Result<ModerationRecord, ModerationError>;

    /// Persist the decision fields of an existing record.
    async fn save_decision(&self, record: &ModerationRecord) -> Result<(), ModerationError>;

    async fn find_by_review_id(
        &self,
        review_id: u64,
    ) -> Result<Option<ModerationRecord>, ModerationError>;

    async fn count_by_status(&self) -> Result<ModerationCounts, ModerationError>;

    /// One page of records with `status`, oldest first. `page` is zero-based.
    async fn list_by_status(
        &self,
        status: ModerationStatus,
        page: u32,
        page_size: u32,
    ) -> Result<Vec<ModerationRecord>, ModerationError>;
}

// Blanket implementation for Box<dyn ModerationStore>
// so the composition root can choose the backend at runtime.
#[async_trait]
impl ModerationStore for Box<dyn ModerationStore> {
    async fn create_pending(
        &self,
        review_id: u64,
        created_at: DateTime<Utc>,
    ) -> Result<ModerationRecord, ModerationError> {
        (**self).create_pending(review_id, created_at).await
    }

    async fn save_decision(&self, record: &ModerationRecord) -> Result<(), ModerationError> {
        (**self).save_decision(record).await
    }

    async fn find_by_review_id(
        &self,
        review_id: u64,
    ) -> Result<Option<ModerationRecord>, ModerationError> {
        (**self).find_by_review_id(review_id).await
    }

    async fn count_by_status(&self) -> Result<ModerationCounts, ModerationError> {
        (**self).count_by_status().await
    }

    async fn list_by_status(
        &self,
        status: ModerationStatus,
        page: u32,
        page_size: u32,
    ) -> Result<Vec<ModerationRecord>, ModerationError> {
        (**self).list_by_status(status, page, page_size).await
    }
}
