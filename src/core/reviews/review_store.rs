// Read-only view of the review storage owned by the wider application.
//
// Reviews are created and edited elsewhere. The moderation core only reads the
// text of an already-committed review when a re-moderation is triggered.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A review as seen by the moderation subsystem.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
    pub id: u64,
    pub text: String,
    pub author_id: u64,
}

#[derive(Debug, Error)]
pub enum ReviewError {
    #[error("Storage error: {0}")]
    StorageError(String),
}

/// Trait for reading committed reviews.
#[async_trait]
pub trait ReviewStore: Send + Sync {
    /// Look up a review by id. Returns `None` if it does not exist.
    async fn find_review(&self, review_id: u64) -> Result<Option<Review>, ReviewError>;
}
