// In-memory implementation of ReviewStore.
//
// Paired with the in-memory moderation store when DATABASE_URL=memory, so a
// local run never depends on a SQLite connection staying alive.

use crate::core::reviews::{Review, ReviewError, ReviewStore};
use async_trait::async_trait;
use dashmap::DashMap;

/// Reviews keyed by id.
pub struct InMemoryReviewStore {
    reviews: DashMap<u64, Review>,
}

impl InMemoryReviewStore {
    pub fn new() -> Self {
        Self {
            reviews: DashMap::new(),
        }
    }

    /// Add or replace a review.
    pub fn insert(&self, review: Review) {
        self.reviews.insert(review.id, review);
    }
}

impl Default for InMemoryReviewStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ReviewStore for InMemoryReviewStore {
    async fn find_review(&self, review_id: u64) -> Result<Option<Review>, ReviewError> {
        Ok(self.reviews.get(&review_id).map(|r| r.clone()))
    }
}
