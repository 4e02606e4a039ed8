// In-memory implementation of ModerationStore.
//
// Selected with DATABASE_URL=memory for local runs without a database file.
// Records vanish when the process exits.

use crate::core::moderation::{
    ModerationCounts, ModerationError, ModerationRecord, ModerationStatus, ModerationStore,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::atomic::{AtomicI64, Ordering};

/// Records keyed by review id, which doubles as the uniqueness constraint.
pub struct InMemoryModerationStore {
    records: DashMap<u64, ModerationRecord>,
    next_id: AtomicI64,
}

impl InMemoryModerationStore {
    pub fn new() -> Self {
        Self {
            records: DashMap::new(),
            next_id: AtomicI64::new(1),
        }
    }
}

impl Default for InMemoryModerationStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ModerationStore for InMemoryModerationStore {
    async fn create_pending(
        &self,
        review_id: u64,
        created_at: DateTime<Utc>,
    ) -> Result<ModerationRecord, ModerationError> {
        match self.records.entry(review_id) {
            Entry::Occupied(_) => Err(ModerationError::DuplicateRecord(review_id)),
            Entry::Vacant(slot) => {
                let id = self.next_id.fetch_add(1, Ordering::SeqCst);
                let record = ModerationRecord::pending(id, review_id, created_at);
                slot.insert(record.clone());
                Ok(record)
            }
        }
    }

    async fn save_decision(&self, record: &ModerationRecord) -> Result<(), ModerationError> {
        match self.records.get_mut(&record.review_id) {
            Some(mut stored) if stored.id == record.id => {
                *stored = record.clone();
                Ok(())
            }
            _ => Err(ModerationError::StorageError(format!(
                "no moderation record with id {}",
                record.id
            ))),
        }
    }

    async fn find_by_review_id(
        &self,
        review_id: u64,
    ) -> Result<Option<ModerationRecord>, ModerationError> {
        Ok(self.records.get(&review_id).map(|r| r.clone()))
    }

    async fn count_by_status(&self) -> Result<ModerationCounts, ModerationError> {
        let mut counts = ModerationCounts::default();
        for record in self.records.iter() {
            counts.increment(record.status);
        }
        Ok(counts)
    }

    async fn list_by_status(
        &self,
        status: ModerationStatus,
        page: u32,
        page_size: u32,
    ) -> Result<Vec<ModerationRecord>, ModerationError> {
        let mut matching: Vec<ModerationRecord> = self
            .records
            .iter()
            .filter(|r| r.status == status)
            .map(|r| r.clone())
            .collect();
        matching.sort_by_key(|r| (r.created_at, r.id));

        let skip = page as usize * page_size as usize;
        Ok(matching
            .into_iter()
            .skip(skip)
            .take(page_size as usize)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[tokio::test]
    async fn test_one_record_per_review() {
        let store = InMemoryModerationStore::new();

        let first = store.create_pending(1, Utc::now()).await.unwrap();
        let second = store.create_pending(1, Utc::now()).await;

        assert_eq!(first.status, ModerationStatus::Pending);
        assert!(matches!(second, Err(ModerationError::DuplicateRecord(1))));
        assert_eq!(store.find_by_review_id(1).await.unwrap(), Some(first));
    }

    #[tokio::test]
    async fn test_save_decision_requires_existing_record() {
        let store = InMemoryModerationStore::new();
        let mut record = store.create_pending(2, Utc::now()).await.unwrap();
        record.status = ModerationStatus::Approved;

        store.save_decision(&record).await.unwrap();
        let stale = ModerationRecord::pending(record.id + 10, 3, Utc::now());

        assert_eq!(
            store.find_by_review_id(2).await.unwrap().unwrap().status,
            ModerationStatus::Approved
        );
        assert!(store.save_decision(&stale).await.is_err());
    }

    #[tokio::test]
    async fn test_listing_and_counts() {
        let store = InMemoryModerationStore::new();
        let base = Utc::now();
        for (review_id, secs) in [(5u64, 3i64), (6, 1), (7, 2)] {
            let mut record = store
                .create_pending(review_id, base + Duration::seconds(secs))
                .await
                .unwrap();
            record.status = ModerationStatus::ManualReview;
            store.save_decision(&record).await.unwrap();
        }
        store.create_pending(8, base).await.unwrap();

        let queue = store
            .list_by_status(ModerationStatus::ManualReview, 0, 10)
            .await
            .unwrap();
        let counts = store.count_by_status().await.unwrap();

        let ids: Vec<u64> = queue.iter().map(|r| r.review_id).collect();
        assert_eq!(ids, vec![6, 7, 5]);
        assert_eq!(counts.manual_review, 3);
        assert_eq!(counts.pending, 1);
    }
}
