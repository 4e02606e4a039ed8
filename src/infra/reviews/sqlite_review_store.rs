// SQLite reader for the `reviews` table owned by the catalog application.

use crate::core::reviews::{Review, ReviewError, ReviewStore};
use async_trait::async_trait;
use sqlx::{Pool, Row, Sqlite};

pub struct SqliteReviewStore {
    pool: Pool<Sqlite>,
}

impl SqliteReviewStore {
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }

    /// Create the reviews table for standalone runs. A no-op when the
    /// catalog application already owns it.
    pub async fn migrate(&self) -> Result<(), ReviewError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS reviews (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL,
                movie_id INTEGER,
                text TEXT,
                stars INTEGER,
                created_at TEXT
            );
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| ReviewError::StorageError(e.to_string()))?;
        Ok(())
    }
}

#[async_trait]
impl ReviewStore for SqliteReviewStore {
    async fn find_review(&self, review_id: u64) -> Result<Option<Review>, ReviewError> {
        let row = sqlx::query("SELECT id, user_id, text FROM reviews WHERE id = ?")
            .bind(review_id as i64)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| ReviewError::StorageError(e.to_string()))?;

        Ok(row.map(|row| Review {
            id: row.get::<i64, _>("id") as u64,
            author_id: row.get::<i64, _>("user_id") as u64,
            // Star-only reviews have no text.
            text: row.get::<Option<String>, _>("text").unwrap_or_default(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::db::connect_sqlite;

    #[tokio::test]
    async fn test_find_review() {
        let pool = connect_sqlite("sqlite::memory:").await.unwrap();
        let store = SqliteReviewStore::new(pool.clone());
        store.migrate().await.unwrap();

        sqlx::query("INSERT INTO reviews (id, user_id, text) VALUES (1, 9, 'Loved it'), (2, 9, NULL)")
            .execute(&pool)
            .await
            .unwrap();

        let review = store.find_review(1).await.unwrap().unwrap();
        assert_eq!(review.text, "Loved it");
        assert_eq!(review.author_id, 9);

        let star_only = store.find_review(2).await.unwrap().unwrap();
        assert_eq!(star_only.text, "");

        assert!(store.find_review(3).await.unwrap().is_none());
    }
}
