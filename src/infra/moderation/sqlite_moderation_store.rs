// SQLite-backed moderation store.
//
// Tables:
// - comment_moderation: One decision record per review (UNIQUE review_id)

use crate::core::moderation::{
    ModerationCounts, ModerationError, ModerationRecord, ModerationStatus, ModerationStore,
};
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Pool, Row, Sqlite};

pub struct SqliteModerationStore {
    pool: Pool<Sqlite>,
}

fn storage_error(e: sqlx::Error) -> ModerationError {
    ModerationError::StorageError(e.to_string())
}

// Fixed-width UTC timestamps so ORDER BY on the text column is chronological.
fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, ModerationError> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| ModerationError::StorageError(format!("bad timestamp '{}': {}", value, e)))
}

impl SqliteModerationStore {
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }

    /// Run database migrations to create required tables.
    pub async fn migrate(&self) -> Result<(), ModerationError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS comment_moderation (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                review_id INTEGER NOT NULL UNIQUE,
                status TEXT NOT NULL DEFAULT 'PENDING',
                toxicity_score REAL,
                moderation_reason TEXT,
                ai_processed BOOLEAN NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL,
                reviewed_at TEXT,
                reviewed_by INTEGER
            );
            CREATE INDEX IF NOT EXISTS idx_comment_moderation_status
                ON comment_moderation(status);
            CREATE INDEX IF NOT EXISTS idx_comment_moderation_created_at
                ON comment_moderation(created_at);
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(storage_error)?;

        Ok(())
    }

    fn row_to_record(row: &SqliteRow) -> Result<ModerationRecord, ModerationError> {
        let status_str: String = row.get("status");
        let status = status_str
            .parse::<ModerationStatus>()
            .map_err(ModerationError::StorageError)?;

        let created_at_str: String = row.get("created_at");
        let reviewed_at = row
            .get::<Option<String>, _>("reviewed_at")
            .map(|s| parse_timestamp(&s))
            .transpose()?;

        Ok(ModerationRecord {
            id: row.get("id"),
            review_id: row.get::<i64, _>("review_id") as u64,
            status,
            toxicity_score: row.get("toxicity_score"),
            reason: row.get("moderation_reason"),
            ai_processed: row.get("ai_processed"),
            created_at: parse_timestamp(&created_at_str)?,
            reviewed_at,
            reviewed_by: row.get::<Option<i64>, _>("reviewed_by").map(|id| id as u64),
        })
    }
}

#[async_trait]
impl ModerationStore for SqliteModerationStore {
    async fn create_pending(
        &self,
        review_id: u64,
        created_at: DateTime<Utc>,
    ) -> Result<ModerationRecord, ModerationError> {
        let result = sqlx::query(
            r#"
            INSERT INTO comment_moderation (review_id, status, ai_processed, created_at)
            VALUES (?, ?, 0, ?)
            "#,
        )
        .bind(review_id as i64)
        .bind(ModerationStatus::Pending.as_str())
        .bind(format_timestamp(created_at))
        .execute(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db) if db.is_unique_violation() => {
                ModerationError::DuplicateRecord(review_id)
            }
            other => storage_error(other),
        })?;

        Ok(ModerationRecord::pending(
            result.last_insert_rowid(),
            review_id,
            created_at,
        ))
    }

    async fn save_decision(&self, record: &ModerationRecord) -> Result<(), ModerationError> {
        let result = sqlx::query(
            r#"
            UPDATE comment_moderation SET
                status = ?,
                toxicity_score = ?,
                moderation_reason = ?,
                ai_processed = ?,
                reviewed_at = ?
            WHERE id = ?
            "#,
        )
        .bind(record.status.as_str())
        .bind(record.toxicity_score)
        .bind(record.reason.as_deref())
        .bind(record.ai_processed)
        .bind(record.reviewed_at.map(format_timestamp))
        .bind(record.id)
        .execute(&self.pool)
        .await
        .map_err(storage_error)?;

        if result.rows_affected() == 0 {
            return Err(ModerationError::StorageError(format!(
                "no moderation record with id {}",
                record.id
            )));
        }
        Ok(())
    }

    async fn find_by_review_id(
        &self,
        review_id: u64,
    ) -> Result<Option<ModerationRecord>, ModerationError> {
        let row = sqlx::query("SELECT * FROM comment_moderation WHERE review_id = ?")
            .bind(review_id as i64)
            .fetch_optional(&self.pool)
            .await
            .map_err(storage_error)?;

        row.as_ref().map(Self::row_to_record).transpose()
    }

    async fn count_by_status(&self) -> Result<ModerationCounts, ModerationError> {
        let rows = sqlx::query(
            "SELECT status, COUNT(*) AS count FROM comment_moderation GROUP BY status",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(storage_error)?;

        let mut counts = ModerationCounts::default();
        for row in rows {
            let status_str: String = row.get("status");
            let count = row.get::<i64, _>("count") as u64;
            match status_str.parse::<ModerationStatus>() {
                Ok(ModerationStatus::Pending) => counts.pending = count,
                Ok(ModerationStatus::Approved) => counts.approved = count,
                Ok(ModerationStatus::Rejected) => counts.rejected = count,
                Ok(ModerationStatus::ManualReview) => counts.manual_review = count,
                Err(e) => tracing::warn!("Skipping unknown status in counts: {}", e),
            }
        }
        Ok(counts)
    }

    async fn list_by_status(
        &self,
        status: ModerationStatus,
        page: u32,
        page_size: u32,
    ) -> Result<Vec<ModerationRecord>, ModerationError> {
        let offset = page as i64 * page_size as i64;
        let rows = sqlx::query(
            r#"
            SELECT * FROM comment_moderation
            WHERE status = ?
            ORDER BY created_at ASC, id ASC
            LIMIT ? OFFSET ?
            "#,
        )
        .bind(status.as_str())
        .bind(page_size as i64)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(storage_error)?;

        rows.iter().map(Self::row_to_record).collect()
    }
}
