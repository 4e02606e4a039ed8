// SQLite connection bootstrap shared by the moderation and review stores.

use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{Pool, Sqlite};
use std::path::Path;

/// Open a pool for `database_url`, creating the database file (and its parent
/// directory) when it does not exist yet.
///
/// Accepts `sqlite://path`, `sqlite:path`, a bare path, or `sqlite::memory:`.
/// In-memory databases live exactly as long as their connection, so those
/// pools hold one connection that is never reaped.
pub async fn connect_sqlite(database_url: &str) -> anyhow::Result<Pool<Sqlite>> {
    let in_memory = database_url.contains(":memory:");

    if !in_memory {
        let path_str = database_url
            .trim_start_matches("sqlite://")
            .trim_start_matches("sqlite:");
        let path = Path::new(path_str);
        if !path.exists() {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::File::create(path)?;
        }
    }

    let conn_str = if database_url.starts_with("sqlite:") {
        database_url.to_string()
    } else {
        format!("sqlite://{}", database_url)
    };

    let options = if in_memory {
        SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
    } else {
        SqlitePoolOptions::new().max_connections(5)
    };

    Ok(options.connect(&conn_str).await?)
}
