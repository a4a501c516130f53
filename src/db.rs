// src/db.rs

use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use sqlx::{
    Sqlite, SqlitePool, Transaction,
    sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions},
};

/// Opens the SQLite pool (WAL, foreign keys on), creating the file and its parent directory
/// when they do not exist yet.
pub async fn connect(database_url: &str) -> Result<SqlitePool, Box<dyn std::error::Error>> {
    if let Some(parent) = database_file(database_url).and_then(|p| p.parent()) {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .acquire_timeout(Duration::from_secs(3))
        .connect_with(options)
        .await?;

    Ok(pool)
}

/// Applies the embedded migrations.
pub async fn migrate(pool: &SqlitePool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}

/// Starts a transaction holding the write lock from `BEGIN`.
/// Use it for read-then-write workflows; concurrent writers queue instead of hitting SQLITE_BUSY.
pub async fn begin_write(pool: &SqlitePool) -> Result<Transaction<'static, Sqlite>, sqlx::Error> {
    pool.begin_with("BEGIN IMMEDIATE").await
}

/// File path part of a `sqlite:` URL, `None` for in-memory databases.
fn database_file(database_url: &str) -> Option<&Path> {
    let path = database_url
        .strip_prefix("sqlite://")
        .or_else(|| database_url.strip_prefix("sqlite:"))?;
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() || path.starts_with(":memory:") {
        return None;
    }
    Some(Path::new(path))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_database_file() {
        assert_eq!(
            database_file("sqlite://data/tenderhub.db"),
            Some(Path::new("data/tenderhub.db"))
        );
        assert_eq!(
            database_file("sqlite:app.db?mode=rwc"),
            Some(Path::new("app.db"))
        );
        assert_eq!(database_file("sqlite::memory:"), None);
    }

    #[tokio::test]
    async fn test_migrations_apply_on_memory_db() {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        migrate(&pool).await.unwrap();

        let tables: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name IN \
             ('users', 'tenders', 'tender_bids', 'marketplace_listings', 'messages', \
              'reviews', 'notifications', 'specialists', 'crews')",
        )
        .fetch_one(&pool)
        .await
        .unwrap();
        assert_eq!(tables, 9);
    }
}
