//! Index schema. Safe to run on every startup.

use anyhow::Result;
use sqlx::SqlitePool;

pub async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    // `seq` preserves insertion order for tie-breaking during search.
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS entries (
            seq INTEGER PRIMARY KEY AUTOINCREMENT,
            id TEXT NOT NULL UNIQUE,
            text TEXT NOT NULL,
            hash TEXT NOT NULL,
            source TEXT NOT NULL,
            created_at INTEGER NOT NULL,
            model TEXT NOT NULL,
            dims INTEGER NOT NULL,
            embedding BLOB NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Earlier schemas indexed `source`; nothing queries by it.
    sqlx::query("DROP INDEX IF EXISTS idx_entries_source")
        .execute(pool)
        .await?;

    Ok(())
}
