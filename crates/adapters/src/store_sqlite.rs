//! SQLite handle store implementation

use async_trait::async_trait;
use devstats_domain::{HandleStore, Platform, PlatformIdentity, StoreError};
use sqlx::{SqlitePool, sqlite::SqlitePoolOptions};
use std::path::Path;
use time::OffsetDateTime;

/// SQLite-backed handle store
pub struct SqliteHandleStore {
    pool: SqlitePool,
}

impl SqliteHandleStore {
    /// Open (or create) the database at `db_path`
    pub async fn new(db_path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let db_path = db_path.as_ref();

        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| StoreError::Database(format!("Failed to create directory: {}", e)))?;
        }

        let db_url = format!("sqlite:{}?mode=rwc", db_path.display());

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(&db_url)
            .await
            .map_err(|e| StoreError::Database(e.to_string()))?;

        let store = Self { pool };
        store.run_migrations().await?;

        Ok(store)
    }

    /// Create an in-memory SQLite store (for testing)
    pub async fn in_memory() -> Result<Self, StoreError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .map_err(|e| StoreError::Database(e.to_string()))?;

        let store = Self { pool };
        store.run_migrations().await?;

        Ok(store)
    }

    async fn run_migrations(&self) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS handles (
                user_id TEXT NOT NULL,
                platform TEXT NOT NULL,
                handle TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                PRIMARY KEY (user_id, platform)
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(())
    }
}

#[async_trait]
impl HandleStore for SqliteHandleStore {
    async fn get_handles(&self, user_id: &str) -> Result<Vec<PlatformIdentity>, StoreError> {
        let rows: Vec<(String, String)> =
            sqlx::query_as("SELECT platform, handle FROM handles WHERE user_id = ?")
                .bind(user_id)
                .fetch_all(&self.pool)
                .await
                .map_err(|e| StoreError::Database(e.to_string()))?;

        let mut identities = rows
            .into_iter()
            .map(|(platform, handle)| {
                let platform = platform
                    .parse::<Platform>()
                    .map_err(|e| StoreError::Serialization(e.to_string()))?;
                Ok(PlatformIdentity::new(platform, handle))
            })
            .collect::<Result<Vec<_>, StoreError>>()?;
        identities.sort_by_key(|i| i.platform);

        Ok(identities)
    }

    async fn set_handle(
        &self,
        user_id: &str,
        identity: &PlatformIdentity,
    ) -> Result<(), StoreError> {
        let updated_at = OffsetDateTime::now_utc()
            .format(&time::format_description::well_known::Rfc3339)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;

        sqlx::query(
            r#"
            INSERT INTO handles (user_id, platform, handle, updated_at)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(user_id, platform) DO UPDATE SET
                handle = excluded.handle,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(user_id)
        .bind(identity.platform.as_str())
        .bind(&identity.handle)
        .bind(&updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(())
    }

    async fn remove_handle(&self, user_id: &str, platform: Platform) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM handles WHERE user_id = ? AND platform = ?")
            .bind(user_id)
            .bind(platform.as_str())
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(result.rows_affected() > 0)
    }
}
