//! Client-side state storage repository.

use chrono::Utc;
use marketledger_api::types::FilterSet;
use sqlx::Row;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};

use crate::Result;

const COOKIE_CONSENT: &str = "cookie_consent";
const FILTER_SNAPSHOT: &str = "filter_snapshot";

/// Repository for small pieces of client state that outlive a session.
pub struct ClientStateRepository {
    pool: SqlitePool,
}

impl ClientStateRepository {
    /// Create a new repository with the given database path.
    ///
    /// Creates the database and table if they don't exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the database connection fails or schema creation fails.
    pub async fn new(database_path: &str) -> Result<Self> {
        let url = format!("sqlite:{database_path}?mode=rwc");
        let pool = SqlitePoolOptions::new()
            .max_connections(2)
            .connect(&url)
            .await?;

        let repo = Self { pool };
        repo.initialize().await?;
        Ok(repo)
    }

    /// Create an in-memory repository for testing.
    ///
    /// # Errors
    ///
    /// Returns an error if the database connection fails or schema creation fails.
    pub async fn in_memory() -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await?;

        let repo = Self { pool };
        repo.initialize().await?;
        Ok(repo)
    }

    async fn initialize(&self) -> Result<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS client_state (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        let row = sqlx::query("SELECT value FROM client_state WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|row| row.get("value")))
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        sqlx::query(
            r"
            INSERT INTO client_state (key, value, updated_at)
            VALUES (?, ?, ?)
            ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at
            ",
        )
        .bind(key)
        .bind(value)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        sqlx::query("DELETE FROM client_state WHERE key = ?")
            .bind(key)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Whether the user accepted cookies.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn cookie_consent(&self) -> Result<bool> {
        Ok(self.get(COOKIE_CONSENT).await?.as_deref() == Some("true"))
    }

    /// Records the user's cookie choice.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn set_cookie_consent(&self, accepted: bool) -> Result<()> {
        self.set(COOKIE_CONSENT, if accepted { "true" } else { "false" })
            .await
    }

    /// Last listing filters the user applied.
    ///
    /// A snapshot that no longer parses is treated as absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn filter_snapshot(&self) -> Result<Option<FilterSet>> {
        let Some(raw) = self.get(FILTER_SNAPSHOT).await? else {
            return Ok(None);
        };
        match serde_json::from_str(&raw) {
            Ok(filters) => Ok(Some(filters)),
            Err(e) => {
                tracing::warn!("Ignoring unreadable filter snapshot: {e}");
                Ok(None)
            }
        }
    }

    /// Stores the filters, blank values removed.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the database query fails.
    pub async fn save_filter_snapshot(&self, filters: &FilterSet) -> Result<()> {
        let raw = serde_json::to_string(&filters.stripped())?;
        self.set(FILTER_SNAPSHOT, &raw).await
    }

    /// Forgets the stored filters.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn clear_filter_snapshot(&self) -> Result<()> {
        self.remove(FILTER_SNAPSHOT).await
    }
}
