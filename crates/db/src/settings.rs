//! Persisted key/value settings store.
//!
//! Holds the migration bookkeeping (schema version, applied-version
//! history, busy flag) and any global configuration the core reads but
//! does not own. Values are `jsonb`.

use serde_json::{json, Value};
use sqlx::PgPool;

/// Key for the stamped schema version.
pub const KEY_SCHEMA_VERSION: &str = "schema_version";
/// Key for the JSON array of applied migration versions.
pub const KEY_MIGRATION_HISTORY: &str = "migration_history";
/// Key for the persisted migration busy flag.
pub const KEY_MIGRATION_BUSY: &str = "migration_busy";

/// Typed access to the `settings` table.
#[derive(Clone)]
pub struct SettingsRepo {
    pool: PgPool,
}

impl SettingsRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create the backing table when absent. Idempotent; the migration
    /// runner calls this before consulting its own bookkeeping.
    pub async fn ensure_table(&self) -> Result<(), sqlx::Error> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS settings (
                key TEXT PRIMARY KEY,
                value JSONB NOT NULL,
                updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )",
        )
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn get(&self, key: &str) -> Result<Option<Value>, sqlx::Error> {
        let row: Option<(Value,)> =
            sqlx::query_as("SELECT value FROM settings WHERE key = $1")
                .bind(key)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.map(|(value,)| value))
    }

    pub async fn set(&self, key: &str, value: &Value) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO settings (key, value) VALUES ($1, $2)
             ON CONFLICT (key) DO UPDATE SET value = EXCLUDED.value, updated_at = NOW()",
        )
        .bind(key)
        .bind(sqlx::types::Json(value.clone()))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn delete(&self, key: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM settings WHERE key = $1")
            .bind(key)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    // -- migration bookkeeping -------------------------------------------

    /// The stamped schema version, if any batch has ever completed.
    pub async fn schema_version(&self) -> Result<Option<String>, sqlx::Error> {
        Ok(self
            .get(KEY_SCHEMA_VERSION)
            .await?
            .and_then(|v| v.as_str().map(str::to_owned)))
    }

    pub async fn set_schema_version(&self, version: &str) -> Result<(), sqlx::Error> {
        self.set(KEY_SCHEMA_VERSION, &json!(version)).await
    }

    /// Versions of every migration unit that has completed successfully.
    pub async fn migration_history(&self) -> Result<Vec<String>, sqlx::Error> {
        let history = self.get(KEY_MIGRATION_HISTORY).await?;
        Ok(history
            .and_then(|v| serde_json::from_value(v).ok())
            .unwrap_or_default())
    }

    /// Record a completed migration unit.
    pub async fn append_migration(&self, version: &str) -> Result<(), sqlx::Error> {
        let mut history = self.migration_history().await?;
        if !history.iter().any(|v| v == version) {
            history.push(version.to_string());
            self.set(KEY_MIGRATION_HISTORY, &json!(history)).await?;
        }
        Ok(())
    }

    /// Best-effort guard against concurrent batches: a persisted
    /// read-then-set boolean, not a hard mutual-exclusion primitive.
    pub async fn migration_busy(&self) -> Result<bool, sqlx::Error> {
        Ok(self
            .get(KEY_MIGRATION_BUSY)
            .await?
            .and_then(|v| v.as_bool())
            .unwrap_or(false))
    }

    pub async fn set_migration_busy(&self, busy: bool) -> Result<(), sqlx::Error> {
        self.set(KEY_MIGRATION_BUSY, &json!(busy)).await
    }
}
