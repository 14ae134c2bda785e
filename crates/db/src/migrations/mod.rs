//! Versioned, resumable schema migrations.
//!
//! Migration units are discovered from a static registry, ordered by
//! version, and executed in caller-controlled `{offset, batch_size}`
//! slices so a long upgrade can be driven incrementally by repeated
//! external calls. Progress (applied versions, stamped schema version,
//! busy flag) lives in the [`SettingsRepo`] so a batch can resume after a
//! partial failure.
//!
//! Every unit must be idempotent at statement level (`IF NOT EXISTS`,
//! guarded backfills): the busy flag is a best-effort persisted guard, and
//! a retried batch re-runs any unit whose version is not yet in history.

mod m_1_0_0_core_tables;
mod m_1_1_0_campaign_totals;
mod m_1_2_0_invoice_numbers;

use async_trait::async_trait;
use semver::Version;
use sqlx::PgPool;

use crate::settings::SettingsRepo;

/// Schema version the current code expects.
pub const TARGET_SCHEMA_VERSION: &str = "1.2.0";

// ---------------------------------------------------------------------------
// Migration trait & registry
// ---------------------------------------------------------------------------

/// A single versioned, idempotent schema/data change.
#[async_trait]
pub trait Migration: Send + Sync {
    /// Semantic version this unit belongs to.
    fn version(&self) -> &'static str;

    fn description(&self) -> &'static str;

    async fn up(&self, pool: &PgPool) -> anyhow::Result<()>;
}

/// All known migration units, ascending by version.
pub fn registry() -> Vec<Box<dyn Migration>> {
    vec![
        Box::new(m_1_0_0_core_tables::CoreTables),
        Box::new(m_1_1_0_campaign_totals::CampaignTotals),
        Box::new(m_1_2_0_invoice_numbers::InvoiceNumbers),
    ]
}

// ---------------------------------------------------------------------------
// Errors & outcomes
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum MigrationError {
    /// A unit failed; its version is not recorded, so a retry re-runs it.
    #[error("migration {version} failed: {source}")]
    Failed {
        version: String,
        #[source]
        source: anyhow::Error,
    },

    /// Another batch holds the busy flag.
    #[error("a migration batch is already running")]
    Busy,

    #[error("invalid batch parameters: {0}")]
    InvalidBatch(String),

    #[error("invalid migration version '{0}'")]
    BadVersion(String),

    #[error(transparent)]
    Storage(#[from] sqlx::Error),
}

/// Result of one batch call.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct BatchOutcome {
    /// Whether the whole pending set has now been applied.
    pub completed: bool,
    /// Offset the caller should pass for the next batch.
    pub next_offset: usize,
}

/// Snapshot for the admin surface: lets callers suppress the "update
/// available" prompt while a batch is running.
#[derive(Debug, Clone, serde::Serialize)]
pub struct MigrationStatus {
    pub current_version: String,
    pub target_version: String,
    pub pending: usize,
    pub busy: bool,
}

// ---------------------------------------------------------------------------
// Runner
// ---------------------------------------------------------------------------

/// Executes registered migration units in resumable batches.
pub struct MigrationRunner {
    pool: PgPool,
    settings: SettingsRepo,
    migrations: Vec<Box<dyn Migration>>,
    target: Version,
}

impl MigrationRunner {
    /// Runner over the built-in registry targeting
    /// [`TARGET_SCHEMA_VERSION`].
    pub fn new(pool: PgPool) -> Self {
        Self::with_migrations(pool, registry(), TARGET_SCHEMA_VERSION)
            .expect("built-in registry versions must parse")
    }

    /// Runner over an explicit unit list; the seam the tests use.
    pub fn with_migrations(
        pool: PgPool,
        mut migrations: Vec<Box<dyn Migration>>,
        target: &str,
    ) -> Result<Self, MigrationError> {
        let target = parse_version(target)?;
        // Order ascending once; batch offsets index this stable list.
        let mut keyed: Vec<(Version, Box<dyn Migration>)> = Vec::with_capacity(migrations.len());
        for migration in migrations.drain(..) {
            keyed.push((parse_version(migration.version())?, migration));
        }
        keyed.sort_by(|(a, _), (b, _)| a.cmp(b));
        migrations = keyed.into_iter().map(|(_, m)| m).collect();

        let settings = SettingsRepo::new(pool.clone());
        Ok(Self {
            pool,
            settings,
            migrations,
            target,
        })
    }

    /// Current/target versions, pending count, and the busy flag.
    pub async fn status(&self) -> Result<MigrationStatus, MigrationError> {
        self.settings.ensure_table().await?;
        let current = self.current_version().await?;
        let pending = self.pending(&current).len();
        let busy = self.settings.migration_busy().await?;
        Ok(MigrationStatus {
            current_version: current.to_string(),
            target_version: self.target.to_string(),
            pending,
            busy,
        })
    }

    /// Execute one `{offset, batch_size}` slice of the pending unit list.
    ///
    /// Skips units already in history, stops on the first failure without
    /// advancing history for the failed version, and stamps the target
    /// schema version once the final batch completes.
    pub async fn run_batch(
        &self,
        offset: usize,
        batch_size: usize,
    ) -> Result<BatchOutcome, MigrationError> {
        if batch_size == 0 {
            return Err(MigrationError::InvalidBatch(
                "batch_size must be at least 1".into(),
            ));
        }

        self.settings.ensure_table().await?;
        if self.settings.migration_busy().await? {
            return Err(MigrationError::Busy);
        }
        self.settings.set_migration_busy(true).await?;

        let outcome = self.run_batch_inner(offset, batch_size).await;

        // Clear the flag on success and failure alike; a stuck flag would
        // otherwise block every future batch.
        if let Err(e) = self.settings.set_migration_busy(false).await {
            tracing::error!(error = %e, "Failed to clear migration busy flag");
        }
        outcome
    }

    async fn run_batch_inner(
        &self,
        offset: usize,
        batch_size: usize,
    ) -> Result<BatchOutcome, MigrationError> {
        let current = self.current_version().await?;
        let pending = self.pending(&current);
        let total = pending.len();

        let end = usize::min(offset.saturating_add(batch_size), total);
        let history = self.settings.migration_history().await?;

        for migration in pending.iter().take(end).skip(offset) {
            let version = migration.version();
            if history.iter().any(|v| v == version) {
                tracing::info!(version, "Migration already applied, skipping");
                continue;
            }

            tracing::info!(version, description = migration.description(), "Running migration");
            migration
                .up(&self.pool)
                .await
                .map_err(|source| MigrationError::Failed {
                    version: version.to_string(),
                    source,
                })?;
            self.settings.append_migration(version).await?;
        }

        let next_offset = offset.saturating_add(batch_size);
        let completed = next_offset >= total;
        if completed {
            self.settings
                .set_schema_version(&self.target.to_string())
                .await?;
            tracing::info!(version = %self.target, "Schema version stamped");
        }

        Ok(BatchOutcome {
            completed,
            next_offset,
        })
    }

    /// Units strictly newer than the stored version, up to the target.
    fn pending(&self, current: &Version) -> Vec<&dyn Migration> {
        self.migrations
            .iter()
            .filter(|m| {
                // Registry versions were validated in the constructor.
                let version = Version::parse(m.version()).expect("validated version");
                version > *current && version <= self.target
            })
            .map(Box::as_ref)
            .collect()
    }

    async fn current_version(&self) -> Result<Version, MigrationError> {
        match self.settings.schema_version().await? {
            Some(stored) => parse_version(&stored),
            None => Ok(Version::new(0, 0, 0)),
        }
    }
}

fn parse_version(raw: &str) -> Result<Version, MigrationError> {
    Version::parse(raw).map_err(|_| MigrationError::BadVersion(raw.to_string()))
}
