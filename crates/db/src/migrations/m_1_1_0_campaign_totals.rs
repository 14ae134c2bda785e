//! 1.1.0: aggregate donation totals on campaigns.

use async_trait::async_trait;
use sqlx::PgPool;

use super::Migration;

/// Adds `campaigns.total_donated` and backfills it from reconciled paid
/// transactions. The backfill recomputes from source data, so a retried
/// run converges to the same totals instead of double-counting.
pub struct CampaignTotals;

#[async_trait]
impl Migration for CampaignTotals {
    fn version(&self) -> &'static str {
        "1.1.0"
    }

    fn description(&self) -> &'static str {
        "add and backfill campaign aggregate totals"
    }

    async fn up(&self, pool: &PgPool) -> anyhow::Result<()> {
        sqlx::query(
            "ALTER TABLE campaigns
             ADD COLUMN IF NOT EXISTS total_donated DOUBLE PRECISION NOT NULL DEFAULT 0",
        )
        .execute(pool)
        .await?;

        sqlx::query(
            "UPDATE campaigns c
             SET total_donated = sums.total
             FROM (
                 SELECT campaign_id, SUM(value) AS total
                 FROM transactions
                 WHERE status = 'paid' AND campaign_id IS NOT NULL
                 GROUP BY campaign_id
             ) sums
             WHERE c.id = sums.campaign_id",
        )
        .execute(pool)
        .await?;

        Ok(())
    }
}
