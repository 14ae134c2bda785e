//! 1.2.0: invoice numbers for paid transactions.

use async_trait::async_trait;
use sqlx::PgPool;

use super::Migration;

/// Adds `transactions.invoice_number` and assigns sequential numbers to
/// paid transactions that lack one. Numbering continues from the current
/// maximum, so a retried run never reassigns an existing number.
pub struct InvoiceNumbers;

#[async_trait]
impl Migration for InvoiceNumbers {
    fn version(&self) -> &'static str {
        "1.2.0"
    }

    fn description(&self) -> &'static str {
        "add and backfill transaction invoice numbers"
    }

    async fn up(&self, pool: &PgPool) -> anyhow::Result<()> {
        sqlx::query(
            "ALTER TABLE transactions ADD COLUMN IF NOT EXISTS invoice_number BIGINT",
        )
        .execute(pool)
        .await?;

        sqlx::query(
            "UPDATE transactions t
             SET invoice_number = numbered.n
             FROM (
                 SELECT id,
                        ROW_NUMBER() OVER (ORDER BY created_at, id)
                            + COALESCE((SELECT MAX(invoice_number) FROM transactions), 0) AS n
                 FROM transactions
                 WHERE status = 'paid' AND invoice_number IS NULL
             ) numbered
             WHERE t.id = numbered.id",
        )
        .execute(pool)
        .await?;

        Ok(())
    }
}
