//! Repository for the `transactions` table.

use obol_core::status::TransactionStatus;
use obol_core::types::DbId;
use serde_json::json;
use sqlx::PgPool;

use crate::entity::to_row_map;
use crate::models::transaction::{NewTransaction, RefundEntry, Transaction};
use crate::repository::{Order, Repository};

/// CRUD plus the reconciliation-facing operations for transactions.
#[derive(Clone)]
pub struct TransactionRepo {
    repo: Repository<Transaction>,
}

impl TransactionRepo {
    pub fn new(pool: PgPool) -> Self {
        Self {
            repo: Repository::new(pool),
        }
    }

    pub fn repo(&self) -> &Repository<Transaction> {
        &self.repo
    }

    /// Insert a new transaction in `open` status, returning the created row.
    pub async fn create(&self, input: &NewTransaction) -> Result<Transaction, sqlx::Error> {
        let row = to_row_map(input).map_err(|e| sqlx::Error::Decode(Box::new(e)))?;
        let id = self.repo.insert(&row).await?;
        self.repo.get(id).await?.ok_or(sqlx::Error::RowNotFound)
    }

    pub async fn get(&self, id: DbId) -> Result<Option<Transaction>, sqlx::Error> {
        self.repo.get(id).await
    }

    /// The webhook's only lookup: by the vendor-assigned payment id.
    pub async fn find_by_vendor_payment_id(
        &self,
        vendor_payment_id: &str,
    ) -> Result<Option<Transaction>, sqlx::Error> {
        let filters = to_row_map(&json!({ "vendor_payment_id": vendor_payment_id }))
            .map_err(|e| sqlx::Error::Decode(Box::new(e)))?;
        self.repo.find_one(&filters).await
    }

    /// List transactions, most recent first, with optional equality filters.
    pub async fn list(
        &self,
        filters: &obol_core::types::RowMap,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> Result<Vec<Transaction>, sqlx::Error> {
        self.repo
            .find_all(filters, Some(("created_at", Order::Desc)), limit, offset)
            .await
    }

    /// Write the vendor payment id and checkout URL from the provider's
    /// synchronous creation response.
    pub async fn set_vendor_payment(
        &self,
        id: DbId,
        vendor_payment_id: &str,
        checkout_url: Option<&str>,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE transactions
             SET vendor_payment_id = $2, checkout_url = $3, updated_at = NOW()
             WHERE id = $1",
        )
        .bind(id)
        .bind(vendor_payment_id)
        .bind(checkout_url)
        .execute(self.repo.pool())
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Apply an authoritative status (and the settled payment method) to a
    /// transaction.
    pub async fn apply_status(
        &self,
        id: DbId,
        status: TransactionStatus,
        method: Option<&str>,
    ) -> Result<bool, sqlx::Error> {
        let mut changes = to_row_map(&json!({ "status": status }))
            .map_err(|e| sqlx::Error::Decode(Box::new(e)))?;
        if let Some(method) = method {
            changes.insert("method".into(), json!(method));
        }
        self.repo.update(id, &changes).await
    }

    /// Link the subscription spawned by a paid first-sequence transaction.
    pub async fn link_subscription(
        &self,
        id: DbId,
        subscription_id: DbId,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE transactions SET subscription_id = $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(subscription_id)
        .execute(self.repo.pool())
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Replace the refund payload without touching the (terminal) status.
    pub async fn set_refunds(
        &self,
        id: DbId,
        refunds: &[RefundEntry],
    ) -> Result<bool, sqlx::Error> {
        let changes = to_row_map(&json!({ "refunds": refunds }))
            .map_err(|e| sqlx::Error::Decode(Box::new(e)))?;
        self.repo.update(id, &changes).await
    }
}
