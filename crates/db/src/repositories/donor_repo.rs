//! Repository for the `donors` table.

use obol_core::status::VendorMode;
use obol_core::types::DbId;
use serde_json::json;
use sqlx::PgPool;

use crate::entity::to_row_map;
use crate::models::donor::{Donor, NewDonor};
use crate::repository::Repository;

/// CRUD plus the mode-scoped lookups the payment flow needs.
#[derive(Clone)]
pub struct DonorRepo {
    repo: Repository<Donor>,
}

impl DonorRepo {
    pub fn new(pool: PgPool) -> Self {
        Self {
            repo: Repository::new(pool),
        }
    }

    pub fn repo(&self) -> &Repository<Donor> {
        &self.repo
    }

    /// Insert a new donor, returning the created row.
    ///
    /// Fails on the `(email, mode)` unique constraint when the donor
    /// already exists.
    pub async fn create(&self, input: &NewDonor) -> Result<Donor, sqlx::Error> {
        let row = to_row_map(input).map_err(|e| sqlx::Error::Decode(Box::new(e)))?;
        let id = self.repo.insert(&row).await?;
        self.repo.get(id).await?.ok_or(sqlx::Error::RowNotFound)
    }

    pub async fn get(&self, id: DbId) -> Result<Option<Donor>, sqlx::Error> {
        self.repo.get(id).await
    }

    /// The logical unique key: one donor per email per vendor mode.
    pub async fn find_by_email_and_mode(
        &self,
        email: &str,
        mode: VendorMode,
    ) -> Result<Option<Donor>, sqlx::Error> {
        let filters = to_row_map(&json!({ "email": email, "mode": mode }))
            .map_err(|e| sqlx::Error::Decode(Box::new(e)))?;
        self.repo.find_one(&filters).await
    }

    /// Reconciliation looks donors up by the vendor's customer id.
    pub async fn find_by_customer_id(
        &self,
        customer_id: &str,
    ) -> Result<Option<Donor>, sqlx::Error> {
        let filters = to_row_map(&json!({ "customer_id": customer_id }))
            .map_err(|e| sqlx::Error::Decode(Box::new(e)))?;
        self.repo.find_one(&filters).await
    }

    /// Persist the vendor-assigned customer id on the donor.
    pub async fn set_customer_id(
        &self,
        id: DbId,
        customer_id: &str,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE donors SET customer_id = $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(customer_id)
        .execute(self.repo.pool())
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Add a reconciled donation to the donor's running total.
    pub async fn increment_total(&self, id: DbId, amount: f64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE donors
             SET total_donated = total_donated + $2, updated_at = NOW()
             WHERE id = $1",
        )
        .bind(id)
        .bind(amount)
        .execute(self.repo.pool())
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
