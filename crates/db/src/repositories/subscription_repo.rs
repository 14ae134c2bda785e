//! Repository for the `subscriptions` table.

use obol_core::status::SubscriptionStatus;
use obol_core::types::DbId;
use serde_json::json;
use sqlx::PgPool;

use crate::entity::to_row_map;
use crate::models::subscription::{NewSubscription, Subscription};
use crate::repository::Repository;

#[derive(Clone)]
pub struct SubscriptionRepo {
    repo: Repository<Subscription>,
}

impl SubscriptionRepo {
    pub fn new(pool: PgPool) -> Self {
        Self {
            repo: Repository::new(pool),
        }
    }

    pub fn repo(&self) -> &Repository<Subscription> {
        &self.repo
    }

    /// Insert a new active subscription, returning the created row.
    pub async fn create(&self, input: &NewSubscription) -> Result<Subscription, sqlx::Error> {
        let row = to_row_map(input).map_err(|e| sqlx::Error::Decode(Box::new(e)))?;
        let id = self.repo.insert(&row).await?;
        self.repo.get(id).await?.ok_or(sqlx::Error::RowNotFound)
    }

    pub async fn get(&self, id: DbId) -> Result<Option<Subscription>, sqlx::Error> {
        self.repo.get(id).await
    }

    /// Subscriptions created from a given first-sequence transaction.
    pub async fn find_by_transaction_id(
        &self,
        transaction_id: DbId,
    ) -> Result<Option<Subscription>, sqlx::Error> {
        let filters = to_row_map(&json!({ "transaction_id": transaction_id }))
            .map_err(|e| sqlx::Error::Decode(Box::new(e)))?;
        self.repo.find_one(&filters).await
    }

    /// Mark a subscription canceled. Returns whether a row changed.
    pub async fn mark_canceled(&self, id: DbId) -> Result<bool, sqlx::Error> {
        let changes = to_row_map(&json!({ "status": SubscriptionStatus::Canceled }))
            .map_err(|e| sqlx::Error::Decode(Box::new(e)))?;
        self.repo.update(id, &changes).await
    }
}
