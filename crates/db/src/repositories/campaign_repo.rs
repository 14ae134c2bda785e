//! Repository for the `campaigns` table.

use obol_core::types::DbId;
use sqlx::PgPool;

use crate::entity::to_row_map;
use crate::models::campaign::{Campaign, NewCampaign, UpdateCampaign};
use crate::repository::{Order, Repository};

/// CRUD plus aggregate maintenance for campaigns.
#[derive(Clone)]
pub struct CampaignRepo {
    repo: Repository<Campaign>,
}

impl CampaignRepo {
    pub fn new(pool: PgPool) -> Self {
        Self {
            repo: Repository::new(pool),
        }
    }

    /// The underlying generic repository.
    pub fn repo(&self) -> &Repository<Campaign> {
        &self.repo
    }

    /// Insert a new campaign, returning the created row.
    pub async fn create(&self, input: &NewCampaign) -> Result<Campaign, sqlx::Error> {
        let row = to_row_map(input).map_err(|e| sqlx::Error::Decode(Box::new(e)))?;
        let id = self.repo.insert(&row).await?;
        self.repo.get(id).await?.ok_or(sqlx::Error::RowNotFound)
    }

    pub async fn get(&self, id: DbId) -> Result<Option<Campaign>, sqlx::Error> {
        self.repo.get(id).await
    }

    /// List campaigns, most recently created first.
    pub async fn list(&self, limit: Option<i64>, offset: Option<i64>) -> Result<Vec<Campaign>, sqlx::Error> {
        self.repo
            .find_all(
                &Default::default(),
                Some(("created_at", Order::Desc)),
                limit,
                offset,
            )
            .await
    }

    /// Apply a partial update. Returns the updated row, or `None` when the
    /// campaign does not exist.
    pub async fn update(
        &self,
        id: DbId,
        input: &UpdateCampaign,
    ) -> Result<Option<Campaign>, sqlx::Error> {
        let changes = to_row_map(input).map_err(|e| sqlx::Error::Decode(Box::new(e)))?;
        if !self.repo.update(id, &changes).await? {
            return Ok(None);
        }
        self.repo.get(id).await
    }

    pub async fn delete(&self, id: DbId) -> Result<bool, sqlx::Error> {
        self.repo.delete(id).await
    }

    /// Add a reconciled donation to the campaign's aggregate total.
    pub async fn increment_total(&self, id: DbId, amount: f64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE campaigns
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
