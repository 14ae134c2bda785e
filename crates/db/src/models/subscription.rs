//! Subscription entity model and DTOs.

use std::sync::LazyLock;

use obol_core::schema::{ColumnDef, ColumnType, EntitySchema};
use obol_core::status::SubscriptionStatus;
use obol_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::entity::Entity;

/// A subscription row from the `subscriptions` table.
///
/// Created only when a `first`-sequence transaction is reconciled as paid.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subscription {
    pub id: DbId,
    pub value: f64,
    pub currency: String,
    /// Renewal interval, vendor syntax (e.g. `"1 month"`).
    pub frequency: String,
    /// Duration in years; `None` means indefinite.
    pub years: Option<i64>,
    pub status: SubscriptionStatus,
    pub transaction_id: Option<DbId>,
    pub donor_id: Option<DbId>,
    pub campaign_id: Option<DbId>,
    pub customer_id: Option<String>,
    /// Vendor-assigned subscription id.
    pub subscription_id: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

static SCHEMA: LazyLock<EntitySchema> = LazyLock::new(|| {
    EntitySchema::new(vec![
        ("id", ColumnDef::required(ColumnType::Integer)),
        ("value", ColumnDef::required(ColumnType::Float)),
        ("currency", ColumnDef::with_default(ColumnType::String, json!("EUR"))),
        ("frequency", ColumnDef::with_default(ColumnType::String, json!("1 month"))),
        ("years", ColumnDef::nullable(ColumnType::Integer)),
        ("status", ColumnDef::with_default(ColumnType::String, json!("active"))),
        ("transaction_id", ColumnDef::nullable(ColumnType::Integer)),
        ("donor_id", ColumnDef::nullable(ColumnType::Integer)),
        ("campaign_id", ColumnDef::nullable(ColumnType::Integer)),
        ("customer_id", ColumnDef::nullable(ColumnType::String)),
        ("subscription_id", ColumnDef::nullable(ColumnType::String)),
    ])
});

impl Entity for Subscription {
    const TABLE: &'static str = "subscriptions";
    const ENTITY: &'static str = "Subscription";

    fn schema() -> &'static EntitySchema {
        &SCHEMA
    }

    fn id(&self) -> DbId {
        self.id
    }
}

/// DTO for creating a subscription during reconciliation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewSubscription {
    pub value: f64,
    pub currency: String,
    pub frequency: String,
    pub years: Option<i64>,
    pub transaction_id: Option<DbId>,
    pub donor_id: Option<DbId>,
    pub campaign_id: Option<DbId>,
    pub customer_id: Option<String>,
    pub subscription_id: Option<String>,
}
