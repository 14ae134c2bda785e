//! Donor entity model and DTOs.

use std::sync::LazyLock;

use obol_core::schema::{ColumnDef, ColumnType, EntitySchema};
use obol_core::status::VendorMode;
use obol_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::entity::Entity;

/// A donor row from the `donors` table.
///
/// Donors are unique per `(email, mode)` so sandbox donations never mix
/// with live ones.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Donor {
    pub id: DbId,
    pub email: String,
    pub mode: VendorMode,
    pub name: Option<String>,
    pub business_name: Option<String>,
    pub street: Option<String>,
    pub postcode: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
    /// Vendor-assigned customer id, set once the vendor knows this donor.
    pub customer_id: Option<String>,
    /// Running total of reconciled paid transactions.
    pub total_donated: f64,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

static SCHEMA: LazyLock<EntitySchema> = LazyLock::new(|| {
    EntitySchema::new(vec![
        ("id", ColumnDef::required(ColumnType::Integer)),
        ("email", ColumnDef::required(ColumnType::Email)),
        ("mode", ColumnDef::with_default(ColumnType::String, json!("test"))),
        ("name", ColumnDef::nullable(ColumnType::String)),
        ("business_name", ColumnDef::nullable(ColumnType::String)),
        ("street", ColumnDef::nullable(ColumnType::String)),
        ("postcode", ColumnDef::nullable(ColumnType::String)),
        ("city", ColumnDef::nullable(ColumnType::String)),
        ("country", ColumnDef::nullable(ColumnType::String)),
        ("customer_id", ColumnDef::nullable(ColumnType::String)),
        ("total_donated", ColumnDef::with_default(ColumnType::Float, json!(0.0))),
    ])
});

impl Entity for Donor {
    const TABLE: &'static str = "donors";
    const ENTITY: &'static str = "Donor";

    fn schema() -> &'static EntitySchema {
        &SCHEMA
    }

    fn id(&self) -> DbId {
        self.id
    }
}

/// DTO for creating a new donor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewDonor {
    pub email: String,
    pub mode: VendorMode,
    pub name: Option<String>,
    pub business_name: Option<String>,
    pub street: Option<String>,
    pub postcode: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
    pub customer_id: Option<String>,
}

impl NewDonor {
    /// Minimal donor created lazily at payment time.
    pub fn from_payment(email: &str, name: Option<&str>, mode: VendorMode) -> Self {
        Self {
            email: email.to_string(),
            mode,
            name: name.map(str::to_owned),
            business_name: None,
            street: None,
            postcode: None,
            city: None,
            country: None,
            customer_id: None,
        }
    }
}
