//! Campaign entity model and DTOs.

use std::sync::LazyLock;

use obol_core::campaign::{AmountType, DonationType, ReturnUrlPolicy};
use obol_core::schema::{ColumnDef, ColumnType, EntitySchema};
use obol_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::entity::Entity;

/// A campaign row from the `campaigns` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Campaign {
    pub id: DbId,
    pub title: String,
    pub currency: String,
    pub goal: Option<f64>,
    pub show_goal: bool,
    pub amount_type: AmountType,
    pub fixed_amounts: Option<Vec<f64>>,
    pub minimum_donation: f64,
    pub maximum_donation: Option<f64>,
    pub donation_type: DonationType,
    pub theme_color: String,
    pub welcome_title: Option<String>,
    pub welcome_text: Option<String>,
    pub show_return_message: bool,
    pub use_custom_return_url: bool,
    pub custom_return_url: Option<String>,
    /// Aggregate of reconciled paid transactions.
    pub total_donated: f64,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Campaign {
    pub fn return_policy(&self) -> ReturnUrlPolicy {
        ReturnUrlPolicy {
            show_return_message: self.show_return_message,
            use_custom_return_url: self.use_custom_return_url,
            custom_return_url: self.custom_return_url.clone(),
        }
    }
}

static SCHEMA: LazyLock<EntitySchema> = LazyLock::new(|| {
    EntitySchema::new(vec![
        ("id", ColumnDef::required(ColumnType::Integer)),
        ("title", ColumnDef::required(ColumnType::String)),
        ("currency", ColumnDef::with_default(ColumnType::String, json!("EUR"))),
        ("goal", ColumnDef::nullable(ColumnType::Float)),
        ("show_goal", ColumnDef::with_default(ColumnType::Boolean, json!(false))),
        ("amount_type", ColumnDef::with_default(ColumnType::String, json!("open"))),
        ("fixed_amounts", ColumnDef::nullable(ColumnType::Json)),
        ("minimum_donation", ColumnDef::with_default(ColumnType::Float, json!(1.0))),
        ("maximum_donation", ColumnDef::nullable(ColumnType::Float)),
        ("donation_type", ColumnDef::with_default(ColumnType::String, json!("oneoff"))),
        ("theme_color", ColumnDef::with_default(ColumnType::String, json!("#ff9f1c"))),
        ("welcome_title", ColumnDef::nullable(ColumnType::String)),
        ("welcome_text", ColumnDef::nullable(ColumnType::String)),
        ("show_return_message", ColumnDef::with_default(ColumnType::Boolean, json!(false))),
        ("use_custom_return_url", ColumnDef::with_default(ColumnType::Boolean, json!(false))),
        ("custom_return_url", ColumnDef::nullable(ColumnType::Url)),
        ("total_donated", ColumnDef::with_default(ColumnType::Float, json!(0.0))),
    ])
});

impl Entity for Campaign {
    const TABLE: &'static str = "campaigns";
    const ENTITY: &'static str = "Campaign";

    fn schema() -> &'static EntitySchema {
        &SCHEMA
    }

    fn id(&self) -> DbId {
        self.id
    }
}

/// DTO for creating a new campaign. Omitted fields fall back to column
/// defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewCampaign {
    pub title: String,
    pub currency: Option<String>,
    pub goal: Option<f64>,
    pub show_goal: Option<bool>,
    pub amount_type: Option<AmountType>,
    pub fixed_amounts: Option<Vec<f64>>,
    pub minimum_donation: Option<f64>,
    pub maximum_donation: Option<f64>,
    pub donation_type: Option<DonationType>,
    pub theme_color: Option<String>,
    pub welcome_title: Option<String>,
    pub welcome_text: Option<String>,
    pub show_return_message: Option<bool>,
    pub use_custom_return_url: Option<bool>,
    pub custom_return_url: Option<String>,
}

/// DTO for updating a campaign. Only set fields are applied.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateCampaign {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub goal: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub show_goal: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount_type: Option<AmountType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fixed_amounts: Option<Vec<f64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minimum_donation: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maximum_donation: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub donation_type: Option<DonationType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub theme_color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub welcome_title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub welcome_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub show_return_message: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub use_custom_return_url: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_return_url: Option<String>,
}
