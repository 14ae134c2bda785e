//! Transaction entity model and DTOs.

use std::sync::LazyLock;

use obol_core::schema::{ColumnDef, ColumnType, EntitySchema};
use obol_core::status::{SequenceType, TransactionStatus, VendorMode};
use obol_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::entity::Entity;

/// A transaction row from the `transactions` table.
///
/// Created in `open` status at payment-initiation time; the vendor payment
/// id and checkout URL are written synchronously from the provider's
/// creation response, everything else is written by reconciliation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub id: DbId,
    pub value: f64,
    pub currency: String,
    pub status: TransactionStatus,
    pub method: Option<String>,
    pub mode: VendorMode,
    pub sequence_type: SequenceType,
    pub donor_id: Option<DbId>,
    pub campaign_id: Option<DbId>,
    pub subscription_id: Option<DbId>,
    pub vendor: String,
    pub vendor_payment_id: Option<String>,
    pub invoice_number: Option<i64>,
    pub checkout_url: Option<String>,
    /// Structured list of `{amount, date}` refund entries.
    pub refunds: Option<serde_json::Value>,
    pub message: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

static SCHEMA: LazyLock<EntitySchema> = LazyLock::new(|| {
    EntitySchema::new(vec![
        ("id", ColumnDef::required(ColumnType::Integer)),
        ("value", ColumnDef::required(ColumnType::Float)),
        ("currency", ColumnDef::with_default(ColumnType::String, json!("EUR"))),
        ("status", ColumnDef::with_default(ColumnType::String, json!("open"))),
        ("method", ColumnDef::nullable(ColumnType::String)),
        ("mode", ColumnDef::with_default(ColumnType::String, json!("test"))),
        ("sequence_type", ColumnDef::with_default(ColumnType::String, json!("oneoff"))),
        ("donor_id", ColumnDef::nullable(ColumnType::Integer)),
        ("campaign_id", ColumnDef::nullable(ColumnType::Integer)),
        ("subscription_id", ColumnDef::nullable(ColumnType::Integer)),
        ("vendor", ColumnDef::with_default(ColumnType::String, json!("mollie"))),
        ("vendor_payment_id", ColumnDef::nullable(ColumnType::String)),
        ("invoice_number", ColumnDef::nullable(ColumnType::Integer)),
        ("checkout_url", ColumnDef::nullable(ColumnType::Url)),
        ("refunds", ColumnDef::nullable(ColumnType::Json)),
        ("message", ColumnDef::nullable(ColumnType::String)),
    ])
});

impl Entity for Transaction {
    const TABLE: &'static str = "transactions";
    const ENTITY: &'static str = "Transaction";

    fn schema() -> &'static EntitySchema {
        &SCHEMA
    }

    fn id(&self) -> DbId {
        self.id
    }
}

/// DTO for creating a new transaction at payment-initiation time.
///
/// No vendor payment id yet: that arrives with the provider's response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewTransaction {
    pub value: f64,
    pub currency: String,
    pub mode: VendorMode,
    pub sequence_type: SequenceType,
    pub donor_id: Option<DbId>,
    pub campaign_id: Option<DbId>,
    pub message: Option<String>,
}

/// A single refund entry inside the transaction's refund payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RefundEntry {
    pub amount: f64,
    pub date: String,
}
