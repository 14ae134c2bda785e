//! Vendor-agnostic payment provider contract.

use async_trait::async_trait;
use obol_core::status::{SequenceType, TransactionStatus, VendorMode};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors from the payment vendor layer.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    /// The HTTP request itself failed (network, DNS, TLS, timeout).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The vendor returned a non-2xx status code.
    #[error("vendor API error ({status}): {detail}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Error detail extracted from the response body.
        detail: String,
    },

    /// The vendor's response did not have the expected shape.
    #[error("unexpected vendor response: {0}")]
    Response(String),

    /// The vendor reported a payment status outside the known set.
    #[error("unrecognized vendor payment status '{0}'")]
    UnknownStatus(String),
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

/// Everything the vendor needs to create a payment.
#[derive(Debug, Clone, Serialize)]
pub struct PaymentRequest {
    pub amount: f64,
    pub currency: String,
    pub description: String,
    /// Where the vendor sends the donor after checkout.
    pub redirect_url: String,
    /// Where the vendor posts status notifications, when reachable.
    pub webhook_url: Option<String>,
    /// Vendor customer id; required for `first`-sequence payments.
    pub customer_id: Option<String>,
    pub sequence_type: SequenceType,
    /// Echoed back by the vendor on status fetches.
    pub metadata: serde_json::Value,
}

/// Everything the vendor needs to create a customer.
#[derive(Debug, Clone, Serialize)]
pub struct CustomerRequest {
    pub email: String,
    pub name: Option<String>,
}

// ---------------------------------------------------------------------------
// Responses
// ---------------------------------------------------------------------------

/// A vendor-side customer.
#[derive(Debug, Clone, Deserialize)]
pub struct VendorCustomer {
    pub id: String,
}

/// One refund the vendor reports against a payment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VendorRefund {
    pub amount: f64,
    pub date: String,
}

/// The vendor's authoritative view of one payment.
#[derive(Debug, Clone)]
pub struct VendorPayment {
    pub id: String,
    /// Raw vendor status string; map via [`VendorPayment::local_status`].
    pub status: String,
    pub mode: Option<VendorMode>,
    pub method: Option<String>,
    pub checkout_url: Option<String>,
    pub customer_id: Option<String>,
    /// Vendor subscription id, present once a recurring mandate exists.
    pub subscription_id: Option<String>,
    pub metadata: serde_json::Value,
    pub refunds: Vec<VendorRefund>,
}

impl VendorPayment {
    /// Map the vendor status onto the closed local enum.
    ///
    /// Pre-settlement states all map to `open`; a status outside the known
    /// set is an error, never silently treated as a transition.
    pub fn local_status(&self) -> Result<TransactionStatus, ProviderError> {
        match self.status.as_str() {
            "open" | "pending" | "authorized" => Ok(TransactionStatus::Open),
            "paid" => Ok(TransactionStatus::Paid),
            "canceled" => Ok(TransactionStatus::Canceled),
            "expired" => Ok(TransactionStatus::Expired),
            "failed" => Ok(TransactionStatus::Failed),
            other => Err(ProviderError::UnknownStatus(other.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// Contract
// ---------------------------------------------------------------------------

/// Vendor-agnostic payment operations.
///
/// All calls are synchronous HTTP requests with the client's timeout; a
/// timeout or error surfaces as a [`ProviderError`], never a silent hang.
#[async_trait]
pub trait PaymentProvider: Send + Sync {
    /// Create a payment; the response carries the vendor payment id and
    /// the checkout URL to redirect the donor to.
    async fn create_payment(&self, request: &PaymentRequest)
        -> Result<VendorPayment, ProviderError>;

    /// Fetch the authoritative current state of a payment.
    async fn get_payment(&self, vendor_payment_id: &str) -> Result<VendorPayment, ProviderError>;

    /// Create a vendor customer for a donor.
    async fn create_customer(
        &self,
        request: &CustomerRequest,
    ) -> Result<VendorCustomer, ProviderError>;

    /// Cancel a running subscription at the vendor.
    async fn cancel_subscription(
        &self,
        customer_id: &str,
        subscription_id: &str,
    ) -> Result<(), ProviderError>;
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
