//! REST client for the Mollie v2 API.
//!
//! Wraps payment creation, payment status fetches, customer creation, and
//! subscription cancellation using [`reqwest`]. Amounts go over the wire
//! as `{currency, value}` with the value formatted to two decimals.

use async_trait::async_trait;
use obol_core::status::VendorMode;
use serde::Deserialize;
use serde_json::json;

use crate::provider::{
    CustomerRequest, PaymentProvider, PaymentRequest, ProviderError, VendorCustomer,
    VendorPayment, VendorRefund,
};

/// Default Mollie API base URL.
const DEFAULT_API_URL: &str = "https://api.mollie.com";

/// HTTP client for the Mollie API.
pub struct MollieClient {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
}

impl MollieClient {
    /// Create a client for the given API key against the public API.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_base_url(api_key, DEFAULT_API_URL)
    }

    /// Create a client against a specific base URL (sandboxes, tests).
    pub fn with_base_url(api_key: impl Into<String>, api_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_url: api_url.into(),
            api_key: api_key.into(),
        }
    }

    /// Vendor mode implied by the API key prefix (`live_` vs `test_`).
    pub fn mode(&self) -> VendorMode {
        if self.api_key.starts_with("live_") {
            VendorMode::Live
        } else {
            VendorMode::Test
        }
    }

    // ---- private helpers ----

    fn auth(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        builder.bearer_auth(&self.api_key)
    }

    /// Ensure a success status, otherwise capture the body as an API error.
    ///
    /// Mollie error bodies are `{status, title, detail}`; the detail is
    /// extracted when present, the raw text kept otherwise.
    async fn ensure_success(
        response: reqwest::Response,
    ) -> Result<reqwest::Response, ProviderError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "<unreadable body>".to_string());
        let detail = serde_json::from_str::<MollieErrorBody>(&body)
            .map(|e| e.detail)
            .unwrap_or(body);
        Err(ProviderError::Api {
            status: status.as_u16(),
            detail,
        })
    }

    async fn parse_payment(response: reqwest::Response) -> Result<VendorPayment, ProviderError> {
        let response = Self::ensure_success(response).await?;
        let payment: MolliePayment = response.json().await?;
        payment.try_into()
    }
}

#[async_trait]
impl PaymentProvider for MollieClient {
    async fn create_payment(
        &self,
        request: &PaymentRequest,
    ) -> Result<VendorPayment, ProviderError> {
        let mut body = json!({
            "amount": {
                "currency": request.currency,
                "value": format_amount(request.amount),
            },
            "description": request.description,
            "redirectUrl": request.redirect_url,
            "sequenceType": request.sequence_type.as_str(),
            "metadata": request.metadata,
        });
        if let Some(webhook_url) = &request.webhook_url {
            body["webhookUrl"] = json!(webhook_url);
        }
        if let Some(customer_id) = &request.customer_id {
            body["customerId"] = json!(customer_id);
        }

        let response = self
            .auth(self.client.post(format!("{}/v2/payments", self.api_url)))
            .json(&body)
            .send()
            .await?;

        let payment = Self::parse_payment(response).await?;
        tracing::debug!(
            vendor_payment_id = %payment.id,
            sequence_type = %request.sequence_type,
            "Vendor payment created"
        );
        Ok(payment)
    }

    async fn get_payment(&self, vendor_payment_id: &str) -> Result<VendorPayment, ProviderError> {
        // Embed refunds so reconciliation sees them in one fetch.
        let response = self
            .auth(self.client.get(format!(
                "{}/v2/payments/{}?embed=refunds",
                self.api_url, vendor_payment_id
            )))
            .send()
            .await?;

        Self::parse_payment(response).await
    }

    async fn create_customer(
        &self,
        request: &CustomerRequest,
    ) -> Result<VendorCustomer, ProviderError> {
        let mut body = json!({ "email": request.email });
        if let Some(name) = &request.name {
            body["name"] = json!(name);
        }

        let response = self
            .auth(self.client.post(format!("{}/v2/customers", self.api_url)))
            .json(&body)
            .send()
            .await?;

        let response = Self::ensure_success(response).await?;
        Ok(response.json::<VendorCustomer>().await?)
    }

    async fn cancel_subscription(
        &self,
        customer_id: &str,
        subscription_id: &str,
    ) -> Result<(), ProviderError> {
        let response = self
            .auth(self.client.delete(format!(
                "{}/v2/customers/{}/subscriptions/{}",
                self.api_url, customer_id, subscription_id
            )))
            .send()
            .await?;

        Self::ensure_success(response).await?;
        Ok(())
    }
}

/// Format an amount the way the vendor expects: two decimals, dot
/// separator.
pub fn format_amount(amount: f64) -> String {
    format!("{amount:.2}")
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct MollieErrorBody {
    detail: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MolliePayment {
    id: String,
    status: String,
    mode: Option<String>,
    method: Option<String>,
    customer_id: Option<String>,
    subscription_id: Option<String>,
    #[serde(default)]
    metadata: serde_json::Value,
    #[serde(rename = "_links")]
    links: Option<MollieLinks>,
    #[serde(rename = "_embedded")]
    embedded: Option<MollieEmbedded>,
}

#[derive(Debug, Deserialize)]
struct MollieLinks {
    checkout: Option<MollieHref>,
}

#[derive(Debug, Deserialize)]
struct MollieHref {
    href: String,
}

#[derive(Debug, Deserialize)]
struct MollieEmbedded {
    refunds: Option<Vec<MollieRefund>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MollieRefund {
    amount: MollieAmount,
    created_at: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MollieAmount {
    value: String,
}

impl TryFrom<MolliePayment> for VendorPayment {
    type Error = ProviderError;

    fn try_from(payment: MolliePayment) -> Result<Self, Self::Error> {
        let mode = match payment.mode.as_deref() {
            Some("live") => Some(VendorMode::Live),
            Some("test") => Some(VendorMode::Test),
            Some(other) => {
                return Err(ProviderError::Response(format!(
                    "unknown payment mode '{other}'"
                )))
            }
            None => None,
        };

        let checkout_url = payment
            .links
            .and_then(|links| links.checkout)
            .map(|link| link.href);

        let refunds = payment
            .embedded
            .and_then(|embedded| embedded.refunds)
            .unwrap_or_default()
            .into_iter()
            .filter_map(|refund| {
                let amount = refund.amount.value.parse::<f64>().ok()?;
                Some(VendorRefund {
                    amount,
                    date: refund.created_at.unwrap_or_default(),
                })
            })
            .collect();

        Ok(VendorPayment {
            id: payment.id,
            status: payment.status,
            mode,
            method: payment.method,
            checkout_url,
            customer_id: payment.customer_id,
            subscription_id: payment.subscription_id,
            metadata: payment.metadata,
            refunds,
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn amounts_are_formatted_with_two_decimals() {
        assert_eq!(format_amount(10.0), "10.00");
        assert_eq!(format_amount(10.5), "10.50");
        assert_eq!(format_amount(2.375), "2.38");
    }

    #[test]
    fn payment_json_deserializes_into_vendor_payment() {
        let raw = serde_json::json!({
            "id": "tr_abc123",
            "status": "paid",
            "mode": "test",
            "method": "ideal",
            "customerId": "cst_9",
            "subscriptionId": "sub_4",
            "metadata": { "transaction_id": 17 },
            "_links": { "checkout": { "href": "https://pay.example/abc" } },
            "_embedded": {
                "refunds": [
                    { "amount": { "currency": "EUR", "value": "2.50" },
                      "createdAt": "2026-02-01T10:00:00+00:00" }
                ]
            }
        });

        let payment: MolliePayment = serde_json::from_value(raw).unwrap();
        let payment: VendorPayment = payment.try_into().unwrap();

        assert_eq!(payment.id, "tr_abc123");
        assert_eq!(payment.status, "paid");
        assert_eq!(payment.mode, Some(VendorMode::Test));
        assert_eq!(payment.method.as_deref(), Some("ideal"));
        assert_eq!(payment.customer_id.as_deref(), Some("cst_9"));
        assert_eq!(payment.subscription_id.as_deref(), Some("sub_4"));
        assert_eq!(payment.checkout_url.as_deref(), Some("https://pay.example/abc"));
        assert_eq!(payment.metadata["transaction_id"], 17);
        assert_eq!(
            payment.refunds,
            vec![VendorRefund {
                amount: 2.5,
                date: "2026-02-01T10:00:00+00:00".into()
            }]
        );
    }

    // Mollie omits most optional fields on a freshly created payment.
    #[test]
    fn minimal_payment_json_deserializes() {
        let raw = serde_json::json!({
            "id": "tr_min",
            "status": "open"
        });
        let payment: MolliePayment = serde_json::from_value(raw).unwrap();
        let payment: VendorPayment = payment.try_into().unwrap();
        assert_eq!(payment.status, "open");
        assert!(payment.checkout_url.is_none());
        assert!(payment.refunds.is_empty());
    }

    #[test]
    fn api_key_prefix_implies_mode() {
        assert_eq!(MollieClient::new("live_abc").mode(), VendorMode::Live);
        assert_eq!(MollieClient::new("test_abc").mode(), VendorMode::Test);
    }
}
