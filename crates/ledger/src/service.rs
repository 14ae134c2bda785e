//! The payment service: creates vendor payments and reconciles webhook
//! notifications against local transaction state.
//!
//! Construction takes every repository the service touches plus the
//! provider and the event bus; nothing is resolved at call time. Events
//! are published only after the corresponding writes have committed.

use std::sync::Arc;

use obol_core::campaign::{build_return_url, validate_amount};
use obol_core::error::{CoreError, CoreResult};
use obol_core::status::{SequenceType, TransactionStatus, VendorMode};
use obol_core::types::DbId;
use obol_db::models::donor::NewDonor;
use obol_db::models::subscription::NewSubscription;
use obol_db::models::transaction::{NewTransaction, RefundEntry, Transaction};
use obol_db::repositories::{CampaignRepo, DonorRepo, SubscriptionRepo, TransactionRepo};
use obol_db::DbPool;
use obol_events::{DonationEvent, EventBus};
use obol_mollie::{CustomerRequest, PaymentProvider, PaymentRequest, VendorPayment};
use serde::Deserialize;
use serde_json::json;
use validator::Validate;

// ---------------------------------------------------------------------------
// Inputs & outputs
// ---------------------------------------------------------------------------

/// Input for a payment creation, as submitted by the donation-form
/// collaborator.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreatePaymentArgs {
    #[validate(range(min = 0.01, message = "amount must be positive"))]
    pub amount: f64,

    #[validate(length(min = 3, max = 3, message = "currency must be an ISO code"))]
    pub currency: String,

    pub description: Option<String>,

    #[serde(default)]
    pub recurring: bool,

    /// Renewal interval in vendor syntax, e.g. `"1 month"`.
    pub recurring_frequency: Option<String>,

    /// Duration in years; omitted means indefinite.
    pub recurring_length: Option<i64>,

    #[validate(email(message = "a valid email is required"))]
    pub email: String,

    pub name: Option<String>,

    pub campaign_id: DbId,

    #[validate(url(message = "return_url must be a valid URL"))]
    pub return_url: String,

    pub message: Option<String>,
}

/// Successful payment creation: where to send the donor.
#[derive(Debug, Clone, serde::Serialize)]
pub struct PaymentCreated {
    pub transaction_id: DbId,
    pub checkout_url: String,
}

// ---------------------------------------------------------------------------
// PaymentService
// ---------------------------------------------------------------------------

/// Creates payments with the vendor and reconciles its notifications.
pub struct PaymentService {
    provider: Arc<dyn PaymentProvider>,
    events: Arc<EventBus>,
    campaigns: CampaignRepo,
    donors: DonorRepo,
    transactions: TransactionRepo,
    subscriptions: SubscriptionRepo,
    mode: VendorMode,
    /// Publicly reachable webhook endpoint, when one exists.
    webhook_url: Option<String>,
}

impl PaymentService {
    pub fn new(
        pool: DbPool,
        provider: Arc<dyn PaymentProvider>,
        events: Arc<EventBus>,
        mode: VendorMode,
        webhook_url: Option<String>,
    ) -> Self {
        Self {
            provider,
            events,
            campaigns: CampaignRepo::new(pool.clone()),
            donors: DonorRepo::new(pool.clone()),
            transactions: TransactionRepo::new(pool.clone()),
            subscriptions: SubscriptionRepo::new(pool),
            mode,
            webhook_url,
        }
    }

    // -----------------------------------------------------------------------
    // Payment creation
    // -----------------------------------------------------------------------

    /// Create a local transaction and a matching vendor payment.
    ///
    /// Returns `Ok(None)` when the vendor call failed: the transaction is
    /// left `open` with no vendor id and the caller must not assume a
    /// checkout URL exists. Validation and storage problems are errors.
    pub async fn create_payment(
        &self,
        args: &CreatePaymentArgs,
    ) -> CoreResult<Option<PaymentCreated>> {
        args.validate()
            .map_err(|e| CoreError::Validation(e.to_string()))?;

        let campaign = self
            .campaigns
            .get(args.campaign_id)
            .await
            .map_err(storage)?
            .ok_or(CoreError::NotFound {
                entity: "Campaign",
                id: args.campaign_id,
            })?;
        validate_amount(
            args.amount,
            campaign.minimum_donation,
            campaign.maximum_donation,
        )?;

        // Resolve or lazily create the mode-scoped donor.
        let donor = match self
            .donors
            .find_by_email_and_mode(&args.email, self.mode)
            .await
            .map_err(storage)?
        {
            Some(donor) => donor,
            None => self
                .donors
                .create(&NewDonor::from_payment(
                    &args.email,
                    args.name.as_deref(),
                    self.mode,
                ))
                .await
                .map_err(storage)?,
        };

        // Ensure the vendor knows this donor.
        let customer_id = match donor.customer_id.clone() {
            Some(id) => id,
            None => {
                let request = CustomerRequest {
                    email: args.email.clone(),
                    name: args.name.clone(),
                };
                match self.provider.create_customer(&request).await {
                    Ok(customer) => {
                        self.donors
                            .set_customer_id(donor.id, &customer.id)
                            .await
                            .map_err(storage)?;
                        customer.id
                    }
                    Err(e) => {
                        tracing::error!(
                            error = %e,
                            donor_id = donor.id,
                            "Vendor customer creation failed"
                        );
                        return Ok(None);
                    }
                }
            }
        };

        // `recurring` is never assigned at creation time; that value is
        // reserved for renewal transactions the vendor creates itself.
        let sequence_type = if args.recurring && campaign.donation_type.allows_recurring() {
            SequenceType::First
        } else {
            SequenceType::Oneoff
        };

        let transaction = self
            .transactions
            .create(&NewTransaction {
                value: args.amount,
                currency: args.currency.clone(),
                mode: self.mode,
                sequence_type,
                donor_id: Some(donor.id),
                campaign_id: Some(campaign.id),
                message: args.message.clone(),
            })
            .await
            .map_err(storage)?;

        let redirect_url = build_return_url(
            &campaign.return_policy(),
            &args.return_url,
            transaction.id,
        );
        let description = args
            .description
            .clone()
            .unwrap_or_else(|| format!("Donation to {}", campaign.title));

        let mut metadata = json!({
            "email": args.email,
            "name": args.name,
            "campaign_id": campaign.id,
            "transaction_id": transaction.id,
        });
        if sequence_type == SequenceType::First {
            metadata["recurring_frequency"] =
                json!(args.recurring_frequency.as_deref().unwrap_or("1 month"));
            metadata["recurring_length"] = json!(args.recurring_length);
        }

        let request = PaymentRequest {
            amount: args.amount,
            currency: args.currency.clone(),
            description,
            redirect_url,
            webhook_url: self.webhook_url.clone(),
            customer_id: Some(customer_id),
            sequence_type,
            metadata,
        };

        match self.provider.create_payment(&request).await {
            Ok(payment) => {
                self.transactions
                    .set_vendor_payment(transaction.id, &payment.id, payment.checkout_url.as_deref())
                    .await
                    .map_err(storage)?;
                match payment.checkout_url {
                    Some(checkout_url) => {
                        tracing::info!(
                            transaction_id = transaction.id,
                            vendor_payment_id = %payment.id,
                            "Vendor payment created"
                        );
                        Ok(Some(PaymentCreated {
                            transaction_id: transaction.id,
                            checkout_url,
                        }))
                    }
                    None => {
                        tracing::error!(
                            transaction_id = transaction.id,
                            vendor_payment_id = %payment.id,
                            "Vendor payment response carried no checkout URL"
                        );
                        Ok(None)
                    }
                }
            }
            Err(e) => {
                tracing::error!(
                    error = %e,
                    transaction_id = transaction.id,
                    "Vendor payment creation failed"
                );
                Ok(None)
            }
        }
    }

    // -----------------------------------------------------------------------
    // Reconciliation
    // -----------------------------------------------------------------------

    /// Reconcile a webhook notification.
    ///
    /// The inbound id is not trusted for status: the authoritative state
    /// is fetched back from the vendor. Unknown payment ids and duplicate
    /// notifications are successful no-ops.
    pub async fn handle_webhook(&self, vendor_payment_id: &str) -> CoreResult<()> {
        let Some(transaction) = self
            .transactions
            .find_by_vendor_payment_id(vendor_payment_id)
            .await
            .map_err(storage)?
        else {
            // Vendor sandboxes generate ids this system never recorded.
            tracing::info!(
                vendor_payment_id,
                "Webhook for unknown payment, nothing to reconcile"
            );
            return Ok(());
        };

        let payment = self
            .provider
            .get_payment(vendor_payment_id)
            .await
            .map_err(vendor)?;
        let new_status = payment.local_status().map_err(vendor)?;

        // Refund notifications arrive with the status already terminal;
        // capture the payload before the duplicate check exits.
        self.apply_refunds(&transaction, &payment).await?;

        if new_status == transaction.status {
            tracing::debug!(
                transaction_id = transaction.id,
                status = %new_status,
                "Duplicate notification, no status change"
            );
            return Ok(());
        }
        if !transaction.status.can_transition(new_status) {
            tracing::warn!(
                transaction_id = transaction.id,
                from = %transaction.status,
                to = %new_status,
                "Refusing status downgrade from terminal state"
            );
            return Ok(());
        }

        self.transactions
            .apply_status(transaction.id, new_status, payment.method.as_deref())
            .await
            .map_err(storage)?;
        tracing::info!(
            transaction_id = transaction.id,
            from = %transaction.status,
            to = %new_status,
            "Transaction reconciled"
        );

        if new_status == TransactionStatus::Paid {
            self.settle_paid(&transaction, &payment).await?;
        }

        self.events.publish(
            DonationEvent::new(format!("transaction.{new_status}"))
                .with_source("transaction", transaction.id)
                .with_payload(json!({
                    "transaction_id": transaction.id,
                    "campaign_id": transaction.campaign_id,
                    "donor_id": transaction.donor_id,
                    "value": transaction.value,
                    "currency": transaction.currency,
                })),
        );
        Ok(())
    }

    /// Totals and (for first-sequence payments) the subscription.
    async fn settle_paid(
        &self,
        transaction: &Transaction,
        payment: &VendorPayment,
    ) -> CoreResult<()> {
        if let Some(donor_id) = transaction.donor_id {
            self.donors
                .increment_total(donor_id, transaction.value)
                .await
                .map_err(storage)?;
        }
        if let Some(campaign_id) = transaction.campaign_id {
            self.campaigns
                .increment_total(campaign_id, transaction.value)
                .await
                .map_err(storage)?;
        }

        if transaction.sequence_type == SequenceType::First {
            let frequency = payment.metadata["recurring_frequency"]
                .as_str()
                .unwrap_or("1 month")
                .to_string();
            let years = payment.metadata["recurring_length"].as_i64();

            let subscription = self
                .subscriptions
                .create(&NewSubscription {
                    value: transaction.value,
                    currency: transaction.currency.clone(),
                    frequency,
                    years,
                    transaction_id: Some(transaction.id),
                    donor_id: transaction.donor_id,
                    campaign_id: transaction.campaign_id,
                    customer_id: payment.customer_id.clone(),
                    subscription_id: payment.subscription_id.clone(),
                })
                .await
                .map_err(storage)?;
            self.transactions
                .link_subscription(transaction.id, subscription.id)
                .await
                .map_err(storage)?;
            tracing::info!(
                transaction_id = transaction.id,
                subscription_id = subscription.id,
                "Subscription created from first payment"
            );

            self.events.publish(
                DonationEvent::new("subscription.created")
                    .with_source("subscription", subscription.id)
                    .with_payload(json!({
                        "subscription_id": subscription.id,
                        "transaction_id": transaction.id,
                        "value": transaction.value,
                        "currency": transaction.currency,
                    })),
            );
        }
        Ok(())
    }

    /// Update the refund payload when the vendor reports refunds we have
    /// not recorded yet. The terminal status is untouched.
    async fn apply_refunds(
        &self,
        transaction: &Transaction,
        payment: &VendorPayment,
    ) -> CoreResult<()> {
        if payment.refunds.is_empty() {
            return Ok(());
        }
        let entries: Vec<RefundEntry> = payment
            .refunds
            .iter()
            .map(|refund| RefundEntry {
                amount: refund.amount,
                date: refund.date.clone(),
            })
            .collect();
        let as_value = serde_json::to_value(&entries)
            .map_err(|e| CoreError::Internal(format!("refund payload: {e}")))?;
        if transaction.refunds.as_ref() == Some(&as_value) {
            return Ok(());
        }

        self.transactions
            .set_refunds(transaction.id, &entries)
            .await
            .map_err(storage)?;
        tracing::info!(
            transaction_id = transaction.id,
            refunds = entries.len(),
            "Refund payload updated"
        );
        self.events.publish(
            DonationEvent::new("transaction.refunded")
                .with_source("transaction", transaction.id)
                .with_payload(as_value),
        );
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Subscription management
    // -----------------------------------------------------------------------

    /// Cancel a subscription at the vendor, then locally.
    pub async fn cancel_subscription(&self, id: DbId) -> CoreResult<()> {
        let subscription = self
            .subscriptions
            .get(id)
            .await
            .map_err(storage)?
            .ok_or(CoreError::NotFound {
                entity: "Subscription",
                id,
            })?;

        if subscription.status == obol_core::status::SubscriptionStatus::Canceled {
            return Ok(());
        }

        if let (Some(customer_id), Some(vendor_subscription_id)) = (
            subscription.customer_id.as_deref(),
            subscription.subscription_id.as_deref(),
        ) {
            self.provider
                .cancel_subscription(customer_id, vendor_subscription_id)
                .await
                .map_err(vendor)?;
        }

        self.subscriptions
            .mark_canceled(id)
            .await
            .map_err(storage)?;
        tracing::info!(subscription_id = id, "Subscription canceled");

        self.events.publish(
            DonationEvent::new("subscription.canceled").with_source("subscription", id),
        );
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Error adapters
// ---------------------------------------------------------------------------

fn storage(e: sqlx::Error) -> CoreError {
    CoreError::Storage(e.to_string())
}

fn vendor(e: obol_mollie::ProviderError) -> CoreError {
    CoreError::Vendor(e.to_string())
}
