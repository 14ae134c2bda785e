//! Shared test fixtures: a recording payment-provider double and setup
//! helpers.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use obol_core::status::VendorMode;
use obol_db::migrations::MigrationRunner;
use obol_db::models::campaign::NewCampaign;
use obol_db::repositories::{CampaignRepo, DonorRepo, SubscriptionRepo, TransactionRepo};
use obol_events::EventBus;
use obol_ledger::{CreatePaymentArgs, PaymentService};
use obol_mollie::{
    CustomerRequest, PaymentProvider, PaymentRequest, ProviderError, VendorCustomer,
    VendorPayment,
};
use sqlx::PgPool;

// ---------------------------------------------------------------------------
// MockProvider
// ---------------------------------------------------------------------------

/// In-memory provider double that records every request and serves
/// scripted payment state.
#[derive(Default)]
pub struct MockProvider {
    payments: Mutex<HashMap<String, VendorPayment>>,
    pub payment_requests: Mutex<Vec<PaymentRequest>>,
    pub customer_requests: Mutex<Vec<CustomerRequest>>,
    pub cancellations: Mutex<Vec<(String, String)>>,
    pub fail_create_payment: AtomicBool,
    pub get_payment_calls: AtomicUsize,
    counter: AtomicUsize,
}

impl MockProvider {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Script the vendor-side status for a payment.
    pub fn set_status(&self, vendor_payment_id: &str, status: &str) {
        let mut payments = self.payments.lock().unwrap();
        let payment = payments
            .get_mut(vendor_payment_id)
            .expect("payment must exist before scripting its status");
        payment.status = status.to_string();
    }

    /// Script the vendor subscription id reported alongside the payment.
    pub fn set_subscription_id(&self, vendor_payment_id: &str, subscription_id: &str) {
        let mut payments = self.payments.lock().unwrap();
        let payment = payments
            .get_mut(vendor_payment_id)
            .expect("payment must exist before scripting its subscription");
        payment.subscription_id = Some(subscription_id.to_string());
    }

    /// Script a refund entry on the payment.
    pub fn add_refund(&self, vendor_payment_id: &str, amount: f64, date: &str) {
        let mut payments = self.payments.lock().unwrap();
        let payment = payments
            .get_mut(vendor_payment_id)
            .expect("payment must exist before scripting a refund");
        payment.refunds.push(obol_mollie::VendorRefund {
            amount,
            date: date.to_string(),
        });
    }

    /// Register a payment id the service never created, as vendor
    /// sandboxes do.
    pub fn insert_foreign_payment(&self, vendor_payment_id: &str, status: &str) {
        let payment = VendorPayment {
            id: vendor_payment_id.to_string(),
            status: status.to_string(),
            mode: Some(VendorMode::Test),
            method: None,
            checkout_url: None,
            customer_id: None,
            subscription_id: None,
            metadata: serde_json::Value::Null,
            refunds: Vec::new(),
        };
        self.payments
            .lock()
            .unwrap()
            .insert(vendor_payment_id.to_string(), payment);
    }
}

#[async_trait]
impl PaymentProvider for MockProvider {
    async fn create_payment(
        &self,
        request: &PaymentRequest,
    ) -> Result<VendorPayment, ProviderError> {
        self.payment_requests.lock().unwrap().push(request.clone());
        if self.fail_create_payment.load(Ordering::SeqCst) {
            return Err(ProviderError::Api {
                status: 500,
                detail: "scripted failure".into(),
            });
        }

        let n = self.counter.fetch_add(1, Ordering::SeqCst);
        let id = format!("tr_mock_{n}");
        let payment = VendorPayment {
            id: id.clone(),
            status: "open".into(),
            mode: Some(VendorMode::Test),
            method: None,
            checkout_url: Some(format!("https://pay.test/{id}")),
            customer_id: request.customer_id.clone(),
            subscription_id: None,
            metadata: request.metadata.clone(),
            refunds: Vec::new(),
        };
        self.payments.lock().unwrap().insert(id, payment.clone());
        Ok(payment)
    }

    async fn get_payment(&self, vendor_payment_id: &str) -> Result<VendorPayment, ProviderError> {
        self.get_payment_calls.fetch_add(1, Ordering::SeqCst);
        self.payments
            .lock()
            .unwrap()
            .get(vendor_payment_id)
            .cloned()
            .ok_or(ProviderError::Api {
                status: 404,
                detail: "No payment exists with token".into(),
            })
    }

    async fn create_customer(
        &self,
        request: &CustomerRequest,
    ) -> Result<VendorCustomer, ProviderError> {
        self.customer_requests.lock().unwrap().push(request.clone());
        let n = self.counter.fetch_add(1, Ordering::SeqCst);
        Ok(VendorCustomer {
            id: format!("cst_mock_{n}"),
        })
    }

    async fn cancel_subscription(
        &self,
        customer_id: &str,
        subscription_id: &str,
    ) -> Result<(), ProviderError> {
        self.cancellations
            .lock()
            .unwrap()
            .push((customer_id.to_string(), subscription_id.to_string()));
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Setup helpers
// ---------------------------------------------------------------------------

pub struct TestContext {
    pub service: PaymentService,
    pub provider: Arc<MockProvider>,
    pub campaigns: CampaignRepo,
    pub donors: DonorRepo,
    pub transactions: TransactionRepo,
    pub subscriptions: SubscriptionRepo,
    pub events: Arc<EventBus>,
}

/// Migrate the fresh test database and wire a service around the mock.
pub async fn setup(pool: PgPool) -> TestContext {
    MigrationRunner::new(pool.clone())
        .run_batch(0, 100)
        .await
        .expect("migrations should apply");

    let provider = MockProvider::new();
    let events = Arc::new(EventBus::default());
    let service = PaymentService::new(
        pool.clone(),
        provider.clone(),
        events.clone(),
        VendorMode::Test,
        Some("https://donate.test/api/v1/webhooks/mollie".into()),
    );

    TestContext {
        service,
        provider,
        campaigns: CampaignRepo::new(pool.clone()),
        donors: DonorRepo::new(pool.clone()),
        transactions: TransactionRepo::new(pool.clone()),
        subscriptions: SubscriptionRepo::new(pool),
        events,
    }
}

/// A campaign accepting both cadences with open amounts.
pub fn test_campaign(title: &str) -> NewCampaign {
    NewCampaign {
        title: title.to_string(),
        currency: Some("EUR".into()),
        goal: None,
        show_goal: None,
        amount_type: None,
        fixed_amounts: None,
        minimum_donation: Some(1.0),
        maximum_donation: None,
        donation_type: Some(obol_core::campaign::DonationType::Both),
        theme_color: None,
        welcome_title: None,
        welcome_text: None,
        show_return_message: None,
        use_custom_return_url: None,
        custom_return_url: None,
    }
}

/// Standard payment args against the given campaign.
pub fn payment_args(campaign_id: i64, recurring: bool) -> CreatePaymentArgs {
    CreatePaymentArgs {
        amount: 10.0,
        currency: "EUR".into(),
        description: None,
        recurring,
        recurring_frequency: recurring.then(|| "1 month".to_string()),
        recurring_length: None,
        email: "donor@example.org".into(),
        name: Some("Dana Donor".into()),
        campaign_id,
        return_url: "https://donate.test/thanks".into(),
        message: None,
    }
}
