//! Integration tests for payment creation.

mod common;

use assert_matches::assert_matches;
use common::{payment_args, setup, test_campaign};
use obol_core::campaign::DonationType;
use obol_core::error::CoreError;
use obol_core::status::{SequenceType, TransactionStatus};
use sqlx::PgPool;
use std::sync::atomic::Ordering;

#[sqlx::test]
async fn oneoff_payment_creates_open_transaction_with_checkout(pool: PgPool) {
    let ctx = setup(pool).await;
    let campaign = ctx.campaigns.create(&test_campaign("Oneoff")).await.unwrap();

    let created = ctx
        .service
        .create_payment(&payment_args(campaign.id, false))
        .await
        .unwrap()
        .expect("payment should be created");

    assert!(created.checkout_url.starts_with("https://pay.test/"));

    let tx = ctx.transactions.get(created.transaction_id).await.unwrap().unwrap();
    assert_eq!(tx.status, TransactionStatus::Open);
    assert_eq!(tx.sequence_type, SequenceType::Oneoff);
    assert_eq!(tx.value, 10.0);
    assert!(tx.vendor_payment_id.is_some());
    assert_eq!(tx.checkout_url.as_deref(), Some(created.checkout_url.as_str()));

    // The donor was created lazily and registered with the vendor.
    let donor = ctx.donors.get(tx.donor_id.unwrap()).await.unwrap().unwrap();
    assert_eq!(donor.email, "donor@example.org");
    assert!(donor.customer_id.is_some());
    assert_eq!(ctx.provider.customer_requests.lock().unwrap().len(), 1);
}

#[sqlx::test]
async fn recurring_request_yields_first_sequence(pool: PgPool) {
    let ctx = setup(pool).await;
    let campaign = ctx.campaigns.create(&test_campaign("Recurring")).await.unwrap();

    let created = ctx
        .service
        .create_payment(&payment_args(campaign.id, true))
        .await
        .unwrap()
        .unwrap();

    let tx = ctx.transactions.get(created.transaction_id).await.unwrap().unwrap();
    assert_eq!(tx.sequence_type, SequenceType::First);

    // The vendor request carried the sequence type and the metadata the
    // reconciliation path reads back.
    let requests = ctx.provider.payment_requests.lock().unwrap();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].sequence_type, SequenceType::First);
    assert_eq!(requests[0].metadata["transaction_id"], tx.id);
    assert_eq!(requests[0].metadata["recurring_frequency"], "1 month");
}

#[sqlx::test]
async fn recurring_request_downgrades_when_campaign_forbids_it(pool: PgPool) {
    let ctx = setup(pool).await;
    let mut input = test_campaign("Oneoff only");
    input.donation_type = Some(DonationType::Oneoff);
    let campaign = ctx.campaigns.create(&input).await.unwrap();

    let created = ctx
        .service
        .create_payment(&payment_args(campaign.id, true))
        .await
        .unwrap()
        .unwrap();

    let tx = ctx.transactions.get(created.transaction_id).await.unwrap().unwrap();
    assert_eq!(tx.sequence_type, SequenceType::Oneoff);
}

#[sqlx::test]
async fn provider_failure_leaves_transaction_open_without_vendor_id(pool: PgPool) {
    let ctx = setup(pool).await;
    let campaign = ctx.campaigns.create(&test_campaign("Failing")).await.unwrap();
    ctx.provider.fail_create_payment.store(true, Ordering::SeqCst);

    let outcome = ctx
        .service
        .create_payment(&payment_args(campaign.id, false))
        .await
        .unwrap();
    assert!(outcome.is_none(), "caller must not receive a checkout URL");

    let all = ctx
        .transactions
        .list(&Default::default(), None, None)
        .await
        .unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].status, TransactionStatus::Open);
    assert!(all[0].vendor_payment_id.is_none());
    assert!(all[0].checkout_url.is_none());
}

#[sqlx::test]
async fn existing_donor_and_customer_are_reused(pool: PgPool) {
    let ctx = setup(pool).await;
    let campaign = ctx.campaigns.create(&test_campaign("Repeat")).await.unwrap();

    ctx.service
        .create_payment(&payment_args(campaign.id, false))
        .await
        .unwrap()
        .unwrap();
    ctx.service
        .create_payment(&payment_args(campaign.id, false))
        .await
        .unwrap()
        .unwrap();

    // One donor, one vendor customer, two payments.
    assert_eq!(ctx.provider.customer_requests.lock().unwrap().len(), 1);
    assert_eq!(ctx.provider.payment_requests.lock().unwrap().len(), 2);
    let all = ctx
        .transactions
        .list(&Default::default(), None, None)
        .await
        .unwrap();
    assert_eq!(all.len(), 2);
    assert_eq!(all[0].donor_id, all[1].donor_id);
}

#[sqlx::test]
async fn invalid_email_is_a_validation_error(pool: PgPool) {
    let ctx = setup(pool).await;
    let campaign = ctx.campaigns.create(&test_campaign("Strict")).await.unwrap();

    let mut args = payment_args(campaign.id, false);
    args.email = "not-an-email".into();

    let err = ctx.service.create_payment(&args).await.unwrap_err();
    assert_matches!(err, CoreError::Validation(_));
    // Nothing was written.
    let all = ctx
        .transactions
        .list(&Default::default(), None, None)
        .await
        .unwrap();
    assert!(all.is_empty());
}

#[sqlx::test]
async fn amount_below_campaign_minimum_is_rejected(pool: PgPool) {
    let ctx = setup(pool).await;
    let mut input = test_campaign("High floor");
    input.minimum_donation = Some(25.0);
    let campaign = ctx.campaigns.create(&input).await.unwrap();

    let err = ctx
        .service
        .create_payment(&payment_args(campaign.id, false))
        .await
        .unwrap_err();
    assert_matches!(err, CoreError::Validation(_));
}

#[sqlx::test]
async fn unknown_campaign_is_not_found(pool: PgPool) {
    let ctx = setup(pool).await;
    let err = ctx
        .service
        .create_payment(&payment_args(4040, false))
        .await
        .unwrap_err();
    assert_matches!(err, CoreError::NotFound { entity: "Campaign", id: 4040 });
}

#[sqlx::test]
async fn return_message_campaign_embeds_transaction_id_in_redirect(pool: PgPool) {
    let ctx = setup(pool).await;
    let mut input = test_campaign("In-page message");
    input.show_return_message = Some(true);
    let campaign = ctx.campaigns.create(&input).await.unwrap();

    let created = ctx
        .service
        .create_payment(&payment_args(campaign.id, false))
        .await
        .unwrap()
        .unwrap();

    let requests = ctx.provider.payment_requests.lock().unwrap();
    assert_eq!(
        requests[0].redirect_url,
        format!("https://donate.test/thanks?donation_id={}", created.transaction_id)
    );
}

#[sqlx::test]
async fn custom_return_url_is_used_unmodified(pool: PgPool) {
    let ctx = setup(pool).await;
    let mut input = test_campaign("Custom return");
    input.use_custom_return_url = Some(true);
    input.custom_return_url = Some("https://example.org/landing".into());
    let campaign = ctx.campaigns.create(&input).await.unwrap();

    ctx.service
        .create_payment(&payment_args(campaign.id, false))
        .await
        .unwrap()
        .unwrap();

    let requests = ctx.provider.payment_requests.lock().unwrap();
    assert_eq!(requests[0].redirect_url, "https://example.org/landing");
}
