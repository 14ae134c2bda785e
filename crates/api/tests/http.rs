//! Router-level tests: webhook acknowledgment, migration batches, health.

use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use obol_api::config::ServerConfig;
use obol_api::{routes, state::AppState};
use obol_core::status::VendorMode;
use obol_db::migrations::MigrationRunner;
use obol_ledger::PaymentService;
use obol_mollie::{
    CustomerRequest, PaymentProvider, PaymentRequest, ProviderError, VendorCustomer,
    VendorPayment,
};
use sqlx::PgPool;
use tower::ServiceExt;

/// Provider double for router tests; every vendor call fails loudly.
/// The paths under test must not reach the vendor.
struct UnreachableProvider;

#[async_trait]
impl PaymentProvider for UnreachableProvider {
    async fn create_payment(&self, _: &PaymentRequest) -> Result<VendorPayment, ProviderError> {
        Err(ProviderError::Api {
            status: 503,
            detail: "unreachable in tests".into(),
        })
    }

    async fn get_payment(&self, _: &str) -> Result<VendorPayment, ProviderError> {
        Err(ProviderError::Api {
            status: 503,
            detail: "unreachable in tests".into(),
        })
    }

    async fn create_customer(&self, _: &CustomerRequest) -> Result<VendorCustomer, ProviderError> {
        Err(ProviderError::Api {
            status: 503,
            detail: "unreachable in tests".into(),
        })
    }

    async fn cancel_subscription(&self, _: &str, _: &str) -> Result<(), ProviderError> {
        Err(ProviderError::Api {
            status: 503,
            detail: "unreachable in tests".into(),
        })
    }
}

fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".into(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".into()],
        request_timeout_secs: 5,
        mollie_api_key: "test_key".into(),
        mollie_api_url: None,
        public_base_url: None,
    }
}

fn app(pool: PgPool) -> Router {
    let events = Arc::new(obol_events::EventBus::default());
    let payments = Arc::new(PaymentService::new(
        pool.clone(),
        Arc::new(UnreachableProvider),
        Arc::clone(&events),
        VendorMode::Test,
        None,
    ));
    let state = AppState {
        pool: pool.clone(),
        config: Arc::new(test_config()),
        payments,
        migrations: Arc::new(MigrationRunner::new(pool)),
        events,
    };

    Router::new()
        .merge(routes::health::router())
        .nest("/api/v1", routes::api_routes())
        .with_state(state)
}

async fn json_body(response: axum::response::Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[sqlx::test]
async fn health_reports_ok(pool: PgPool) {
    let app = app(pool);
    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["status"], "ok");
}

#[sqlx::test]
async fn webhook_for_unknown_payment_still_acknowledges(pool: PgPool) {
    // Migrate so the transaction lookup has its table.
    MigrationRunner::new(pool.clone())
        .run_batch(0, 100)
        .await
        .unwrap();

    let app = app(pool);
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/v1/webhooks/mollie")
                .header(
                    header::CONTENT_TYPE,
                    "application/x-www-form-urlencoded",
                )
                .body(Body::from("id=tr_never_seen"))
                .unwrap(),
        )
        .await
        .unwrap();

    // Anything but 200 would trigger vendor retry storms.
    assert_eq!(response.status(), StatusCode::OK);
}

#[sqlx::test]
async fn migration_batches_complete_via_the_endpoint(pool: PgPool) {
    let app = app(pool);

    // Drive the whole pending set one unit at a time.
    let mut offset = 0;
    loop {
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/v1/admin/migrations/batch")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(
                        serde_json::json!({ "batch_size": 1, "offset": offset }).to_string(),
                    ))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = json_body(response).await;
        if body["data"]["completed"].as_bool().unwrap() {
            break;
        }
        offset = body["data"]["next_offset"].as_u64().unwrap() as usize;
    }

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/v1/admin/migrations/status")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let body = json_body(response).await;
    assert_eq!(body["data"]["pending"], 0);
    assert_eq!(body["data"]["current_version"], "1.2.0");
}

#[sqlx::test]
async fn zero_batch_size_is_a_bad_request(pool: PgPool) {
    let app = app(pool);
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/v1/admin/migrations/batch")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(
                    serde_json::json!({ "batch_size": 0, "offset": 0 }).to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[sqlx::test]
async fn campaign_bounds_invariant_is_enforced_at_create(pool: PgPool) {
    MigrationRunner::new(pool.clone())
        .run_batch(0, 100)
        .await
        .unwrap();

    let app = app(pool);
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/v1/campaigns")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(
                    serde_json::json!({
                        "title": "Backwards bounds",
                        "minimum_donation": 50.0,
                        "maximum_donation": 10.0,
                    })
                    .to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = json_body(response).await;
    assert_eq!(body["code"], "VALIDATION_ERROR");
}
