//! Route tree construction.

pub mod health;

use axum::routing::{delete, get, post};
use axum::Router;

use crate::handlers;
use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /payments                        create payment (POST)
///
/// /webhooks/mollie                 vendor status notifications (POST)
///
/// /campaigns                       list, create (GET, POST)
/// /campaigns/{id}                  get, update (GET, PUT)
///
/// /admin/transactions              paginated listing (GET)
/// /admin/subscriptions/{id}        cancel (DELETE)
/// /admin/migrations/batch          run one batch (POST)
/// /admin/migrations/status         version / pending / busy (GET)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/payments", post(handlers::payments::create_payment))
        .route("/webhooks/mollie", post(handlers::webhooks::mollie_webhook))
        .route(
            "/campaigns",
            get(handlers::campaigns::list_campaigns).post(handlers::campaigns::create_campaign),
        )
        .route(
            "/campaigns/{id}",
            get(handlers::campaigns::get_campaign).put(handlers::campaigns::update_campaign),
        )
        .route(
            "/admin/transactions",
            get(handlers::transactions::list_transactions),
        )
        .route(
            "/admin/subscriptions/{id}",
            delete(handlers::subscriptions::cancel_subscription),
        )
        .route(
            "/admin/migrations/batch",
            post(handlers::migrations::run_batch),
        )
        .route(
            "/admin/migrations/status",
            get(handlers::migrations::status),
        )
}
