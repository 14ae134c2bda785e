use std::sync::Arc;

use obol_db::migrations::MigrationRunner;
use obol_ledger::PaymentService;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: obol_db::DbPool,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Payment creation and reconciliation service.
    pub payments: Arc<PaymentService>,
    /// Batch migration runner for the admin endpoints.
    pub migrations: Arc<MigrationRunner>,
    /// Post-commit event bus, subscribed to by receipt/invoice collaborators.
    pub events: Arc<obol_events::EventBus>,
}
