use crate::types::DbId;

/// Domain-level error taxonomy shared by all crates.
///
/// Variants map one-to-one onto the outcomes the services distinguish:
/// a lookup miss is often a valid result (webhooks for unknown payments),
/// a vendor failure is absorbed into a boolean outcome at the payment
/// boundary, and storage errors always propagate.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// An entity lookup came up empty where a row was required.
    #[error("{entity} with id {id} not found")]
    NotFound { entity: &'static str, id: DbId },

    /// Malformed or out-of-policy input.
    #[error("Validation error: {0}")]
    Validation(String),

    /// The relational store failed (constraint violation, connectivity).
    #[error("Storage error: {0}")]
    Storage(String),

    /// The payment vendor's API returned an error or was unreachable.
    #[error("Payment vendor error: {0}")]
    Vendor(String),

    /// A migration unit failed during execution.
    #[error("Migration error: {0}")]
    Migration(String),

    /// An invariant was broken; not recoverable by the caller.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Convenience alias used throughout the service layer.
pub type CoreResult<T> = Result<T, CoreError>;
