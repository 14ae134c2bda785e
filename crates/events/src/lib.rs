//! Post-commit domain events for the donation ledger.

pub mod bus;

pub use bus::{DonationEvent, EventBus};
