//! Donation services: payment creation and webhook reconciliation.

pub mod service;

pub use service::{CreatePaymentArgs, PaymentCreated, PaymentService};
