//! Payment vendor integration.
//!
//! [`provider::PaymentProvider`] is the vendor-agnostic contract the
//! payment services depend on; [`client::MollieClient`] is the concrete
//! implementation over Mollie's v2 REST API. The trait boundary is the
//! seam reconciliation tests use to substitute a recording double.

pub mod client;
pub mod provider;

pub use client::MollieClient;
pub use provider::{
    CustomerRequest, PaymentProvider, PaymentRequest, ProviderError, VendorCustomer,
    VendorPayment, VendorRefund,
};
