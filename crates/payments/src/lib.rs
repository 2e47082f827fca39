//! Payment gateway client.
//!
//! - [`PaymentGateway`] -- the narrow interface the payment orchestrator
//!   calls.
//! - [`PesapalClient`] -- PesaPal v3 implementation with per-request
//!   timeouts, retry with backoff, and a cached IPN registration.
//! - [`DisabledGateway`] -- stand-in used when no credentials are configured.

pub mod error;
pub mod gateway;
pub mod pesapal;

pub use error::GatewayError;
pub use gateway::{DisabledGateway, OrderRequest, OrderResponse, PaymentGateway, TransactionStatus};
pub use pesapal::{PesapalClient, PesapalConfig};
