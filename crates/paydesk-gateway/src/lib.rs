//! # Paydesk Gateway
//!
//! Client for the payment gateway's signed JSON API.
//!
//! Every request body is serialized once, signed with RSA/SHA-256 and sent as
//! exactly those bytes.

pub mod client;
pub mod config;
pub mod gateway;
pub mod signer;
pub mod wire;

pub use client::SignedRequestClient;
pub use config::GatewayConfig;
pub use gateway::PaymentGateway;
pub use signer::RsaSigner;

/// Prelude module for common imports.
pub mod prelude {
    pub use crate::client::SignedRequestClient;
    pub use crate::config::GatewayConfig;
    pub use crate::gateway::PaymentGateway;
    pub use paydesk_core::prelude::*;
}
