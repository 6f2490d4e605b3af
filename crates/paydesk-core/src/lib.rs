//! # Paydesk Core
//!
//! Core types shared by every Paydesk crate.
//!
//! This crate provides the fundamental building blocks:
//! - [`Amount`] - Validated order amount
//! - [`Order`] - Confirmed order of either shape
//! - [`PaymentRequest`] / [`PaymentRecord`] - Gateway payment data
//! - [`PaydeskError`] - Error taxonomy

pub mod amount;
pub mod error;
pub mod order;
pub mod payment;
pub mod types;

// Re-exports for convenience
pub use amount::{Amount, MAX_AMOUNT};
pub use error::{PaydeskError, Result, ValidationError};
pub use order::{FreeSaleOrder, Order, ProductOrder};
pub use payment::{PaymentCreated, PaymentRecord, PaymentRequest};
pub use types::*;

/// Prelude module for common imports
pub mod prelude {
    pub use crate::amount::Amount;
    pub use crate::error::{PaydeskError, Result, ValidationError};
    pub use crate::order::{FreeSaleOrder, Order, ProductOrder};
    pub use crate::payment::{PaymentCreated, PaymentRecord, PaymentRequest};
    pub use crate::types::{ChatId, Console, OrderKind, PaymentMethod, PaymentStatus, Requester};
}
