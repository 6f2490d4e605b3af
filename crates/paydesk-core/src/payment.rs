//! Payment types exchanged with the gateway.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::amount::Amount;
use crate::order::Order;
use crate::types::{PaymentMethod, PaymentStatus, CURRENCY};

/// A request to create a payment.
///
/// `order_id` is the gateway's idempotency key. It is generated here, so every
/// constructed request is a distinct payment attempt; retrying a failed link
/// request means building a new `PaymentRequest`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentRequest {
    pub order_id: Uuid,
    pub amount: Amount,
    pub currency: String,
    pub product_name: String,
    pub customer_identifier: String,
    pub description: String,
    /// Ordered, without duplicates.
    pub preferred_methods: Vec<PaymentMethod>,
}

impl PaymentRequest {
    pub fn new(
        amount: Amount,
        product_name: impl Into<String>,
        customer_identifier: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            order_id: Uuid::new_v4(),
            amount,
            currency: CURRENCY.to_string(),
            product_name: product_name.into(),
            customer_identifier: customer_identifier.into(),
            description: description.into(),
            preferred_methods: Vec::new(),
        }
    }

    /// Build a request for a confirmed order, preferring one method.
    pub fn for_order(order: &Order, method: PaymentMethod) -> Self {
        Self::new(
            order.amount(),
            order.product_name(),
            order.customer(),
            order.comment(),
        )
        .prefer(method)
    }

    /// Append a preferred method, ignoring repeats.
    pub fn prefer(mut self, method: PaymentMethod) -> Self {
        if !self.preferred_methods.contains(&method) {
            self.preferred_methods.push(method);
        }
        self
    }
}

/// Gateway acknowledgement of a created payment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentCreated {
    pub order_id: Uuid,
    pub payment_id: String,
    pub payment_url: Option<String>,
    pub amount: Amount,
}

/// State of a payment as last reported by the gateway.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentRecord {
    pub order_id: Uuid,
    pub payment_id: String,
    pub status: PaymentStatus,
    /// Amount originally requested.
    pub amount: Option<Decimal>,
    pub fee: Option<Decimal>,
    /// Amount actually credited after fees.
    pub received_amount: Option<Decimal>,
    pub pay_method: Option<String>,
    pub pay_data: Option<String>,
    pub created_at: Option<String>,
}

impl PaymentRecord {
    /// A freshly created payment, before the payer has acted.
    pub fn pending(created: &PaymentCreated) -> Self {
        Self {
            order_id: created.order_id,
            payment_id: created.payment_id.clone(),
            status: PaymentStatus::Pending,
            amount: Some(created.amount.value()),
            fee: None,
            received_amount: None,
            pay_method: None,
            pay_data: None,
            created_at: None,
        }
    }

    /// Amount to book: what was received, else the order amount.
    pub fn settled_amount(&self, order_amount: Amount) -> Decimal {
        self.received_amount.unwrap_or_else(|| order_amount.value())
    }
}
