//! Request and response bodies of the gateway HTTP API.
//!
//! Field order in the request structs is the order on the wire; the signature
//! covers the serialized bytes, so do not reorder fields.

use paydesk_core::{Amount, PaymentMethod, PaymentRequest, PaymentStatus};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Product type sent with every payment.
pub const PRODUCT_TYPE: &str = "goods";

/// Body of `payment/create`.
#[derive(Debug, Serialize)]
pub struct CreatePaymentBody<'a> {
    pub project_identificator: &'a str,
    pub amount: Amount,
    pub order_id: Uuid,
    pub currency: &'a str,
    pub product_name: &'a str,
    pub product_type: &'static str,
    pub description: &'a str,
    pub customer: Customer<'a>,
    #[serde(skip_serializing_if = "no_methods")]
    pub prefer_methods: &'a [PaymentMethod],
}

#[derive(Debug, Serialize)]
pub struct Customer<'a> {
    pub email: &'a str,
}

impl<'a> CreatePaymentBody<'a> {
    pub fn new(project_id: &'a str, request: &'a PaymentRequest) -> Self {
        Self {
            project_identificator: project_id,
            amount: request.amount,
            order_id: request.order_id,
            currency: &request.currency,
            product_name: &request.product_name,
            product_type: PRODUCT_TYPE,
            description: &request.description,
            customer: Customer {
                email: &request.customer_identifier,
            },
            prefer_methods: &request.preferred_methods,
        }
    }
}

/// Body of `payment/check`.
#[derive(Debug, Serialize)]
pub struct CheckPaymentBody<'a> {
    pub project_identificator: &'a str,
    pub order_id: Uuid,
}

/// Fields present in every response.
#[derive(Debug, Deserialize)]
pub struct Envelope {
    pub code: i64,
    #[serde(default)]
    pub error: Option<String>,
}

/// Successful `payment/create` response.
#[derive(Debug, Deserialize)]
pub struct CreatePaymentReply {
    pub payment_id: String,
    #[serde(default)]
    pub payment_url: Option<String>,
}

/// Successful `payment/check` response.
///
/// `amount` is what was credited; `original_amount` is what was requested.
#[derive(Debug, Deserialize)]
pub struct CheckPaymentReply {
    #[serde(default)]
    pub payment_id: Option<String>,
    #[serde(default = "unknown_status")]
    pub status: PaymentStatus,
    #[serde(default)]
    pub amount: Option<Decimal>,
    #[serde(default)]
    pub original_amount: Option<Decimal>,
    #[serde(default)]
    pub fee: Option<Decimal>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub payment_url: Option<String>,
    #[serde(default)]
    pub pay_method: Option<String>,
    #[serde(default)]
    pub pay_data: Option<serde_json::Value>,
    #[serde(default)]
    pub ctime: Option<serde_json::Value>,
}

fn no_methods(methods: &&[PaymentMethod]) -> bool {
    methods.is_empty()
}

fn unknown_status() -> PaymentStatus {
    PaymentStatus::Unknown
}

/// Render a loosely typed field as text.
pub(crate) fn value_text(value: Option<serde_json::Value>) -> Option<String> {
    match value? {
        serde_json::Value::Null => None,
        serde_json::Value::String(s) => Some(s),
        other => Some(other.to_string()),
    }
}
