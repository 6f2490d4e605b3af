//! Confirmed orders.
//!
//! An [`Order`] is what the intake produces once the manager confirms the
//! draft. It is immutable from that point on; the amount invariant is carried
//! by [`Amount`] and never re-checked.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::amount::Amount;
use crate::types::{Console, OrderKind, Requester};

/// A sale of an arbitrary service to a client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FreeSaleOrder {
    pub service_name: String,
    pub client_login: String,
    pub comment: String,
    pub amount: Amount,
    pub requester_id: i64,
    pub requester_handle: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A sale of a game slot from the catalogue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductOrder {
    pub game_title: String,
    pub console: Console,
    pub slot: String,
    pub account_login: String,
    pub comment: String,
    pub amount: Amount,
    pub requester_id: i64,
    pub requester_handle: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A confirmed order of either shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Order {
    FreeSale(FreeSaleOrder),
    Product(ProductOrder),
}

impl Order {
    pub fn kind(&self) -> OrderKind {
        match self {
            Order::FreeSale(_) => OrderKind::FreeSale,
            Order::Product(_) => OrderKind::Product,
        }
    }

    pub fn amount(&self) -> Amount {
        match self {
            Order::FreeSale(o) => o.amount,
            Order::Product(o) => o.amount,
        }
    }

    pub fn comment(&self) -> &str {
        match self {
            Order::FreeSale(o) => &o.comment,
            Order::Product(o) => &o.comment,
        }
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        match self {
            Order::FreeSale(o) => o.created_at,
            Order::Product(o) => o.created_at,
        }
    }

    pub fn requester(&self) -> Requester {
        match self {
            Order::FreeSale(o) => Requester::new(o.requester_id, o.requester_handle.clone()),
            Order::Product(o) => Requester::new(o.requester_id, o.requester_handle.clone()),
        }
    }

    /// Name shown to the payer on the gateway's payment page.
    pub fn product_name(&self) -> String {
        match self {
            Order::FreeSale(o) => o.service_name.clone(),
            Order::Product(o) => format!("{} ({}, {})", o.game_title, o.console, o.slot),
        }
    }

    /// Login of the client the order is for.
    pub fn customer(&self) -> &str {
        match self {
            Order::FreeSale(o) => &o.client_login,
            Order::Product(o) => &o.account_login,
        }
    }
}
