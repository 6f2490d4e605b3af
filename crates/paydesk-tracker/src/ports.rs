//! Outbound ports: the sales ledger and the chat notifier.

use std::fmt::Write as _;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use paydesk_core::{Amount, ChatId, Order, PaymentMethod, PaymentStatus};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A completed free sale as written to the ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FreeSaleRow {
    pub service_name: String,
    pub client_login: String,
    pub comment: String,
    pub amount: Decimal,
    /// Handle of the manager who made the sale.
    pub manager: String,
    pub order_id: Uuid,
    pub timestamp: DateTime<Utc>,
}

/// A completed product sale as written to the ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductSaleRow {
    pub game_title: String,
    pub console: String,
    pub slot: String,
    pub account_login: String,
    pub comment: String,
    pub amount: Decimal,
    pub manager: String,
    pub order_id: Uuid,
    pub timestamp: DateTime<Utc>,
}

/// Ledger row for either order shape.
#[derive(Debug, Clone, PartialEq)]
pub enum LedgerRow {
    FreeSale(FreeSaleRow),
    Product(ProductSaleRow),
}

impl LedgerRow {
    /// Row for a paid order, booked at `amount`.
    pub fn for_order(order: &Order, amount: Decimal, order_id: Uuid) -> Self {
        let manager = order.requester().display_handle();
        match order {
            Order::FreeSale(o) => LedgerRow::FreeSale(FreeSaleRow {
                service_name: o.service_name.clone(),
                client_login: o.client_login.clone(),
                comment: o.comment.clone(),
                amount,
                manager,
                order_id,
                timestamp: o.created_at,
            }),
            Order::Product(o) => LedgerRow::Product(ProductSaleRow {
                game_title: o.game_title.clone(),
                console: o.console.to_string(),
                slot: o.slot.clone(),
                account_login: o.account_login.clone(),
                comment: o.comment.clone(),
                amount,
                manager,
                order_id,
                timestamp: o.created_at,
            }),
        }
    }
}

/// Durable record of completed sales.
///
/// Implementations never fail toward the caller: a write that could not be
/// persisted returns `false`.
#[async_trait]
pub trait LedgerPort: Send + Sync {
    async fn append_free_sale(&self, row: &FreeSaleRow) -> bool;

    async fn append_product_sale(&self, row: &ProductSaleRow) -> bool;

    async fn append(&self, row: &LedgerRow) -> bool {
        match row {
            LedgerRow::FreeSale(row) => self.append_free_sale(row).await,
            LedgerRow::Product(row) => self.append_product_sale(row).await,
        }
    }
}

/// How a tracking session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeCategory {
    Succeeded,
    Failed,
    TimedOut,
}

/// Result of the ledger write for a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LedgerStatus {
    Written,
    Failed,
    NotAttempted,
}

impl From<bool> for LedgerStatus {
    fn from(written: bool) -> Self {
        if written {
            LedgerStatus::Written
        } else {
            LedgerStatus::Failed
        }
    }
}

/// Reply keyboard attached to a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Keyboard {
    /// Single button leading back to the main menu.
    BackToMain,
}

/// Terminal report of a tracking session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub category: OutcomeCategory,
    pub order: Order,
    pub order_id: Uuid,
    pub payment_id: String,
    /// Amount the order was placed for.
    pub amount: Amount,
    pub fee: Option<Decimal>,
    pub received_amount: Option<Decimal>,
    /// Method chosen during intake.
    pub method: PaymentMethod,
    /// Method the payer actually used, as reported by the gateway.
    pub pay_method: Option<String>,
    pub pay_data: Option<String>,
    /// Last status the gateway reported.
    pub status: Option<PaymentStatus>,
    pub ledger: LedgerStatus,
}

impl Notification {
    /// Plain-text rendering for chat transports.
    pub fn render(&self) -> String {
        let mut text = String::new();
        match self.category {
            OutcomeCategory::Succeeded => {
                text.push_str("Payment received\n\n");
                match &self.order {
                    Order::FreeSale(o) => {
                        let _ = writeln!(text, "Service: {}", o.service_name);
                        let _ = writeln!(text, "Client login: {}", o.client_login);
                    }
                    Order::Product(o) => {
                        let _ = writeln!(text, "Game: {}", o.game_title);
                        let _ = writeln!(text, "Console: {}", o.console);
                        let _ = writeln!(text, "Slot: {}", o.slot);
                        let _ = writeln!(text, "Account login: {}", o.account_login);
                    }
                }
                let _ = writeln!(text, "Comment: {}", self.order.comment());
                let _ = writeln!(text, "Amount: {} RUB", self.amount);
                let _ = writeln!(text, "Fee: {:.2} RUB", self.fee.unwrap_or_default());
                let received = self.received_amount.unwrap_or_else(|| self.amount.value());
                let _ = writeln!(text, "Received: {:.2} RUB", received);
                let _ = writeln!(text, "Payment method: {}", self.method);
                if let (Some(method), Some(data)) = (&self.pay_method, &self.pay_data) {
                    let _ = writeln!(text, "Paid with: {} ({})", method, data);
                }
            }
            OutcomeCategory::Failed => {
                let reason = self.status.map(|s| s.reason()).unwrap_or("payment failed");
                let _ = writeln!(text, "Payment failed: {}\n", reason);
            }
            OutcomeCategory::TimedOut => {
                text.push_str("Waiting for the payment timed out\n\n");
            }
        }

        let _ = writeln!(text, "Order id: {}", self.order_id);
        let _ = writeln!(text, "Payment id: {}", self.payment_id);

        match (self.category, self.ledger) {
            (OutcomeCategory::Succeeded, LedgerStatus::Written) => {
                text.push_str("\nThe sale was recorded in the ledger.");
            }
            (OutcomeCategory::Succeeded, _) => {
                text.push_str("\nWARNING: the sale could not be recorded in the ledger.");
            }
            (OutcomeCategory::Failed, _) => text.push_str("\nYou can create a new payment."),
            (OutcomeCategory::TimedOut, _) => {
                text.push_str("\nCheck the payment status manually or create a new one.")
            }
        }
        text
    }
}

/// Delivers notifications to the conversation.
///
/// Delivery problems, including transport retries, are handled inside the
/// implementation and never surface to the caller.
#[async_trait]
pub trait NotifyPort: Send + Sync {
    async fn notify(&self, target: ChatId, notification: &Notification, keyboard: Option<Keyboard>);
}

#[cfg(test)]
mod tests {
    use super::*;
    use paydesk_core::{Console, ProductOrder};
    use rust_decimal_macros::dec;

    fn product_order() -> Order {
        Order::Product(ProductOrder {
            game_title: "Elden Ring".into(),
            console: Console::Ps5,
            slot: "П3".into(),
            account_login: "player@example.com".into(),
            comment: "lead".into(),
            amount: Amount::parse("2499").unwrap(),
            requester_id: 3,
            requester_handle: Some("seller".into()),
            created_at: Utc::now(),
        })
    }

    fn notification(category: OutcomeCategory, ledger: LedgerStatus) -> Notification {
        Notification {
            category,
            order: product_order(),
            order_id: Uuid::nil(),
            payment_id: "pay-9".into(),
            amount: Amount::parse("2499").unwrap(),
            fee: Some(dec!(99)),
            received_amount: Some(dec!(2400)),
            method: PaymentMethod::FastPayment,
            pay_method: Some("SBP".into()),
            pay_data: Some("+7 *** 12".into()),
            status: Some(PaymentStatus::Success),
            ledger,
        }
    }

    #[test]
    fn test_product_row_uses_given_amount() {
        let order = product_order();
        let row = LedgerRow::for_order(&order, dec!(2400), Uuid::nil());
        match row {
            LedgerRow::Product(row) => {
                assert_eq!(row.amount, dec!(2400));
                assert_eq!(row.console, "PS5");
                assert_eq!(row.manager, "@seller");
            }
            other => panic!("unexpected row: {other:?}"),
        }
    }

    #[test]
    fn test_success_render_includes_settlement() {
        let text = notification(OutcomeCategory::Succeeded, LedgerStatus::Written).render();
        assert!(text.contains("Fee: 99.00 RUB"));
        assert!(text.contains("Received: 2400.00 RUB"));
        assert!(text.contains("Paid with: SBP (+7 *** 12)"));
        assert!(text.contains("recorded in the ledger"));

        let text = notification(OutcomeCategory::Succeeded, LedgerStatus::Failed).render();
        assert!(text.contains("WARNING"));
    }

    #[test]
    fn test_failure_render_names_reason() {
        let mut n = notification(OutcomeCategory::Failed, LedgerStatus::NotAttempted);
        n.status = Some(PaymentStatus::Expired);
        assert!(n.render().contains("payment window expired"));
    }
}
