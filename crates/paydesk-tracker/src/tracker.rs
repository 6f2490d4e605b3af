//! Payment lifecycle tracking.
//!
//! A tracking session polls the gateway until the payment reaches a terminal
//! status or the attempt budget runs out. It always ends with exactly one
//! notification, and writes to the ledger at most once (only on success).

use std::sync::Arc;
use std::time::Duration;

use paydesk_core::{ChatId, Order, PaymentCreated, PaymentMethod, PaymentRecord, PaymentStatus};
use paydesk_gateway::PaymentGateway;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::ports::{
    Keyboard, LedgerPort, LedgerRow, LedgerStatus, Notification, NotifyPort, OutcomeCategory,
};

/// Configuration for payment tracking.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackerConfig {
    /// Delay before each status check, in milliseconds.
    pub poll_interval_ms: u64,

    /// Number of status checks before giving up.
    pub max_attempts: u32,

    /// Capacity of the hand-off queue between intake and the dispatcher.
    pub queue_capacity: usize,
}

impl TrackerConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 30_000,
            max_attempts: 20,
            queue_capacity: 256,
        }
    }
}

/// A payment handed over for tracking.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrackingSession {
    pub chat_id: ChatId,
    pub order: Order,
    pub method: PaymentMethod,
    pub payment: PaymentCreated,
}

impl TrackingSession {
    pub fn new(chat_id: ChatId, order: Order, method: PaymentMethod, payment: PaymentCreated) -> Self {
        Self {
            chat_id,
            order,
            method,
            payment,
        }
    }

    pub fn order_id(&self) -> Uuid {
        self.payment.order_id
    }
}

/// State of a tracking session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum TrackerState {
    Polling { attempt: u32 },
    Succeeded,
    Failed { status: PaymentStatus },
    TimedOut,
}

impl TrackerState {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, TrackerState::Polling { .. })
    }
}

/// How a tracking session ended.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackingOutcome {
    pub order_id: Uuid,
    pub state: TrackerState,
    /// Number of status checks made.
    pub polls: u32,
    pub ledger: LedgerStatus,
    /// Last conclusive record from the gateway, if any.
    pub record: Option<PaymentRecord>,
}

/// Polls the gateway for one payment at a time and reports the outcome.
#[derive(Clone)]
pub struct PaymentTracker {
    gateway: Arc<dyn PaymentGateway>,
    ledger: Arc<dyn LedgerPort>,
    notifier: Arc<dyn NotifyPort>,
    config: TrackerConfig,
}

impl PaymentTracker {
    pub fn new(
        gateway: Arc<dyn PaymentGateway>,
        ledger: Arc<dyn LedgerPort>,
        notifier: Arc<dyn NotifyPort>,
        config: TrackerConfig,
    ) -> Self {
        Self {
            gateway,
            ledger,
            notifier,
            config,
        }
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    /// Run a tracking session to its terminal state.
    pub async fn track(&self, session: TrackingSession) -> TrackingOutcome {
        let order_id = session.order_id();
        let payment_id = session.payment.payment_id.clone();
        info!(order_id = %order_id, payment_id = %payment_id, "Tracking payment");

        let mut state = TrackerState::Polling { attempt: 0 };
        while let TrackerState::Polling { attempt } = state {
            if attempt >= self.config.max_attempts {
                state = TrackerState::TimedOut;
                break;
            }
            let attempt = attempt + 1;
            tokio::time::sleep(self.config.poll_interval()).await;

            match self.gateway.check_status(order_id).await {
                Ok(record) if record.status == PaymentStatus::Success => {
                    info!(order_id = %order_id, attempt, "Payment succeeded");
                    return self.succeed(&session, record, attempt).await;
                }
                Ok(record) if record.status.is_failure() => {
                    info!(order_id = %order_id, attempt, status = ?record.status, "Payment failed");
                    return self.fail(&session, record, attempt).await;
                }
                Ok(record) => {
                    debug!(
                        order_id = %order_id,
                        attempt,
                        max_attempts = self.config.max_attempts,
                        status = ?record.status,
                        "Payment not settled yet"
                    );
                }
                Err(e) => {
                    warn!(
                        order_id = %order_id,
                        attempt,
                        retryable = e.is_retryable(),
                        error = %e,
                        "Status check failed"
                    );
                }
            }
            state = TrackerState::Polling { attempt };
        }

        warn!(order_id = %order_id, payment_id = %payment_id, "Payment tracking timed out");
        let notification = self.notification(&session, OutcomeCategory::TimedOut, None, LedgerStatus::NotAttempted);
        self.notifier.notify(session.chat_id, &notification, None).await;

        TrackingOutcome {
            order_id,
            state,
            polls: self.config.max_attempts,
            ledger: LedgerStatus::NotAttempted,
            record: None,
        }
    }

    async fn succeed(&self, session: &TrackingSession, record: PaymentRecord, polls: u32) -> TrackingOutcome {
        let amount = record.settled_amount(session.order.amount());
        let row = LedgerRow::for_order(&session.order, amount, session.order_id());
        let ledger = LedgerStatus::from(self.ledger.append(&row).await);
        if ledger == LedgerStatus::Failed {
            error!(order_id = %session.order_id(), amount = %amount, "Ledger write failed for paid order");
        }

        let notification = self.notification(session, OutcomeCategory::Succeeded, Some(&record), ledger);
        self.notifier
            .notify(session.chat_id, &notification, Some(Keyboard::BackToMain))
            .await;

        TrackingOutcome {
            order_id: session.order_id(),
            state: TrackerState::Succeeded,
            polls,
            ledger,
            record: Some(record),
        }
    }

    async fn fail(&self, session: &TrackingSession, record: PaymentRecord, polls: u32) -> TrackingOutcome {
        let notification = self.notification(
            session,
            OutcomeCategory::Failed,
            Some(&record),
            LedgerStatus::NotAttempted,
        );
        self.notifier.notify(session.chat_id, &notification, None).await;

        TrackingOutcome {
            order_id: session.order_id(),
            state: TrackerState::Failed {
                status: record.status,
            },
            polls,
            ledger: LedgerStatus::NotAttempted,
            record: Some(record),
        }
    }

    fn notification(
        &self,
        session: &TrackingSession,
        category: OutcomeCategory,
        record: Option<&PaymentRecord>,
        ledger: LedgerStatus,
    ) -> Notification {
        Notification {
            category,
            order: session.order.clone(),
            order_id: session.order_id(),
            payment_id: session.payment.payment_id.clone(),
            amount: session.order.amount(),
            fee: record.and_then(|r| r.fee),
            received_amount: record.and_then(|r| r.received_amount),
            method: session.method,
            pay_method: record.and_then(|r| r.pay_method.clone()),
            pay_data: record.and_then(|r| r.pay_data.clone()),
            status: record.map(|r| r.status),
            ledger,
        }
    }
}
