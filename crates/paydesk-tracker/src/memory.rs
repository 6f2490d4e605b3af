//! In-memory port implementations.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use paydesk_core::ChatId;
use rust_decimal::Decimal;
use serde::Serialize;
use tokio::sync::RwLock;

use crate::ports::{FreeSaleRow, Keyboard, LedgerPort, Notification, NotifyPort, ProductSaleRow};

/// Count and total of one ledger sheet.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SheetSummary {
    pub count: usize,
    pub total: Decimal,
}

/// Totals across both sheets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LedgerSummary {
    pub free_sales: SheetSummary,
    pub product_sales: SheetSummary,
}

/// Ledger kept in process memory.
///
/// Used when no external ledger is configured, and by tests. Can be switched
/// into a failing mode to exercise write failures.
#[derive(Clone, Default)]
pub struct InMemoryLedger {
    free_sales: Arc<RwLock<Vec<FreeSaleRow>>>,
    product_sales: Arc<RwLock<Vec<ProductSaleRow>>>,
    failing: Arc<AtomicBool>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// A ledger that rejects every write.
    pub fn failing() -> Self {
        let ledger = Self::default();
        ledger.set_failing(true);
        ledger
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub async fn free_sales(&self) -> Vec<FreeSaleRow> {
        self.free_sales.read().await.clone()
    }

    pub async fn product_sales(&self) -> Vec<ProductSaleRow> {
        self.product_sales.read().await.clone()
    }

    /// Number of rows and booked total per sheet.
    pub async fn summary(&self) -> LedgerSummary {
        let free = self.free_sales.read().await;
        let product = self.product_sales.read().await;
        LedgerSummary {
            free_sales: SheetSummary {
                count: free.len(),
                total: free.iter().map(|r| r.amount).sum(),
            },
            product_sales: SheetSummary {
                count: product.len(),
                total: product.iter().map(|r| r.amount).sum(),
            },
        }
    }
}

#[async_trait]
impl LedgerPort for InMemoryLedger {
    async fn append_free_sale(&self, row: &FreeSaleRow) -> bool {
        if self.failing.load(Ordering::SeqCst) {
            return false;
        }
        self.free_sales.write().await.push(row.clone());
        true
    }

    async fn append_product_sale(&self, row: &ProductSaleRow) -> bool {
        if self.failing.load(Ordering::SeqCst) {
            return false;
        }
        self.product_sales.write().await.push(row.clone());
        true
    }
}

/// A notification as it was delivered.
#[derive(Debug, Clone, PartialEq)]
pub struct Delivered {
    pub target: ChatId,
    pub notification: Notification,
    pub keyboard: Option<Keyboard>,
}

/// Notifier that keeps every notification it is given.
#[derive(Clone, Default)]
pub struct RecordingNotifier {
    sent: Arc<RwLock<Vec<Delivered>>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn sent(&self) -> Vec<Delivered> {
        self.sent.read().await.clone()
    }
}

#[async_trait]
impl NotifyPort for RecordingNotifier {
    async fn notify(&self, target: ChatId, notification: &Notification, keyboard: Option<Keyboard>) {
        self.sent.write().await.push(Delivered {
            target,
            notification: notification.clone(),
            keyboard,
        });
    }
}
