//! # Paydesk Tracker
//!
//! Payment lifecycle tracking.
//!
//! After a payment link is issued the order is handed to the tracker, which
//! polls the gateway until the payment settles, fails or the waiting window
//! runs out, then books the sale and notifies the conversation.

pub mod dispatcher;
pub mod memory;
pub mod ports;
pub mod tracker;

pub use dispatcher::TrackerHandle;
pub use memory::{Delivered, InMemoryLedger, LedgerSummary, RecordingNotifier, SheetSummary};
pub use ports::{
    FreeSaleRow, Keyboard, LedgerPort, LedgerRow, LedgerStatus, Notification, NotifyPort,
    OutcomeCategory, ProductSaleRow,
};
pub use tracker::{PaymentTracker, TrackerConfig, TrackerState, TrackingOutcome, TrackingSession};
