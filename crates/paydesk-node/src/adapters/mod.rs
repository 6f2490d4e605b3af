//! Port implementations backed by external HTTP services.

pub mod ledger;
pub mod notify;

pub use ledger::WebhookLedger;
pub use notify::{LogNotifier, WebhookNotifier};
