//! Hand-off queue between the conversation and the tracker.
//!
//! Handlers enqueue a [`TrackingSession`] on a [`TrackerHandle`] and return
//! immediately. A single dispatcher task drains the queue and spawns one task
//! per session, refusing to track the same order id twice at once.

use std::collections::HashSet;
use std::sync::Arc;

use paydesk_core::{PaydeskError, Result};
use tokio::sync::{mpsc, RwLock};
use tokio::task::JoinHandle;
use tracing::{info, warn};
use uuid::Uuid;

use crate::tracker::{PaymentTracker, TrackingSession};

/// Sending side of the tracking queue.
#[derive(Clone)]
pub struct TrackerHandle {
    tx: mpsc::Sender<TrackingSession>,
    active: Arc<RwLock<HashSet<Uuid>>>,
}

impl TrackerHandle {
    /// Start the dispatcher task for `tracker`.
    ///
    /// The dispatcher stops once every handle has been dropped.
    pub fn spawn(tracker: PaymentTracker) -> (Self, JoinHandle<()>) {
        let (tx, rx) = mpsc::channel(tracker.config().queue_capacity.max(1));
        let active = Arc::new(RwLock::new(HashSet::new()));
        let dispatcher = tokio::spawn(dispatch(tracker, rx, active.clone()));
        (Self { tx, active }, dispatcher)
    }

    /// Queue a session for tracking without waiting for it.
    pub fn submit(&self, session: TrackingSession) -> Result<()> {
        let order_id = session.order_id();
        self.tx.try_send(session).map_err(|e| {
            warn!(order_id = %order_id, error = %e, "Could not queue payment for tracking");
            match e {
                mpsc::error::TrySendError::Full(_) => {
                    PaydeskError::QueueClosed("tracking queue is full".to_string())
                }
                mpsc::error::TrySendError::Closed(_) => {
                    PaydeskError::QueueClosed("tracking dispatcher has stopped".to_string())
                }
            }
        })
    }

    /// Number of sessions currently being tracked.
    pub async fn active_count(&self) -> usize {
        self.active.read().await.len()
    }

    pub async fn is_tracking(&self, order_id: Uuid) -> bool {
        self.active.read().await.contains(&order_id)
    }
}

async fn dispatch(
    tracker: PaymentTracker,
    mut rx: mpsc::Receiver<TrackingSession>,
    active: Arc<RwLock<HashSet<Uuid>>>,
) {
    while let Some(session) = rx.recv().await {
        let order_id = session.order_id();
        if !active.write().await.insert(order_id) {
            warn!(order_id = %order_id, "Payment is already being tracked");
            continue;
        }

        let tracker = tracker.clone();
        let active = active.clone();
        tokio::spawn(async move {
            let outcome = tracker.track(session).await;
            active.write().await.remove(&order_id);
            info!(
                order_id = %order_id,
                state = ?outcome.state,
                polls = outcome.polls,
                ledger = ?outcome.ledger,
                "Payment tracking finished"
            );
        });
    }
    info!("Tracking dispatcher stopped");
}
