//! # Paydesk Node
//!
//! Order intake API with payment link issuing and settlement tracking.

use std::sync::Arc;

use anyhow::Context;
use axum::{
    routing::{get, post},
    Router,
};
use paydesk_gateway::{PaymentGateway, SignedRequestClient};
use paydesk_tracker::{InMemoryLedger, LedgerPort, NotifyPort, PaymentTracker, TrackerHandle};
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod adapters;
mod api;
mod config;
mod state;

use adapters::{LogNotifier, WebhookLedger, WebhookNotifier};
use config::NodeConfig;
use state::AppState;

/// Run the node until the listener fails.
pub async fn run_server(config: NodeConfig) -> anyhow::Result<()> {
    info!("Paydesk node starting...");

    let gateway = SignedRequestClient::new(&config.gateway)
        .context("could not create the gateway client")?;
    let state = build_state(&config, Arc::new(gateway))?;
    let app = create_router(state);

    info!("Listening on http://{}", config.listen_addr);

    let listener = TcpListener::bind(config.listen_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Wire the ports and start the tracker.
fn build_state(config: &NodeConfig, gateway: Arc<dyn PaymentGateway>) -> anyhow::Result<AppState> {
    let timeout = config.gateway.timeout();

    let (ledger, memory_ledger) = match &config.ledger_url {
        Some(url) => {
            let ledger = WebhookLedger::new(url.as_str(), timeout)
                .context("could not create the ledger client")?;
            (Arc::new(ledger) as Arc<dyn LedgerPort>, None)
        }
        None => {
            warn!("No ledger configured, sales are kept in memory only");
            let ledger = InMemoryLedger::new();
            (Arc::new(ledger.clone()) as Arc<dyn LedgerPort>, Some(ledger))
        }
    };

    let notifier: Arc<dyn NotifyPort> = match &config.notify_url {
        Some(url) => Arc::new(
            WebhookNotifier::new(url.as_str(), timeout)
                .context("could not create the notification client")?,
        ),
        None => Arc::new(LogNotifier),
    };

    Ok(start(gateway, ledger, notifier, memory_ledger, config))
}

fn start(
    gateway: Arc<dyn PaymentGateway>,
    ledger: Arc<dyn LedgerPort>,
    notifier: Arc<dyn NotifyPort>,
    memory_ledger: Option<InMemoryLedger>,
    config: &NodeConfig,
) -> AppState {
    let tracker = PaymentTracker::new(gateway.clone(), ledger, notifier, config.tracker.clone());
    let (tracker, _dispatcher) = TrackerHandle::spawn(tracker);
    AppState::new(gateway, tracker, memory_ledger)
}

/// Create the API router.
fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Health check
        .route("/health", get(api::health::health_check))

        // Conversations
        .route(
            "/api/v1/chats/:chat_id",
            get(api::chats::get_chat).delete(api::chats::cancel_chat),
        )
        .route("/api/v1/chats/:chat_id/events", post(api::chats::post_event))
        .route("/api/v1/chats/:chat_id/link", post(api::chats::request_link))

        // Payments
        .route("/api/v1/payments/:order_id", get(api::payments::get_payment))
        .route("/api/v1/ledger/summary", get(api::payments::ledger_summary))

        // Add middleware
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = NodeConfig::from_env()?;
    run_server(config).await
}
