//! Conversation endpoints.

use axum::extract::{Path, State};
use axum::Json;
use paydesk_core::{Amount, ChatId, PaydeskError, PaymentMethod, Requester};
use paydesk_intake::{IntakeEvent, OrderSession, StepView};
use paydesk_tracker::TrackingSession;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use super::{ApiError, ApiResult};
use crate::state::AppState;

/// An event posted to a conversation.
#[derive(Debug, Deserialize)]
pub struct EventRequest {
    pub event: IntakeEvent,

    /// Who is talking. Defaults to the chat itself for a new session.
    pub requester: Option<Requester>,
}

/// A payment link handed to the manager.
#[derive(Debug, Serialize, Deserialize)]
pub struct LinkResponse {
    pub order_id: Uuid,
    pub payment_id: String,
    pub payment_url: Option<String>,
    pub amount: Amount,
    pub method: PaymentMethod,
    /// Whether the payment was queued for tracking.
    pub tracking: bool,
}

/// Apply a conversational event.
pub async fn post_event(
    State(state): State<AppState>,
    Path(chat_id): Path<i64>,
    Json(req): Json<EventRequest>,
) -> ApiResult<Json<StepView>> {
    let chat_id = ChatId(chat_id);
    let session = state.session_or_create(chat_id, req.requester).await;
    let mut session = session.lock().await;

    session
        .apply(req.event)
        .map(Json)
        .map_err(|e| ApiError::from(e).with_view(session.view()))
}

/// Request a payment link for the confirmed order and start tracking it.
pub async fn request_link(
    State(state): State<AppState>,
    Path(chat_id): Path<i64>,
) -> ApiResult<Json<LinkResponse>> {
    let chat_id = ChatId(chat_id);
    let session = state
        .session(chat_id)
        .await
        .ok_or_else(|| PaydeskError::invalid_transition("Idle", "RequestLink"))?;
    let mut session = session.lock().await;

    let issued = match session.request_link(state.gateway.as_ref()).await {
        Ok(issued) => issued,
        Err(e) => return Err(ApiError::from(e).with_view(session.view())),
    };
    drop(session);

    let response = LinkResponse {
        order_id: issued.payment.order_id,
        payment_id: issued.payment.payment_id.clone(),
        payment_url: issued.payment.payment_url.clone(),
        amount: issued.payment.amount,
        method: issued.method,
        tracking: false,
    };

    let tracking = TrackingSession::new(issued.chat_id, issued.order, issued.method, issued.payment);
    let tracking = match state.tracker.submit(tracking) {
        Ok(()) => true,
        Err(e) => {
            warn!(
                chat_id = %chat_id,
                order_id = %response.order_id,
                error = %e,
                "Payment issued but not tracked"
            );
            false
        }
    };

    info!(chat_id = %chat_id, order_id = %response.order_id, tracking, "Payment link issued");
    Ok(Json(LinkResponse { tracking, ..response }))
}

/// Current state of a conversation. Unknown chats are idle.
pub async fn get_chat(State(state): State<AppState>, Path(chat_id): Path<i64>) -> Json<StepView> {
    let chat_id = ChatId(chat_id);
    let view = match state.session(chat_id).await {
        Some(session) => {
            let session = session.lock().await;
            session.view()
        }
        None => idle_view(chat_id),
    };
    Json(view)
}

/// Drop the draft and forget the conversation.
pub async fn cancel_chat(State(state): State<AppState>, Path(chat_id): Path<i64>) -> Json<StepView> {
    let chat_id = ChatId(chat_id);
    if let Some(session) = state.session(chat_id).await {
        session.lock().await.cancel();
        state.remove_session(chat_id).await;
    }
    Json(idle_view(chat_id))
}

fn idle_view(chat_id: ChatId) -> StepView {
    OrderSession::new(chat_id, Requester::new(chat_id.0, None)).view()
}
