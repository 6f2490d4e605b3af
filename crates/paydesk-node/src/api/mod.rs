//! HTTP API.

pub mod chats;
pub mod health;
pub mod payments;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use paydesk_core::PaydeskError;
use paydesk_intake::StepView;
use serde::Serialize;
use tracing::error;

/// Error body returned by every endpoint.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    /// Where the conversation stands after the failed request.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub view: Option<StepView>,
}

/// A failed request.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub body: ErrorBody,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            body: ErrorBody {
                error: message.into(),
                view: None,
            },
        }
    }

    pub fn with_view(mut self, view: StepView) -> Self {
        self.body.view = Some(view);
        self
    }
}

impl From<PaydeskError> for ApiError {
    fn from(err: PaydeskError) -> Self {
        match &err {
            PaydeskError::Validation(e) => Self::new(StatusCode::UNPROCESSABLE_ENTITY, e.to_string()),
            PaydeskError::InvalidTransition { .. } => Self::new(StatusCode::CONFLICT, err.to_string()),
            PaydeskError::Network(_)
            | PaydeskError::GatewayRejected { .. }
            | PaydeskError::Http { .. } => Self::new(StatusCode::BAD_GATEWAY, err.to_string()),
            PaydeskError::QueueClosed(_) => {
                Self::new(StatusCode::SERVICE_UNAVAILABLE, err.to_string())
            }
            PaydeskError::Signing(_) | PaydeskError::Serialization(_) | PaydeskError::Internal(_) => {
                error!(error = %err, "Request failed");
                Self::new(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "could not create the payment, try again later",
                )
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
