//! Error types for Paydesk.

use thiserror::Error;

/// Rejection of user-supplied input during intake.
///
/// These are always recoverable: the same step is prompted again with the
/// error attached.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// A free-text field was empty after trimming.
    #[error("{field} must not be empty")]
    Empty { field: &'static str },

    /// The amount could not be parsed as a decimal number.
    #[error("enter a valid amount, for example 1000 or 1500.50")]
    NotANumber,

    /// The amount was zero or negative.
    #[error("amount must be greater than zero")]
    NonPositive,

    /// The amount exceeded the per-order ceiling.
    #[error("amount must not exceed {max}")]
    TooLarge { max: u32 },

    /// The payment method is not one of the supported methods.
    #[error("unknown payment method: {0}")]
    UnknownPaymentMethod(String),

    /// The console is not in the catalogue.
    #[error("unknown console: {0}")]
    UnknownConsole(String),

    /// The slot is not offered for the chosen console.
    #[error("slot {slot} is not available for {console}")]
    UnknownSlot { console: String, slot: String },
}

/// Main error type for Paydesk operations.
#[derive(Error, Debug, Clone)]
pub enum PaydeskError {
    /// User input failed validation.
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// The event has no transition from the current state.
    #[error("Event {event} is not allowed in state {state}")]
    InvalidTransition { state: String, event: String },

    /// Key material is malformed or signing failed.
    #[error("Signing error: {0}")]
    Signing(String),

    /// Connection failure or timeout talking to the gateway.
    #[error("Network error: {0}")]
    Network(String),

    /// The gateway answered 200 with a non-zero application code.
    #[error("Gateway rejected request (code {code}): {message}")]
    GatewayRejected { code: i64, message: String },

    /// The gateway answered with a non-200 status.
    #[error("Gateway returned HTTP {status}")]
    Http { status: u16 },

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// The tracking queue is closed or full.
    #[error("Tracking queue unavailable: {0}")]
    QueueClosed(String),

    /// Internal error (should not happen).
    #[error("Internal error: {0}")]
    Internal(String),
}

impl PaydeskError {
    /// Returns true if the user can fix this by re-entering input.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, PaydeskError::Validation(_) | PaydeskError::InvalidTransition { .. })
    }

    /// Returns true if repeating the same call may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            PaydeskError::Network(_) => true,
            PaydeskError::Http { status } => *status >= 500,
            _ => false,
        }
    }

    /// Shorthand for an invalid transition error.
    pub fn invalid_transition(state: impl std::fmt::Debug, event: impl std::fmt::Debug) -> Self {
        PaydeskError::InvalidTransition {
            state: format!("{:?}", state),
            event: format!("{:?}", event),
        }
    }
}

/// Convenience Result type for Paydesk operations.
pub type Result<T> = std::result::Result<T, PaydeskError>;

impl From<serde_json::Error> for PaydeskError {
    fn from(err: serde_json::Error) -> Self {
        PaydeskError::Serialization(err.to_string())
    }
}
