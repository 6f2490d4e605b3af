//! Common types used across Paydesk.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// The single currency every payment is made in.
pub const CURRENCY: &str = "RUB";

/// Payment methods the gateway is asked to prefer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PaymentMethod {
    /// Bank card.
    #[serde(rename = "CARD_RU")]
    Card,
    /// SberPay wallet.
    #[serde(rename = "SBER_PAY")]
    SberPay,
    /// Fast Payment System (SBP).
    #[serde(rename = "SBP")]
    FastPayment,
}

impl PaymentMethod {
    pub const ALL: [PaymentMethod; 3] = [
        PaymentMethod::Card,
        PaymentMethod::SberPay,
        PaymentMethod::FastPayment,
    ];

    /// Human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            PaymentMethod::Card => "Bank card",
            PaymentMethod::SberPay => "SberPay",
            PaymentMethod::FastPayment => "SBP",
        }
    }
}

impl FromStr for PaymentMethod {
    type Err = ValidationError;

    /// Accepts the wire code or the enum name, case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "CARD" | "CARD_RU" => Ok(PaymentMethod::Card),
            "SBER_PAY" | "SBERPAY" => Ok(PaymentMethod::SberPay),
            "SBP" | "FAST_PAYMENT" => Ok(PaymentMethod::FastPayment),
            _ => Err(ValidationError::UnknownPaymentMethod(s.to_string())),
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Status of a payment as reported by the gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    /// Created, waiting for the payer.
    Pending,
    /// Paid.
    Success,
    /// Payment attempt failed.
    Fail,
    /// Cancelled by the payer.
    Cancel,
    /// Payment window elapsed.
    Expired,
    /// Anything the gateway reports that we do not recognise.
    #[serde(other)]
    Unknown,
}

impl PaymentStatus {
    /// Returns true if no further transition can occur.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            PaymentStatus::Success
                | PaymentStatus::Fail
                | PaymentStatus::Cancel
                | PaymentStatus::Expired
        )
    }

    /// Returns true for the terminal statuses that mean "not paid".
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            PaymentStatus::Fail | PaymentStatus::Cancel | PaymentStatus::Expired
        )
    }

    /// Short explanation of a failed status.
    pub fn reason(&self) -> &'static str {
        match self {
            PaymentStatus::Fail => "payment was not completed because of an error",
            PaymentStatus::Cancel => "payment was cancelled by the payer",
            PaymentStatus::Expired => "payment window expired",
            PaymentStatus::Success => "payment succeeded",
            PaymentStatus::Pending => "payment is pending",
            PaymentStatus::Unknown => "payment status is unknown",
        }
    }
}

/// Consoles offered in the product catalogue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Console {
    #[serde(rename = "PS4")]
    Ps4,
    #[serde(rename = "PS5")]
    Ps5,
}

/// Account slots sold for every console.
static SLOTS: [&str; 3] = ["П2", "П3", "П3.1"];

impl Console {
    pub fn as_str(&self) -> &'static str {
        match self {
            Console::Ps4 => "PS4",
            Console::Ps5 => "PS5",
        }
    }

    /// Slots that can be sold for this console.
    pub fn slots(&self) -> &'static [&'static str] {
        &SLOTS
    }

    /// Validate a slot choice against this console's catalogue entry.
    pub fn slot(&self, raw: &str) -> Result<String, ValidationError> {
        let raw = raw.trim();
        self.slots()
            .iter()
            .find(|s| s.eq_ignore_ascii_case(raw))
            .map(|s| s.to_string())
            .ok_or_else(|| ValidationError::UnknownSlot {
                console: self.as_str().to_string(),
                slot: raw.to_string(),
            })
    }
}

impl FromStr for Console {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "PS4" => Ok(Console::Ps4),
            "PS5" => Ok(Console::Ps5),
            _ => Err(ValidationError::UnknownConsole(s.to_string())),
        }
    }
}

impl fmt::Display for Console {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The two order shapes the intake can build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderKind {
    FreeSale,
    Product,
}

/// Conversation that receives notifications about a payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChatId(pub i64);

impl fmt::Display for ChatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The manager who is placing the order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Requester {
    pub id: i64,
    pub handle: Option<String>,
}

impl Requester {
    pub fn new(id: i64, handle: Option<String>) -> Self {
        Self { id, handle }
    }

    /// Handle as written to the ledger: `@name`, or the numeric id.
    pub fn display_handle(&self) -> String {
        match &self.handle {
            Some(handle) if !handle.is_empty() => format!("@{}", handle.trim_start_matches('@')),
            _ => self.id.to_string(),
        }
    }
}
