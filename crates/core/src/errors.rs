use rust_decimal::Decimal;
use thiserror::Error;

/// Rule-boundary rejections. These surface to the oracle as tool error text.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error("order total must be non-negative, got {0}")]
    NegativeOrderTotal(Decimal),
    #[error("days since delivery must be non-negative, got {0}")]
    InvalidDaysSinceDelivery(i64),
    #[error("unknown {kind} `{value}` (expected {expected})")]
    UnknownVariant { kind: &'static str, value: String, expected: &'static str },
}

/// Caller-facing failure. The message stays internal; callers see `user_message()`.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum InterfaceError {
    #[error("bad request: {message}")]
    BadRequest { message: String, correlation_id: String },
}

impl InterfaceError {
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::BadRequest { .. } => {
                "The request could not be processed. Check inputs and try again."
            }
        }
    }

    pub fn correlation_id(&self) -> &str {
        match self {
            Self::BadRequest { correlation_id, .. } => correlation_id,
        }
    }
}
