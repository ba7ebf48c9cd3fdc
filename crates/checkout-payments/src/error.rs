//! Payment Error Types
//!
//! Every network-facing call site catches the upstream error, logs the detail,
//! and re-throws one of these variants with a fixed user-safe message. Nothing
//! from an upstream response body ever reaches the user.

use checkout_core::CoreError;
use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, PaymentError>;

/// Payment negotiation errors
#[derive(Error, Debug)]
pub enum PaymentError {
    /// Wallet lookup failed or the pointer was malformed
    #[error("Wallet address is not valid")]
    InvalidWalletAddress,

    /// Grant came back interactive where non-interactive was expected, or
    /// vice versa
    #[error("Unexpected grant shape: {0}")]
    UnexpectedGrantShape(&'static str),

    /// Authorization server rejected or failed the grant request
    #[error("Unable to request grant")]
    GrantRequestFailed,

    /// Receiver-side incoming payment could not be created
    #[error("Unable to create incoming payment")]
    IncomingPaymentCreationFailed,

    /// Quote creation failed at the sender's resource server
    #[error("Could not create quote for receiver {0}")]
    QuoteCreationFailed(String),

    /// Exchanging the interaction reference for a token failed
    #[error("Unable to continue grant")]
    GrantContinuationFailed,

    /// Outgoing payment could not be created after consent
    #[error("Unable to create outgoing payment")]
    OutgoingPaymentCreationFailed,

    /// Incoming payment could not be marked complete
    #[error("Unable to complete incoming payment")]
    IncomingPaymentCompletionFailed,

    /// Session state missing or past its TTL
    #[error("Payment session expired")]
    SessionExpired,

    /// Finalization was already performed for this payment
    #[error("Payment already processed: {0}")]
    AlreadyProcessed(String),

    /// No record exists for the given payment id
    #[error("Payment not found: {0}")]
    PaymentNotFound(String),

    /// Amount was malformed or out of range
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    /// Card processor error
    #[error("Card processing error: {0}")]
    Card(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Storage backend error
    #[error("Storage error: {0}")]
    Storage(String),
}

impl PaymentError {
    /// Whether the UI should offer "try again" rather than a hard error page
    pub fn is_restartable(&self) -> bool {
        matches!(
            self,
            PaymentError::SessionExpired
                | PaymentError::InvalidWalletAddress
                | PaymentError::InvalidAmount(_)
        )
    }

    /// Convert to a user-friendly message
    pub fn user_message(&self) -> String {
        match self {
            PaymentError::InvalidWalletAddress => "Wallet address is not valid.".into(),
            PaymentError::UnexpectedGrantShape(_) => {
                "The wallet provider returned an unexpected authorization response.".into()
            }
            PaymentError::GrantRequestFailed => {
                "The wallet provider refused the payment authorization.".into()
            }
            PaymentError::IncomingPaymentCreationFailed => {
                "Unable to create incoming payment.".into()
            }
            PaymentError::QuoteCreationFailed(receiver) => {
                format!("Could not create quote for receiver {receiver}.")
            }
            PaymentError::GrantContinuationFailed => {
                "Unable to confirm the payment authorization.".into()
            }
            PaymentError::OutgoingPaymentCreationFailed => {
                "Unable to send the payment.".into()
            }
            PaymentError::IncomingPaymentCompletionFailed => {
                "The payment was sent but could not be marked complete.".into()
            }
            PaymentError::SessionExpired => "Payment session expired.".into(),
            PaymentError::AlreadyProcessed(_) => "This payment was already processed.".into(),
            PaymentError::PaymentNotFound(_) => "We could not find this payment.".into(),
            PaymentError::InvalidAmount(_) => "The amount entered is not valid.".into(),
            PaymentError::Card(_) => "Card payment processing failed. Please try again.".into(),
            _ => "An error occurred processing your request.".into(),
        }
    }
}

impl From<CoreError> for PaymentError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::SessionExpired => PaymentError::SessionExpired,
            CoreError::InvalidWalletAddress => PaymentError::InvalidWalletAddress,
            CoreError::InvalidAmount(detail) => PaymentError::InvalidAmount(detail),
            CoreError::PaymentNotFound(id) => PaymentError::PaymentNotFound(id),
            CoreError::AlreadyProcessed(id) => PaymentError::AlreadyProcessed(id),
            CoreError::Storage(detail) => PaymentError::Storage(detail),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_core_errors_keep_their_identity() {
        assert!(matches!(
            PaymentError::from(CoreError::SessionExpired),
            PaymentError::SessionExpired
        ));
        assert!(matches!(
            PaymentError::from(CoreError::AlreadyProcessed("p1".into())),
            PaymentError::AlreadyProcessed(_)
        ));
    }

    #[test]
    fn test_restartable_errors() {
        assert!(PaymentError::SessionExpired.is_restartable());
        assert!(!PaymentError::GrantContinuationFailed.is_restartable());
    }
}
