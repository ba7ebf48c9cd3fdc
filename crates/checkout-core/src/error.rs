//! Core Error Types

use thiserror::Error;

/// Result type alias for core operations
pub type Result<T> = std::result::Result<T, CoreError>;

/// Errors raised by the data model and the session/record stores
#[derive(Error, Debug)]
pub enum CoreError {
    /// Amount string could not be parsed or overflowed
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    /// Wallet address string is not a well-formed pointer or URL
    #[error("Invalid wallet address")]
    InvalidWalletAddress,

    /// Session state outlived its TTL or was never established
    #[error("Payment session expired")]
    SessionExpired,

    /// Payment record not found in the store
    #[error("Payment not found: {0}")]
    PaymentNotFound(String),

    /// Finalization was already performed for this record
    #[error("Payment already processed: {0}")]
    AlreadyProcessed(String),

    /// Storage backend error
    #[error("Storage error: {0}")]
    Storage(String),
}

impl CoreError {
    /// Whether the caller can recover by restarting the flow from the start
    pub fn is_restartable(&self) -> bool {
        matches!(
            self,
            CoreError::SessionExpired | CoreError::InvalidWalletAddress | CoreError::InvalidAmount(_)
        )
    }

    /// Convert to a user-friendly message
    pub fn user_message(&self) -> String {
        match self {
            CoreError::InvalidAmount(_) => "The amount entered is not valid.".into(),
            CoreError::InvalidWalletAddress => "Wallet address is not valid.".into(),
            CoreError::SessionExpired => "Payment session expired.".into(),
            CoreError::PaymentNotFound(_) => "We could not find this payment.".into(),
            CoreError::AlreadyProcessed(_) => "This payment was already processed.".into(),
            _ => "An unexpected error occurred.".into(),
        }
    }
}
