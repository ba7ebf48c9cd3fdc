//! Quotes
//!
//! A quote binds how much the sender debits to how much the receiver gets for
//! one transfer. Quotes are short-lived (tied to an incoming payment with an
//! expiry measured in minutes) and single-use: one quote initiates exactly one
//! outgoing-payment grant.

use serde::{Deserialize, Serialize};

use crate::amount::Amount;
use crate::error::Result;

/// A binding quote for a single transfer
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    /// Quote resource URL
    pub id: String,

    /// What the sender will be debited
    pub debit_amount: Amount,

    /// What the receiver will get
    pub receive_amount: Amount,

    /// Sender wallet address the quote was created against
    pub wallet_address: String,

    /// Incoming payment URL this quote pays into
    pub receiver: String,

    /// Access token of the incoming-payment grant, carried so the incoming
    /// payment can be completed at finalization without re-deriving the grant
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub incoming_payment_grant_token: Option<String>,
}

impl Quote {
    /// Network fee implied by this quote, in debit-asset minor units
    pub fn fee(&self) -> Result<u128> {
        Amount::fee(&self.debit_amount, &self.receive_amount)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quote(debit: u128, receive: u128) -> Quote {
        Quote {
            id: "https://rs.example/quotes/1".into(),
            debit_amount: Amount::from_minor_units(debit, "USD", 2),
            receive_amount: Amount::from_minor_units(receive, "USD", 2),
            wallet_address: "https://wallet.example/alice".into(),
            receiver: "https://rs.example/incoming-payments/1".into(),
            incoming_payment_grant_token: None,
        }
    }

    #[test]
    fn test_fee() {
        assert_eq!(quote(1000, 975).fee().unwrap(), 25);
        assert_eq!(quote(1000, 1000).fee().unwrap(), 0);
    }

    #[test]
    fn test_fee_rejects_receive_above_debit() {
        assert!(quote(975, 1000).fee().is_err());
    }
}
