//! Card Processor Path
//!
//! The alternate leaf payment method: a Stripe payment intent created by
//! amount and currency, confirmed client-side, and read back after the
//! processor redirects the user to the result page. Treated as a black box
//! that ends in the same success/failure result shape as the Open Payments
//! flow.

use serde::{Deserialize, Serialize};
use stripe::{
    Client, CreatePaymentIntent, CreatePaymentIntentAutomaticPaymentMethods, Currency,
    PaymentIntent, PaymentIntentId,
};

use crate::error::{PaymentError, Result};

/// Stripe client wrapper
pub struct CardClient {
    client: Client,
}

impl CardClient {
    /// Create a new card client
    pub fn new(secret_key: &str) -> Self {
        Self {
            client: Client::new(secret_key),
        }
    }

    /// Create from environment variables
    pub fn from_env() -> Result<Self> {
        let secret_key = std::env::var("STRIPE_SECRET_KEY")
            .map_err(|_| PaymentError::Config("STRIPE_SECRET_KEY not set".into()))?;
        Ok(Self::new(&secret_key))
    }

    /// Create a payment intent for `amount_minor` units of `currency`.
    ///
    /// The returned client secret drives the processor's embedded payment
    /// element on the frontend.
    pub async fn create_payment_intent(
        &self,
        amount_minor: i64,
        currency: &str,
    ) -> Result<CardPaymentIntent> {
        let currency = currency
            .to_lowercase()
            .parse::<Currency>()
            .map_err(|_| PaymentError::Card(format!("unsupported currency {currency}")))?;

        let mut params = CreatePaymentIntent::new(amount_minor, currency);
        params.automatic_payment_methods = Some(CreatePaymentIntentAutomaticPaymentMethods {
            enabled: true,
            allow_redirects: None,
        });

        let intent = PaymentIntent::create(&self.client, params)
            .await
            .map_err(|err| {
                tracing::error!(error = %err, "payment intent creation failed");
                PaymentError::Card("payment intent creation failed".into())
            })?;

        Ok(CardPaymentIntent::from(intent))
    }

    /// Retrieve a payment intent after the processor redirect
    pub async fn retrieve_payment_intent(&self, id: &str) -> Result<CardPaymentIntent> {
        let id = id
            .parse::<PaymentIntentId>()
            .map_err(|_| PaymentError::Card("malformed payment intent id".into()))?;

        let intent = PaymentIntent::retrieve(&self.client, &id, &[])
            .await
            .map_err(|err| {
                tracing::error!(error = %err, "payment intent retrieval failed");
                PaymentError::Card("payment intent retrieval failed".into())
            })?;

        Ok(CardPaymentIntent::from(intent))
    }
}

/// The slice of a payment intent the checkout cares about
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CardPaymentIntent {
    pub id: String,
    pub amount: i64,
    pub currency: String,
    pub status: String,
    pub client_secret: Option<String>,
}

impl CardPaymentIntent {
    /// Whether the processor reports the payment settled
    pub fn is_succeeded(&self) -> bool {
        self.status == "succeeded"
    }
}

impl From<PaymentIntent> for CardPaymentIntent {
    fn from(intent: PaymentIntent) -> Self {
        Self {
            id: intent.id.to_string(),
            amount: intent.amount,
            currency: intent.currency.to_string(),
            status: intent.status.to_string(),
            client_secret: intent.client_secret,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_succeeded_status() {
        let intent = CardPaymentIntent {
            id: "pi_1".into(),
            amount: 1000,
            currency: "eur".into(),
            status: "succeeded".into(),
            client_secret: None,
        };
        assert!(intent.is_succeeded());

        let pending = CardPaymentIntent {
            status: "requires_payment_method".into(),
            ..intent
        };
        assert!(!pending.is_succeeded());
    }
}
