//! Payment Initiation, Finalization, and Verification
//!
//! The interactive half of the negotiation. Initiation requests the
//! consent-gated outgoing-payment grant and durably records the continuation
//! state *before* the user is handed the redirect URL, so the return leg can
//! always locate it. Finalization is idempotent: it runs only for records
//! whose `processed_at` is unset, and the final mark is an atomic conditional
//! update in the record store.

use serde::{Deserialize, Serialize};
use url::Url;
use uuid::Uuid;

use checkout_core::{PaymentRecord, PaymentRecordStore, PendingGrant, Quote, WalletDescriptor};

use crate::client::OpenPaymentsClient;
use crate::error::{PaymentError, Result};
use crate::protocol::{AccessAction, AccessItem, AccessLimits, GrantRequest};

/// A payment awaiting user consent
#[derive(Clone, Debug)]
pub struct PendingPayment {
    /// Generated id; keys the durable record and the finish callback
    pub payment_id: String,

    /// The pending grant, including where to send the user
    pub grant: PendingGrant,
}

impl PendingPayment {
    /// URL to redirect the user to for consent
    pub fn redirect_url(&self) -> &str {
        &self.grant.redirect_url
    }
}

/// Request an interactive outgoing-payment grant bound to a quote's amounts.
///
/// The grant's finish callback carries a fresh payment id and nonce so the
/// interaction reference coming back is bound to this specific negotiation.
/// The `PaymentRecord` write completes before this function returns.
pub async fn initiate_payment(
    client: &OpenPaymentsClient,
    records: &dyn PaymentRecordStore,
    sender: &WalletDescriptor,
    quote: &Quote,
) -> Result<PendingPayment> {
    let payment_id = Uuid::new_v4().to_string();
    let nonce = Uuid::new_v4().to_string();
    let finish_uri = finish_uri(&client.config().redirect_url, &payment_id)?;

    let request = GrantRequest::interactive(
        client.config().wallet_address.clone(),
        vec![AccessItem::outgoing_payment(
            sender.id.clone(),
            vec![AccessAction::Create, AccessAction::Read, AccessAction::List],
            AccessLimits {
                debit_amount: quote.debit_amount.clone(),
                receive_amount: quote.receive_amount.clone(),
            },
        )],
        finish_uri,
        nonce,
    );

    let grant = client
        .request_interactive_grant(&sender.auth_server, &request)
        .await?;

    let record = PaymentRecord::new(
        &payment_id,
        &sender.id,
        &grant.continue_token,
        &grant.continue_uri,
        &quote.id,
    );
    records.create(&record)?;

    tracing::info!(payment_id = %payment_id, wallet = %sender.id, "payment initiated, awaiting consent");

    Ok(PendingPayment { payment_id, grant })
}

/// Append the payment id to the configured redirect URL, keeping any query
/// the URL already carries intact
fn finish_uri(redirect_url: &str, payment_id: &str) -> Result<String> {
    let mut uri = Url::parse(redirect_url)
        .map_err(|_| PaymentError::Config("REDIRECT_URL is not a valid URL".into()))?;
    uri.query_pairs_mut().append_pair("paymentId", payment_id);
    Ok(uri.into())
}

/// Incoming payment to mark complete once the transfer is created (push flows)
#[derive(Clone, Debug)]
pub struct IncomingPaymentCompletion {
    pub url: String,
    pub access_token: String,
}

/// Handle for verifying a created outgoing payment
#[derive(Clone, Debug)]
pub struct OutgoingPaymentHandle {
    pub resource_url: String,
    pub access_token: String,
}

/// Continue the grant after consent, create the outgoing payment, and mark
/// the record processed.
///
/// Preconditions: the record has never been finalized. Any step failure fails
/// the whole call with its own taxonomy entry; `processed_at` is only set
/// after every upstream step succeeded.
pub async fn finalize_payment(
    client: &OpenPaymentsClient,
    records: &dyn PaymentRecordStore,
    record: &PaymentRecord,
    interact_ref: &str,
    completion: Option<IncomingPaymentCompletion>,
) -> Result<OutgoingPaymentHandle> {
    if record.processed_at.is_some() {
        return Err(PaymentError::AlreadyProcessed(record.id.clone()));
    }

    let access_token = client
        .continue_grant(&record.continue_uri, &record.continue_token, interact_ref)
        .await?;

    let outgoing = client
        .create_outgoing_payment(&record.wallet_address, &access_token, &record.quote_id, None)
        .await?;

    if let Some(completion) = completion {
        client
            .complete_incoming_payment(&completion.url, &completion.access_token)
            .await?;
    }

    // Atomic check-and-set: a racing finalize loses here, not at the check
    // above.
    records.mark_processed(&record.id)?;

    tracing::info!(payment_id = %record.id, outgoing_payment = %outgoing.id, "payment finalized");

    Ok(OutgoingPaymentHandle {
        resource_url: outgoing.id,
        access_token,
    })
}

/// Terminal outcome rendered to the user
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentResult {
    pub message: String,
    pub color: ResultColor,
    pub error: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultColor {
    Green,
    Red,
}

impl PaymentResult {
    pub fn success() -> Self {
        Self {
            message: "Payment successful".into(),
            color: ResultColor::Green,
            error: false,
        }
    }

    /// Decline is a non-error terminal state, rendered red but not as a fault
    pub fn declined() -> Self {
        Self {
            message: "Payment was successfully declined".into(),
            color: ResultColor::Red,
            error: false,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            color: ResultColor::Red,
            error: true,
        }
    }
}

/// Fetch the outgoing payment and inspect its settlement state.
///
/// Performed once, asynchronously relative to page render. A fetch failure or
/// a terminal-failure state is final for this request; the user restarts the
/// flow rather than the server retrying.
pub async fn verify_payment(
    client: &OpenPaymentsClient,
    handle: &OutgoingPaymentHandle,
) -> PaymentResult {
    match client
        .get_outgoing_payment(&handle.resource_url, &handle.access_token)
        .await
    {
        Ok(payment) if payment.failed => {
            tracing::warn!(outgoing_payment = %payment.id, "outgoing payment reported failed");
            PaymentResult::failure("Payment failed")
        }
        Ok(_) => PaymentResult::success(),
        Err(_) => PaymentResult::failure("An error occurred while checking your payment"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use checkout_core::MemoryPaymentRecordStore;
    use chrono::Utc;

    use crate::client::{ClientConfig, OpenPaymentsClient};

    fn test_client() -> OpenPaymentsClient {
        OpenPaymentsClient::new(ClientConfig::new(
            "https://wallet.example/shop",
            "https://shop.example/finish",
        ))
    }

    #[tokio::test]
    async fn test_finalize_rejects_processed_record() {
        let client = test_client();
        let records = MemoryPaymentRecordStore::new();
        let mut record = PaymentRecord::new(
            "p1",
            "https://wallet.example/alice",
            "continue-token",
            "https://auth.example/continue/1",
            "https://rs.example/quotes/1",
        );
        record.processed_at = Some(Utc::now());

        // Rejected before any network call is attempted.
        let result = finalize_payment(&client, &records, &record, "ref-1", None).await;
        assert!(matches!(result, Err(PaymentError::AlreadyProcessed(_))));
    }

    #[test]
    fn test_finish_uri_preserves_existing_query() {
        assert_eq!(
            finish_uri("https://shop.example/finish", "p1").unwrap(),
            "https://shop.example/finish?paymentId=p1"
        );
        assert_eq!(
            finish_uri("https://shop.example/finish?lang=en", "p1").unwrap(),
            "https://shop.example/finish?lang=en&paymentId=p1"
        );
        assert!(finish_uri("not a url", "p1").is_err());
    }

    #[test]
    fn test_result_shapes() {
        assert!(!PaymentResult::success().error);
        let declined = PaymentResult::declined();
        assert_eq!(declined.color, ResultColor::Red);
        assert!(!declined.error);
        let failed = PaymentResult::failure("boom");
        assert_eq!(failed.color, ResultColor::Red);
        assert!(failed.error);
    }

    #[test]
    fn test_result_color_serialization() {
        let result = PaymentResult::success();
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["color"], "green");
        assert_eq!(json["error"], false);
    }
}
