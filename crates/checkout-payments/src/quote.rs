//! Quote Engine
//!
//! Turns two wallet addresses and an amount into a binding quote through the
//! two-party grant + incoming-payment + quote sequence. The anchoring of the
//! quote is an explicit [`QuotePolicy`]: push payments quote by the debit
//! amount the sender chose, request/pull payments quote by the receiver's
//! amount with no debit amount supplied. There are no retries; any step
//! failure ends the attempt and the caller abandons its session state.

use chrono::{Duration, Utc};

use checkout_core::{Amount, Quote, WalletDescriptor};

use crate::client::OpenPaymentsClient;
use crate::error::Result;
use crate::protocol::{
    AccessAction, AccessItem, GrantRequest, IncomingPayment, IncomingPaymentRequest,
    PaymentMetadata, QuoteRequest,
};

/// Expiry of the incoming payment backing a checkout quote
const QUOTE_PAYMENT_TTL_MINUTES: i64 = 10;

/// Expiry of a shareable payment request
const REQUEST_PAYMENT_TTL_MINUTES: i64 = 60;

/// Which side of the transfer anchors the quote
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum QuotePolicy {
    /// Sender specifies what they send; the network computes the receive side
    DebitAmount(Amount),

    /// The incoming payment's amount drives the quote; no debit amount is
    /// supplied
    ReceiveAmount,
}

impl QuotePolicy {
    fn into_debit_amount(self) -> Option<Amount> {
        match self {
            QuotePolicy::DebitAmount(amount) => Some(amount),
            QuotePolicy::ReceiveAmount => None,
        }
    }
}

/// A push-payment quote together with the wallets it was negotiated between,
/// kept for the session state the caller carries across page loads
#[derive(Clone, Debug)]
pub struct CheckoutQuote {
    pub sender: WalletDescriptor,
    pub receiver: WalletDescriptor,
    pub quote: Quote,
}

/// A request-payment quote with the payer's resolved wallet
#[derive(Clone, Debug)]
pub struct RequestQuote {
    pub sender: WalletDescriptor,
    pub quote: Quote,
}

/// Quote a push payment: sender pays `amount` (major units, sender's asset)
/// into a fresh open-ended incoming payment at the receiver.
///
/// The quote carries the incoming-payment grant token so the incoming payment
/// can be completed at finalization.
pub async fn fetch_quote(
    client: &OpenPaymentsClient,
    sender_pointer: &str,
    receiver_pointer: &str,
    amount: &str,
    note: Option<&str>,
) -> Result<CheckoutQuote> {
    let sender = client.resolve_wallet(sender_pointer).await?;
    let receiver = client.resolve_wallet(receiver_pointer).await?;
    let quote = fetch_quote_resolved(client, &sender, &receiver, amount, note).await?;
    Ok(CheckoutQuote {
        sender,
        receiver,
        quote,
    })
}

async fn fetch_quote_resolved(
    client: &OpenPaymentsClient,
    sender: &WalletDescriptor,
    receiver: &WalletDescriptor,
    amount: &str,
    note: Option<&str>,
) -> Result<Quote> {
    let debit_amount = Amount::from_major_units(amount, &sender.asset_code, sender.asset_scale)?;

    let incoming_token = client
        .request_non_interactive_grant(
            &receiver.auth_server,
            &GrantRequest::non_interactive(
                client.config().wallet_address.clone(),
                vec![AccessItem::incoming_payment(vec![
                    AccessAction::Read,
                    AccessAction::Create,
                    AccessAction::Complete,
                ])],
            ),
        )
        .await?;

    // Open-ended: the quote's receive amount bounds what actually arrives.
    let incoming_payment = client
        .create_incoming_payment(
            receiver,
            &incoming_token,
            &IncomingPaymentRequest {
                wallet_address: receiver.id.clone(),
                incoming_amount: None,
                metadata: note_metadata(note),
                expires_at: Some(Utc::now() + Duration::minutes(QUOTE_PAYMENT_TTL_MINUTES)),
            },
        )
        .await?;

    quote_incoming_payment(
        client,
        sender,
        &incoming_payment.id,
        QuotePolicy::DebitAmount(debit_amount),
        Some(incoming_token),
    )
    .await
}

/// Quote a payment into an existing incoming payment (pull/request flow)
pub async fn fetch_request_quote(
    client: &OpenPaymentsClient,
    sender_pointer: &str,
    incoming_payment_url: &str,
) -> Result<RequestQuote> {
    let sender = client.resolve_wallet(sender_pointer).await?;
    let quote = quote_incoming_payment(
        client,
        &sender,
        incoming_payment_url,
        QuotePolicy::ReceiveAmount,
        None,
    )
    .await?;
    Ok(RequestQuote { sender, quote })
}

/// Grant + quote against the sender's servers for a known incoming payment
pub async fn quote_incoming_payment(
    client: &OpenPaymentsClient,
    sender: &WalletDescriptor,
    incoming_payment_url: &str,
    policy: QuotePolicy,
    incoming_payment_grant_token: Option<String>,
) -> Result<Quote> {
    let quote_token = client
        .request_non_interactive_grant(
            &sender.auth_server,
            &GrantRequest::non_interactive(
                client.config().wallet_address.clone(),
                vec![AccessItem::quote(vec![
                    AccessAction::Create,
                    AccessAction::Read,
                ])],
            ),
        )
        .await?;

    let response = client
        .create_quote(
            sender,
            &quote_token,
            &QuoteRequest {
                method: "ilp".into(),
                wallet_address: sender.id.clone(),
                receiver: incoming_payment_url.to_string(),
                debit_amount: policy.into_debit_amount(),
            },
        )
        .await?;

    Ok(Quote {
        id: response.id,
        debit_amount: response.debit_amount,
        receive_amount: response.receive_amount,
        wallet_address: response.wallet_address,
        receiver: response.receiver,
        incoming_payment_grant_token,
    })
}

/// Create a shareable payment request: an incoming payment carrying the
/// requested amount and note, paid later via [`fetch_request_quote`]
pub async fn create_request_payment(
    client: &OpenPaymentsClient,
    receiver_pointer: &str,
    amount: &str,
    note: Option<&str>,
) -> Result<IncomingPayment> {
    let receiver = client.resolve_wallet(receiver_pointer).await?;
    let requested =
        Amount::from_major_units(amount, &receiver.asset_code, receiver.asset_scale)?;

    let token = client
        .request_non_interactive_grant(
            &receiver.auth_server,
            &GrantRequest::non_interactive(
                client.config().wallet_address.clone(),
                vec![AccessItem::incoming_payment(vec![
                    AccessAction::Read,
                    AccessAction::Create,
                ])],
            ),
        )
        .await?;

    client
        .create_incoming_payment(
            &receiver,
            &token,
            &IncomingPaymentRequest {
                wallet_address: receiver.id.clone(),
                incoming_amount: Some(requested),
                metadata: note_metadata(note),
                expires_at: Some(Utc::now() + Duration::minutes(REQUEST_PAYMENT_TTL_MINUTES)),
            },
        )
        .await
}

/// Read back a requested payment so the payer can review amount, note, and
/// date before paying
pub async fn request_payment_details(
    client: &OpenPaymentsClient,
    incoming_payment_url: &str,
    receiver_pointer: &str,
) -> Result<IncomingPayment> {
    let receiver = client.resolve_wallet(receiver_pointer).await?;

    let token = client
        .request_non_interactive_grant(
            &receiver.auth_server,
            &GrantRequest::non_interactive(
                client.config().wallet_address.clone(),
                vec![AccessItem::incoming_payment(vec![AccessAction::Read])],
            ),
        )
        .await?;

    client
        .get_incoming_payment(incoming_payment_url, &token)
        .await
}

fn note_metadata(note: Option<&str>) -> Option<PaymentMetadata> {
    note.filter(|note| !note.trim().is_empty())
        .map(|note| PaymentMetadata {
            description: Some(note.to_string()),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_to_debit_amount() {
        let amount = Amount::from_minor_units(1000, "USD", 2);
        assert_eq!(
            QuotePolicy::DebitAmount(amount.clone()).into_debit_amount(),
            Some(amount)
        );
        assert_eq!(QuotePolicy::ReceiveAmount.into_debit_amount(), None);
    }

    #[test]
    fn test_note_metadata_skips_blank_notes() {
        assert!(note_metadata(None).is_none());
        assert!(note_metadata(Some("  ")).is_none());
        assert_eq!(
            note_metadata(Some("lunch")).unwrap().description.as_deref(),
            Some("lunch")
        );
    }
}
