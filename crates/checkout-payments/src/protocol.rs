//! Open Payments Wire Types
//!
//! Request and response bodies for the access-grant pattern: grant requests
//! against authorization servers (snake_case GNAP fields) and resource
//! creation against resource servers (camelCase bodies). Grant responses are
//! deserialized into a permissive shape and then explicitly classified into
//! the [`Grant`] union, never coerced.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use checkout_core::{Amount, Grant, NonInteractiveGrant, PendingGrant};

use crate::error::{PaymentError, Result};

// ============================================================================
// Grant requests
// ============================================================================

/// Body of a `POST {authServer}` grant request
#[derive(Clone, Debug, Serialize)]
pub struct GrantRequest {
    pub access_token: AccessTokenRequest,

    /// Wallet address identifying this client to the authorization server
    pub client: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub interact: Option<InteractRequest>,
}

impl GrantRequest {
    /// A grant the caller expects back immediately, with no consent step
    pub fn non_interactive(client: impl Into<String>, access: Vec<AccessItem>) -> Self {
        Self {
            access_token: AccessTokenRequest { access },
            client: client.into(),
            interact: None,
        }
    }

    /// A grant requiring redirect-based consent, finishing at `finish_uri`
    /// with `nonce` bound to the negotiation
    pub fn interactive(
        client: impl Into<String>,
        access: Vec<AccessItem>,
        finish_uri: impl Into<String>,
        nonce: impl Into<String>,
    ) -> Self {
        Self {
            access_token: AccessTokenRequest { access },
            client: client.into(),
            interact: Some(InteractRequest {
                start: vec!["redirect".into()],
                finish: Some(FinishRequest {
                    method: "redirect".into(),
                    uri: finish_uri.into(),
                    nonce: nonce.into(),
                }),
            }),
        }
    }

    /// Nonce embedded in the finish callback, if any
    pub fn finish_nonce(&self) -> Option<&str> {
        self.interact
            .as_ref()
            .and_then(|i| i.finish.as_ref())
            .map(|f| f.nonce.as_str())
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct AccessTokenRequest {
    pub access: Vec<AccessItem>,
}

/// One entry of the requested access array
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessItem {
    #[serde(rename = "type")]
    pub resource_type: ResourceType,

    pub actions: Vec<AccessAction>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub identifier: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub limits: Option<AccessLimits>,
}

impl AccessItem {
    pub fn incoming_payment(actions: Vec<AccessAction>) -> Self {
        Self {
            resource_type: ResourceType::IncomingPayment,
            actions,
            identifier: None,
            limits: None,
        }
    }

    pub fn quote(actions: Vec<AccessAction>) -> Self {
        Self {
            resource_type: ResourceType::Quote,
            actions,
            identifier: None,
            limits: None,
        }
    }

    pub fn outgoing_payment(
        identifier: impl Into<String>,
        actions: Vec<AccessAction>,
        limits: AccessLimits,
    ) -> Self {
        Self {
            resource_type: ResourceType::OutgoingPayment,
            actions,
            identifier: Some(identifier.into()),
            limits: Some(limits),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResourceType {
    IncomingPayment,
    Quote,
    OutgoingPayment,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessAction {
    Read,
    Create,
    List,
    Complete,
}

/// Amount bounds for an outgoing-payment grant
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessLimits {
    pub debit_amount: Amount,
    pub receive_amount: Amount,
}

#[derive(Clone, Debug, Serialize)]
pub struct InteractRequest {
    pub start: Vec<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub finish: Option<FinishRequest>,
}

#[derive(Clone, Debug, Serialize)]
pub struct FinishRequest {
    pub method: String,
    pub uri: String,
    pub nonce: String,
}

// ============================================================================
// Grant responses
// ============================================================================

#[derive(Clone, Debug, Deserialize)]
pub struct TokenValue {
    pub value: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct InteractRedirect {
    pub redirect: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct ContinueInfo {
    pub access_token: TokenValue,
    pub uri: String,
}

/// Raw grant response before classification
#[derive(Clone, Debug, Deserialize)]
pub struct GrantResponse {
    #[serde(default)]
    pub access_token: Option<TokenValue>,

    #[serde(default)]
    pub interact: Option<InteractRedirect>,

    #[serde(default, rename = "continue")]
    pub continuation: Option<ContinueInfo>,
}

impl GrantResponse {
    /// Classify into the [`Grant`] union.
    ///
    /// A usable token must come without an interaction; a pending grant must
    /// carry both the redirect and a continuation. Anything else, including a
    /// response claiming to be both at once, is rejected.
    pub fn classify(self, nonce: Option<&str>) -> Result<Grant> {
        match (self.access_token, self.interact, self.continuation) {
            (Some(token), None, _) => Ok(Grant::NonInteractive(NonInteractiveGrant {
                access_token: token.value,
            })),
            (None, Some(interact), Some(continuation)) => Ok(Grant::Pending(PendingGrant {
                continue_uri: continuation.uri,
                continue_token: continuation.access_token.value,
                redirect_url: interact.redirect,
                interaction_nonce: nonce.map(str::to_string),
            })),
            _ => Err(PaymentError::UnexpectedGrantShape(
                "grant response is neither authorized nor pending",
            )),
        }
    }
}

/// Body of `POST {continueUri}` exchanging consent for a token
#[derive(Clone, Debug, Serialize)]
pub struct ContinueRequest {
    pub interact_ref: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct ContinueResponse {
    #[serde(default)]
    pub access_token: Option<TokenValue>,
}

// ============================================================================
// Payment resources
// ============================================================================

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IncomingPaymentRequest {
    pub wallet_address: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub incoming_amount: Option<Amount>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<PaymentMetadata>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
}

/// A receiver-side incoming payment resource
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncomingPayment {
    pub id: String,
    pub wallet_address: String,

    #[serde(default)]
    pub incoming_amount: Option<Amount>,

    #[serde(default)]
    pub received_amount: Option<Amount>,

    #[serde(default)]
    pub completed: bool,

    #[serde(default)]
    pub metadata: Option<PaymentMetadata>,

    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,

    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteRequest {
    pub method: String,
    pub wallet_address: String,

    /// Incoming payment URL this quote pays into
    pub receiver: String,

    /// Present for push flows (sender chooses what to send); absent for
    /// request/pull flows where the network works back from the receive amount
    #[serde(skip_serializing_if = "Option::is_none")]
    pub debit_amount: Option<Amount>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteResponse {
    pub id: String,
    pub wallet_address: String,
    pub receiver: String,
    pub debit_amount: Amount,
    pub receive_amount: Amount,

    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OutgoingPaymentRequest {
    pub wallet_address: String,
    pub quote_id: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<PaymentMetadata>,
}

/// A sender-side outgoing payment resource
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutgoingPayment {
    pub id: String,
    pub wallet_address: String,

    #[serde(default)]
    pub quote_id: Option<String>,

    #[serde(default)]
    pub failed: bool,

    #[serde(default)]
    pub sent_amount: Option<Amount>,

    #[serde(default)]
    pub debit_amount: Option<Amount>,

    #[serde(default)]
    pub receive_amount: Option<Amount>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grant_request_shape() {
        let request = GrantRequest::non_interactive(
            "https://wallet.example/shop",
            vec![AccessItem::incoming_payment(vec![
                AccessAction::Read,
                AccessAction::Create,
                AccessAction::Complete,
            ])],
        );
        let json = serde_json::to_value(&request).unwrap();

        assert_eq!(json["access_token"]["access"][0]["type"], "incoming-payment");
        assert_eq!(
            json["access_token"]["access"][0]["actions"],
            serde_json::json!(["read", "create", "complete"])
        );
        assert!(json.get("interact").is_none());
    }

    #[test]
    fn test_interactive_grant_request_shape() {
        let limits = AccessLimits {
            debit_amount: Amount::from_minor_units(1000, "USD", 2),
            receive_amount: Amount::from_minor_units(990, "USD", 2),
        };
        let request = GrantRequest::interactive(
            "https://wallet.example/shop",
            vec![AccessItem::outgoing_payment(
                "https://wallet.example/alice",
                vec![AccessAction::Create, AccessAction::Read, AccessAction::List],
                limits,
            )],
            "https://shop.example/finish?paymentId=p1",
            "nonce-1",
        );
        let json = serde_json::to_value(&request).unwrap();

        assert_eq!(json["interact"]["start"], serde_json::json!(["redirect"]));
        assert_eq!(json["interact"]["finish"]["method"], "redirect");
        assert_eq!(json["interact"]["finish"]["nonce"], "nonce-1");
        let access = &json["access_token"]["access"][0];
        assert_eq!(access["identifier"], "https://wallet.example/alice");
        assert_eq!(access["limits"]["debitAmount"]["value"], "1000");
        assert_eq!(access["limits"]["receiveAmount"]["assetScale"], 2);
        assert_eq!(request.finish_nonce(), Some("nonce-1"));
    }

    #[test]
    fn test_classify_non_interactive() {
        let response: GrantResponse = serde_json::from_value(serde_json::json!({
            "access_token": { "value": "token-1" },
            "continue": { "access_token": { "value": "cont-1" }, "uri": "https://auth.example/continue/1" }
        }))
        .unwrap();

        let grant = response.classify(None).unwrap();
        assert_eq!(grant.access_token(), Some("token-1"));
    }

    #[test]
    fn test_classify_pending() {
        let response: GrantResponse = serde_json::from_value(serde_json::json!({
            "interact": { "redirect": "https://auth.example/interact/1" },
            "continue": { "access_token": { "value": "cont-1" }, "uri": "https://auth.example/continue/1" }
        }))
        .unwrap();

        let grant = response.classify(Some("nonce-1")).unwrap();
        let pending = grant.as_pending().unwrap();
        assert_eq!(pending.redirect_url, "https://auth.example/interact/1");
        assert_eq!(pending.continue_token, "cont-1");
        assert_eq!(pending.interaction_nonce.as_deref(), Some("nonce-1"));
    }

    #[test]
    fn test_classify_rejects_ambiguous_response() {
        // Claims to be both authorized and awaiting interaction.
        let response: GrantResponse = serde_json::from_value(serde_json::json!({
            "access_token": { "value": "token-1" },
            "interact": { "redirect": "https://auth.example/interact/1" },
            "continue": { "access_token": { "value": "cont-1" }, "uri": "https://auth.example/continue/1" }
        }))
        .unwrap();
        assert!(matches!(
            response.classify(None),
            Err(PaymentError::UnexpectedGrantShape(_))
        ));
    }

    #[test]
    fn test_classify_rejects_empty_response() {
        let response: GrantResponse = serde_json::from_value(serde_json::json!({})).unwrap();
        assert!(response.classify(None).is_err());
    }

    #[test]
    fn test_quote_request_omits_absent_debit_amount() {
        let request = QuoteRequest {
            method: "ilp".into(),
            wallet_address: "https://wallet.example/alice".into(),
            receiver: "https://rs.example/incoming-payments/1".into(),
            debit_amount: None,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert!(json.get("debitAmount").is_none());
        assert_eq!(json["walletAddress"], "https://wallet.example/alice");
    }

    #[test]
    fn test_incoming_payment_defaults() {
        let payment: IncomingPayment = serde_json::from_value(serde_json::json!({
            "id": "https://rs.example/incoming-payments/1",
            "walletAddress": "https://wallet.example/bob"
        }))
        .unwrap();
        assert!(!payment.completed);
        assert!(payment.incoming_amount.is_none());
    }
}
