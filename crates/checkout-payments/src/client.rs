//! Open Payments Client
//!
//! A thin reqwest wrapper over the auth- and resource-server endpoints. The
//! client is constructed once at startup and injected into every flow; it
//! holds no per-payment state. Call sites translate transport failures into
//! the domain taxonomy and log the upstream detail; the raw error never
//! travels further up.

use reqwest::header::{ACCEPT, AUTHORIZATION};
use serde::de::DeserializeOwned;
use serde::Serialize;
use url::Url;

use checkout_core::{normalize_wallet_pointer, Grant, PendingGrant, WalletDescriptor};

use crate::error::{PaymentError, Result};
use crate::protocol::{
    ContinueRequest, ContinueResponse, GrantRequest, GrantResponse, IncomingPayment,
    IncomingPaymentRequest, OutgoingPayment, OutgoingPaymentRequest, QuoteRequest, QuoteResponse,
};

/// Client configuration, environment-driven
#[derive(Clone, Debug)]
pub struct ClientConfig {
    /// Wallet address identifying this application to authorization servers
    pub wallet_address: String,

    /// Base URL the authorization server redirects back to after consent;
    /// `?paymentId={id}` is appended per payment attempt
    pub redirect_url: String,
}

impl ClientConfig {
    pub fn new(wallet_address: impl Into<String>, redirect_url: impl Into<String>) -> Self {
        Self {
            wallet_address: wallet_address.into(),
            redirect_url: redirect_url.into(),
        }
    }

    /// Create from environment variables
    pub fn from_env() -> Result<Self> {
        let wallet_address = std::env::var("OP_WALLET_ADDRESS")
            .map_err(|_| PaymentError::Config("OP_WALLET_ADDRESS not set".into()))?;
        let redirect_url = std::env::var("REDIRECT_URL")
            .map_err(|_| PaymentError::Config("REDIRECT_URL not set".into()))?;
        Ok(Self::new(wallet_address, redirect_url))
    }
}

/// Client for wallet resolution, grant negotiation, and payment resources
pub struct OpenPaymentsClient {
    http: reqwest::Client,
    config: ClientConfig,
}

impl OpenPaymentsClient {
    pub fn new(config: ClientConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }

    /// Create from environment variables
    pub fn from_env() -> Result<Self> {
        Ok(Self::new(ClientConfig::from_env()?))
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    // ========================================================================
    // Wallet resolution
    // ========================================================================

    /// Resolve a human-entered address or `$`-pointer into a descriptor.
    ///
    /// Upstream failures are logged and collapsed into a generic
    /// `InvalidWalletAddress` so no lookup detail leaks to the user.
    pub async fn resolve_wallet(&self, pointer: &str) -> Result<WalletDescriptor> {
        let url = normalize_wallet_pointer(pointer)?;

        let send = self
            .http
            .get(&url)
            .header(ACCEPT, "application/json")
            .send()
            .await;
        let response = match send.and_then(reqwest::Response::error_for_status) {
            Ok(response) => response,
            Err(err) => {
                tracing::warn!(wallet = %url, error = %err, "wallet address lookup failed");
                return Err(PaymentError::InvalidWalletAddress);
            }
        };

        response.json::<WalletDescriptor>().await.map_err(|err| {
            tracing::warn!(wallet = %url, error = %err, "wallet address response malformed");
            PaymentError::InvalidWalletAddress
        })
    }

    // ========================================================================
    // Grant negotiation
    // ========================================================================

    /// Request a grant and classify the response shape
    pub async fn request_grant(&self, auth_server: &str, request: &GrantRequest) -> Result<Grant> {
        let nonce = request.finish_nonce().map(str::to_string);
        let response: GrantResponse = self
            .post_json(auth_server, None, request)
            .await
            .map_err(|err| {
                tracing::error!(auth_server = %auth_server, error = %err, "grant request failed");
                PaymentError::GrantRequestFailed
            })?;
        response.classify(nonce.as_deref())
    }

    /// Request a grant that must come back authorized immediately.
    ///
    /// A pending grant here would mean proceeding without user consent, so it
    /// is rejected outright.
    pub async fn request_non_interactive_grant(
        &self,
        auth_server: &str,
        request: &GrantRequest,
    ) -> Result<String> {
        match self.request_grant(auth_server, request).await? {
            Grant::NonInteractive(grant) => Ok(grant.access_token),
            Grant::Pending(_) => Err(PaymentError::UnexpectedGrantShape(
                "expected non-interactive grant, got pending",
            )),
        }
    }

    /// Request a grant that must require consent.
    ///
    /// An immediately-authorized grant here means the consent step was
    /// unexpectedly skipped; the payment must not proceed as if authorized.
    pub async fn request_interactive_grant(
        &self,
        auth_server: &str,
        request: &GrantRequest,
    ) -> Result<PendingGrant> {
        match self.request_grant(auth_server, request).await? {
            Grant::Pending(grant) => Ok(grant),
            Grant::NonInteractive(_) => Err(PaymentError::UnexpectedGrantShape(
                "expected interactive grant, got non-interactive",
            )),
        }
    }

    /// Exchange a completed interaction for a usable access token
    pub async fn continue_grant(
        &self,
        continue_uri: &str,
        continue_token: &str,
        interact_ref: &str,
    ) -> Result<String> {
        let request = ContinueRequest {
            interact_ref: interact_ref.to_string(),
        };
        let response: ContinueResponse = self
            .post_json(continue_uri, Some(continue_token), &request)
            .await
            .map_err(|err| {
                tracing::error!(error = %err, "grant continuation failed");
                PaymentError::GrantContinuationFailed
            })?;

        response
            .access_token
            .map(|token| token.value)
            .ok_or(PaymentError::GrantContinuationFailed)
    }

    // ========================================================================
    // Payment resources
    // ========================================================================

    pub async fn create_incoming_payment(
        &self,
        receiver: &WalletDescriptor,
        access_token: &str,
        request: &IncomingPaymentRequest,
    ) -> Result<IncomingPayment> {
        let endpoint = format!("{}/incoming-payments", receiver.resource_origin()?);
        self.post_json(&endpoint, Some(access_token), request)
            .await
            .map_err(|err| {
                tracing::error!(receiver = %receiver.id, error = %err, "incoming payment creation failed");
                PaymentError::IncomingPaymentCreationFailed
            })
    }

    pub async fn get_incoming_payment(
        &self,
        url: &str,
        access_token: &str,
    ) -> Result<IncomingPayment> {
        self.get_json(url, access_token).await.map_err(|err| {
            tracing::error!(url = %url, error = %err, "incoming payment fetch failed");
            PaymentError::IncomingPaymentCreationFailed
        })
    }

    /// Mark an incoming payment complete so it stops accepting funds
    pub async fn complete_incoming_payment(&self, url: &str, access_token: &str) -> Result<()> {
        let endpoint = format!("{}/complete", url.trim_end_matches('/'));
        let _: IncomingPayment = self
            .post_json(&endpoint, Some(access_token), &serde_json::json!({}))
            .await
            .map_err(|err| {
                tracing::error!(url = %url, error = %err, "incoming payment completion failed");
                PaymentError::IncomingPaymentCompletionFailed
            })?;
        Ok(())
    }

    pub async fn create_quote(
        &self,
        sender: &WalletDescriptor,
        access_token: &str,
        request: &QuoteRequest,
    ) -> Result<QuoteResponse> {
        let endpoint = format!("{}/quotes", sender.resource_origin()?);
        self.post_json(&endpoint, Some(access_token), request)
            .await
            .map_err(|err| {
                tracing::error!(receiver = %request.receiver, error = %err, "quote creation failed");
                PaymentError::QuoteCreationFailed(request.receiver.clone())
            })
    }

    pub async fn create_outgoing_payment(
        &self,
        wallet_address: &str,
        access_token: &str,
        quote_id: &str,
        description: Option<String>,
    ) -> Result<OutgoingPayment> {
        let endpoint = format!("{}/outgoing-payments", origin_of(wallet_address)?);
        let request = OutgoingPaymentRequest {
            wallet_address: wallet_address.to_string(),
            quote_id: quote_id.to_string(),
            metadata: description.map(|description| crate::protocol::PaymentMetadata {
                description: Some(description),
            }),
        };
        self.post_json(&endpoint, Some(access_token), &request)
            .await
            .map_err(|err| {
                tracing::error!(wallet = %wallet_address, error = %err, "outgoing payment creation failed");
                PaymentError::OutgoingPaymentCreationFailed
            })
    }

    pub async fn get_outgoing_payment(
        &self,
        url: &str,
        access_token: &str,
    ) -> Result<OutgoingPayment> {
        self.get_json(url, access_token).await.map_err(|err| {
            tracing::error!(url = %url, error = %err, "outgoing payment fetch failed");
            PaymentError::OutgoingPaymentCreationFailed
        })
    }

    // ========================================================================
    // HTTP plumbing
    // ========================================================================

    async fn post_json<B: Serialize, T: DeserializeOwned>(
        &self,
        url: &str,
        access_token: Option<&str>,
        body: &B,
    ) -> reqwest::Result<T> {
        let mut request = self.http.post(url).json(body);
        if let Some(token) = access_token {
            request = request.header(AUTHORIZATION, format!("GNAP {token}"));
        }
        request
            .send()
            .await?
            .error_for_status()?
            .json::<T>()
            .await
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        access_token: &str,
    ) -> reqwest::Result<T> {
        self.http
            .get(url)
            .header(AUTHORIZATION, format!("GNAP {access_token}"))
            .header(ACCEPT, "application/json")
            .send()
            .await?
            .error_for_status()?
            .json::<T>()
            .await
    }
}

fn origin_of(url: &str) -> Result<String> {
    let parsed = Url::parse(url).map_err(|_| PaymentError::InvalidWalletAddress)?;
    Ok(parsed.origin().ascii_serialization())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_origin_of() {
        assert_eq!(
            origin_of("https://wallet.example/alice").unwrap(),
            "https://wallet.example"
        );
        assert!(origin_of("not a url").is_err());
    }

    #[test]
    fn test_config_from_parts() {
        let config = ClientConfig::new("https://wallet.example/shop", "https://shop.example/finish");
        let client = OpenPaymentsClient::new(config);
        assert_eq!(client.config().wallet_address, "https://wallet.example/shop");
    }
}
