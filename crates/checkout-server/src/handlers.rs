//! HTTP Handlers
//!
//! Thin JSON adapters over the negotiation flow in `checkout-payments`. Each
//! handler maps its step's errors onto a fixed status + code + restartable
//! triple; no upstream response detail ever reaches the client.

use axum::{
    extract::{Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use checkout_core::{Amount, PaymentSessionState, Quote};
use checkout_payments::{
    create_request_payment, fetch_quote, fetch_request_quote, finalize_payment,
    initiate_payment, request_payment_details, verify_payment, CheckoutQuote, IncomingPayment,
    IncomingPaymentCompletion, PaymentError, PaymentResult, RequestQuote, ResultColor,
};

use crate::session::{clear_session_cookie, session_id_from_headers, set_session_cookie};
use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub card_configured: bool,
}

#[derive(Debug, Deserialize)]
pub struct PayRequest {
    pub wallet_address: String,
    pub receiver: String,
    pub amount: String,
    #[serde(default)]
    pub note: Option<String>,
    #[serde(default)]
    pub from_extension: bool,
}

#[derive(Debug, Serialize)]
pub struct QuoteSummaryResponse {
    pub receiver_name: String,
    pub debit_amount: String,
    pub receive_amount: String,
    pub fee: String,
}

#[derive(Debug, Serialize)]
pub struct ConfirmResponse {
    pub payment_id: String,
    pub redirect_url: String,
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: &'static str,
}

#[derive(Debug, Deserialize)]
pub struct RequestPaymentRequest {
    pub wallet_address: String,
    pub amount: String,
    #[serde(default)]
    pub note: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RequestPaymentResponse {
    pub payment_url: String,
    pub receiver: String,
    pub amount: Option<String>,
    pub note: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub struct RequestDetailsParams {
    pub url: String,
    pub receiver: String,
}

#[derive(Debug, Deserialize)]
pub struct PayRequestPayment {
    pub wallet_address: String,
    pub payment_url: String,
}

/// Query parameters of the consent-callback redirect
#[derive(Debug, Deserialize)]
pub struct FinishParams {
    #[serde(rename = "paymentId")]
    pub payment_id: Option<String>,
    pub interact_ref: Option<String>,
    pub result: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CardCheckoutRequest {
    pub amount: String,
    pub currency: String,
}

#[derive(Debug, Serialize)]
pub struct CardCheckoutResponse {
    pub id: String,
    pub client_secret: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CardResultParams {
    pub payment_intent: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: &'static str,
    pub restartable: bool,
}

// ============================================================================
// Error Mapping
// ============================================================================

type ApiError = (StatusCode, Json<ErrorResponse>);

fn error_response(err: &PaymentError) -> ApiError {
    let status = match err {
        PaymentError::InvalidWalletAddress | PaymentError::InvalidAmount(_) => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        PaymentError::SessionExpired => StatusCode::GONE,
        PaymentError::PaymentNotFound(_) => StatusCode::NOT_FOUND,
        PaymentError::AlreadyProcessed(_) => StatusCode::CONFLICT,
        PaymentError::Config(_) => StatusCode::SERVICE_UNAVAILABLE,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };

    (
        status,
        Json(ErrorResponse {
            error: err.user_message(),
            code: error_code(err),
            restartable: err.is_restartable(),
        }),
    )
}

fn error_code(err: &PaymentError) -> &'static str {
    match err {
        PaymentError::InvalidWalletAddress => "INVALID_WALLET_ADDRESS",
        PaymentError::UnexpectedGrantShape(_) => "UNEXPECTED_GRANT_SHAPE",
        PaymentError::GrantRequestFailed => "GRANT_REQUEST_FAILED",
        PaymentError::IncomingPaymentCreationFailed => "INCOMING_PAYMENT_FAILED",
        PaymentError::QuoteCreationFailed(_) => "QUOTE_FAILED",
        PaymentError::GrantContinuationFailed => "GRANT_CONTINUATION_FAILED",
        PaymentError::OutgoingPaymentCreationFailed => "OUTGOING_PAYMENT_FAILED",
        PaymentError::IncomingPaymentCompletionFailed => "INCOMING_PAYMENT_COMPLETION_FAILED",
        PaymentError::SessionExpired => "SESSION_EXPIRED",
        PaymentError::AlreadyProcessed(_) => "ALREADY_PROCESSED",
        PaymentError::PaymentNotFound(_) => "PAYMENT_NOT_FOUND",
        PaymentError::InvalidAmount(_) => "INVALID_AMOUNT",
        PaymentError::Card(_) => "CARD_ERROR",
        PaymentError::Config(_) => "NOT_CONFIGURED",
        PaymentError::Storage(_) => "STORAGE_ERROR",
    }
}

fn api_err(err: impl Into<PaymentError>) -> ApiError {
    error_response(&err.into())
}

// ============================================================================
// Helpers
// ============================================================================

fn quote_summary(
    quote: &Quote,
    receiver_name: Option<&str>,
) -> Result<QuoteSummaryResponse, ApiError> {
    let debit = quote.debit_amount.format().map_err(api_err)?;
    let receive = quote.receive_amount.format().map_err(api_err)?;
    let fee = Amount::from_minor_units(
        quote.fee().map_err(api_err)?,
        quote.debit_amount.asset_code.as_str(),
        quote.debit_amount.asset_scale,
    )
    .format()
    .map_err(api_err)?;

    Ok(QuoteSummaryResponse {
        receiver_name: receiver_name.unwrap_or("Recipient").to_string(),
        debit_amount: debit.amount_with_currency,
        receive_amount: receive.amount_with_currency,
        fee: fee.amount_with_currency,
    })
}

fn request_payment_response(
    payment: IncomingPayment,
) -> Result<RequestPaymentResponse, ApiError> {
    let amount = match &payment.incoming_amount {
        Some(amount) => Some(amount.format().map_err(api_err)?.amount_with_currency),
        None => None,
    };

    Ok(RequestPaymentResponse {
        payment_url: payment.id,
        receiver: payment.wallet_address,
        amount,
        note: payment.metadata.and_then(|metadata| metadata.description),
        created_at: payment.created_at,
    })
}

/// Terminal outcome plus the session-clearing cookie
fn terminal_response(result: PaymentResult) -> Response {
    (
        [(header::SET_COOKIE, clear_session_cookie())],
        Json(result),
    )
        .into_response()
}

// ============================================================================
// Handlers
// ============================================================================

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        card_configured: state.card.is_some(),
    })
}

/// Resolve both wallets, quote the payment, and stash the negotiation state
/// in a fresh session bound to the response cookie
pub async fn create_quote(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<PayRequest>,
) -> Result<Response, ApiError> {
    let CheckoutQuote {
        sender,
        receiver,
        quote,
    } = fetch_quote(
        &state.payments,
        &payload.wallet_address,
        &payload.receiver,
        &payload.amount,
        payload.note.as_deref(),
    )
    .await
    .map_err(api_err)?;

    let summary = quote_summary(&quote, receiver.public_name.as_deref())?;

    // A stale cookie id is simply overwritten with the new state.
    let session_id = session_id_from_headers(&headers).unwrap_or_default();
    let session = PaymentSessionState {
        wallet_address: Some(sender),
        receiver: Some(receiver),
        quote: Some(quote),
        pending_grant: None,
        is_request_payment: false,
        from_extension: payload.from_extension,
    };
    state.sessions.save(&session_id, &session).map_err(api_err)?;

    Ok((
        [(header::SET_COOKIE, set_session_cookie(&session_id))],
        Json(summary),
    )
        .into_response())
}

/// Confirm the quoted payment: request the interactive grant and hand back
/// the consent redirect
pub async fn confirm_payment(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let session_id = session_id_from_headers(&headers)
        .ok_or_else(|| error_response(&PaymentError::SessionExpired))?;
    let mut session = state
        .sessions
        .load(&session_id)
        .map_err(api_err)?
        .ok_or_else(|| error_response(&PaymentError::SessionExpired))?;

    let sender = session.wallet_required().map_err(api_err)?.clone();
    let quote = session.quote_required().map_err(api_err)?.clone();

    let pending = initiate_payment(&state.payments, state.records.as_ref(), &sender, &quote)
        .await
        .map_err(api_err)?;

    session.pending_grant = Some(pending.grant.clone());
    state.sessions.save(&session_id, &session).map_err(api_err)?;

    let body = ConfirmResponse {
        payment_id: pending.payment_id,
        redirect_url: pending.grant.redirect_url,
    };
    Ok((
        [(header::SET_COOKIE, set_session_cookie(&session_id))],
        Json(body),
    )
        .into_response())
}

/// Abandon the current negotiation
pub async fn cancel_payment(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    if let Some(session_id) = session_id_from_headers(&headers) {
        state.sessions.destroy(&session_id).map_err(api_err)?;
    }
    Ok((
        [(header::SET_COOKIE, clear_session_cookie())],
        Json(StatusResponse {
            status: "cancelled",
        }),
    )
        .into_response())
}

/// Create a shareable payment request
pub async fn create_request(
    State(state): State<AppState>,
    Json(payload): Json<RequestPaymentRequest>,
) -> Result<Json<RequestPaymentResponse>, ApiError> {
    let payment = create_request_payment(
        &state.payments,
        &payload.wallet_address,
        &payload.amount,
        payload.note.as_deref(),
    )
    .await
    .map_err(api_err)?;

    Ok(Json(request_payment_response(payment)?))
}

/// Read back a payment request so the payer can review it before paying
pub async fn request_details(
    State(state): State<AppState>,
    Query(params): Query<RequestDetailsParams>,
) -> Result<Json<RequestPaymentResponse>, ApiError> {
    let payment = request_payment_details(&state.payments, &params.url, &params.receiver)
        .await
        .map_err(api_err)?;

    Ok(Json(request_payment_response(payment)?))
}

/// Quote payment of an existing request; the receive amount drives the quote
pub async fn pay_request(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<PayRequestPayment>,
) -> Result<Response, ApiError> {
    let RequestQuote { sender, quote } = fetch_request_quote(
        &state.payments,
        &payload.wallet_address,
        &payload.payment_url,
    )
    .await
    .map_err(api_err)?;

    let summary = quote_summary(&quote, None)?;

    let session_id = session_id_from_headers(&headers).unwrap_or_default();
    let session = PaymentSessionState {
        wallet_address: Some(sender),
        receiver: None,
        quote: Some(quote),
        pending_grant: None,
        is_request_payment: true,
        from_extension: false,
    };
    state.sessions.save(&session_id, &session).map_err(api_err)?;

    Ok((
        [(header::SET_COOKIE, set_session_cookie(&session_id))],
        Json(summary),
    )
        .into_response())
}

/// Consent-callback leg: finalize the payment (or register the decline) and
/// report the terminal outcome. The session is destroyed on every path out.
pub async fn finish_payment(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<FinishParams>,
) -> Result<Response, ApiError> {
    let session_id = session_id_from_headers(&headers);

    // The authorization server reports an explicit decline in the callback.
    if params.result.as_deref() == Some("grant_rejected") {
        if let Some(session_id) = &session_id {
            state.sessions.destroy(session_id).map_err(api_err)?;
        }
        return Ok(terminal_response(PaymentResult::declined()));
    }

    let (Some(payment_id), Some(interact_ref)) = (params.payment_id, params.interact_ref) else {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: "Missing consent callback parameters.".into(),
                code: "MISSING_CALLBACK_PARAMETERS",
                restartable: true,
            }),
        ));
    };

    let session_id =
        session_id.ok_or_else(|| error_response(&PaymentError::SessionExpired))?;
    let session = state
        .sessions
        .load(&session_id)
        .map_err(api_err)?
        .ok_or_else(|| error_response(&PaymentError::SessionExpired))?;

    let record = match state.records.find(&payment_id).map_err(api_err)? {
        Some(record) => record,
        None => {
            state.sessions.destroy(&session_id).map_err(api_err)?;
            return Err(error_response(&PaymentError::PaymentNotFound(payment_id)));
        }
    };

    // Push flows also mark the receiver's incoming payment complete; paying
    // an existing request leaves that to the receiver's server.
    let completion = if session.is_request_payment {
        None
    } else {
        session.quote.as_ref().and_then(|quote| {
            quote
                .incoming_payment_grant_token
                .clone()
                .map(|access_token| IncomingPaymentCompletion {
                    url: quote.receiver.clone(),
                    access_token,
                })
        })
    };

    let outcome = finalize_payment(
        &state.payments,
        state.records.as_ref(),
        &record,
        &interact_ref,
        completion,
    )
    .await;

    // Terminal either way.
    state.sessions.destroy(&session_id).map_err(api_err)?;

    match outcome {
        Ok(handle) => Ok(terminal_response(
            verify_payment(&state.payments, &handle).await,
        )),
        Err(err) => {
            let (status, body) = error_response(&err);
            Ok((status, [(header::SET_COOKIE, clear_session_cookie())], body).into_response())
        }
    }
}

/// Create a card payment intent for the embedded processor element
pub async fn card_checkout(
    State(state): State<AppState>,
    Json(payload): Json<CardCheckoutRequest>,
) -> Result<Json<CardCheckoutResponse>, ApiError> {
    let card = state.card.as_ref().ok_or_else(|| {
        error_response(&PaymentError::Config("card payments not configured".into()))
    })?;

    let amount = Amount::from_major_units(&payload.amount, payload.currency.to_uppercase(), 2)
        .map_err(api_err)?;
    let minor = amount.minor_units().map_err(api_err)?;
    let minor = i64::try_from(minor)
        .map_err(|_| error_response(&PaymentError::InvalidAmount(payload.amount.clone())))?;

    let intent = card
        .create_payment_intent(minor, &payload.currency)
        .await
        .map_err(api_err)?;

    Ok(Json(CardCheckoutResponse {
        id: intent.id,
        client_secret: intent.client_secret,
    }))
}

/// Read back a card payment after the processor redirect
pub async fn card_result(
    State(state): State<AppState>,
    Query(params): Query<CardResultParams>,
) -> Result<Json<PaymentResult>, ApiError> {
    let card = state.card.as_ref().ok_or_else(|| {
        error_response(&PaymentError::Config("card payments not configured".into()))
    })?;

    let intent = card
        .retrieve_payment_intent(&params.payment_intent)
        .await
        .map_err(api_err)?;

    if !intent.is_succeeded() {
        return Ok(Json(PaymentResult::failure(
            "Card payment was not completed",
        )));
    }

    let amount = u128::try_from(intent.amount)
        .map_err(|_| error_response(&PaymentError::Card("negative amount".into())))?;
    let formatted = Amount::from_minor_units(amount, intent.currency.to_uppercase(), 2)
        .format()
        .map_err(api_err)?;

    Ok(Json(PaymentResult {
        message: format!("Payment of {} was successful", formatted.amount_with_currency),
        color: ResultColor::Green,
        error: false,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::Request;
    use axum::routing::get;
    use axum::Router;
    use tower::ServiceExt;

    use checkout_core::{MemoryPaymentRecordStore, MemorySessionStore, SessionId, SessionStore};
    use checkout_payments::{ClientConfig, OpenPaymentsClient, PaymentMetadata};

    fn test_state(sessions: Arc<MemorySessionStore>) -> AppState {
        AppState {
            payments: Arc::new(OpenPaymentsClient::new(ClientConfig::new(
                "https://wallet.example/shop",
                "https://shop.example/finish",
            ))),
            sessions,
            records: Arc::new(MemoryPaymentRecordStore::new()),
            card: None,
        }
    }

    #[tokio::test]
    async fn test_finish_decline_destroys_session() {
        let sessions = Arc::new(MemorySessionStore::new());
        let id = SessionId::new();
        sessions
            .save(&id, &PaymentSessionState::default())
            .unwrap();

        let app = Router::new()
            .route("/finish", get(finish_payment))
            .with_state(test_state(sessions.clone()));
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/finish?result=grant_rejected")
                    .header("cookie", format!("quote-session={id}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let result: PaymentResult = serde_json::from_slice(&body).unwrap();
        assert!(!result.error);
        assert_eq!(result, PaymentResult::declined());

        // No finalize was attempted and the session is gone.
        assert!(sessions.load(&id).unwrap().is_none());
    }

    #[tokio::test]
    async fn test_finish_unknown_payment_is_not_found() {
        let sessions = Arc::new(MemorySessionStore::new());
        let id = SessionId::new();
        sessions
            .save(&id, &PaymentSessionState::default())
            .unwrap();

        let app = Router::new()
            .route("/finish", get(finish_payment))
            .with_state(test_state(sessions.clone()));
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/finish?paymentId=missing&interact_ref=ref-1")
                    .header("cookie", format!("quote-session={id}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        // Terminal outcome: the session does not survive.
        assert!(sessions.load(&id).unwrap().is_none());
    }

    #[tokio::test]
    async fn test_finish_without_session_is_expired() {
        let app = Router::new()
            .route("/finish", get(finish_payment))
            .with_state(test_state(Arc::new(MemorySessionStore::new())));
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/finish?paymentId=p1&interact_ref=ref-1")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::GONE);
    }

    #[test]
    fn test_error_status_mapping() {
        let (status, body) = error_response(&PaymentError::SessionExpired);
        assert_eq!(status, StatusCode::GONE);
        assert_eq!(body.code, "SESSION_EXPIRED");
        assert!(body.restartable);

        let (status, _) = error_response(&PaymentError::PaymentNotFound("p1".into()));
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = error_response(&PaymentError::AlreadyProcessed("p1".into()));
        assert_eq!(status, StatusCode::CONFLICT);

        let (status, body) = error_response(&PaymentError::InvalidWalletAddress);
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(body.restartable);

        let (status, _) = error_response(&PaymentError::GrantContinuationFailed);
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_quote_summary_includes_fee() {
        let quote = Quote {
            id: "https://rs.example/quotes/1".into(),
            debit_amount: Amount::from_minor_units(1050, "USD", 2),
            receive_amount: Amount::from_minor_units(1000, "USD", 2),
            wallet_address: "https://wallet.example/alice".into(),
            receiver: "https://rs.example/incoming-payments/1".into(),
            incoming_payment_grant_token: None,
        };

        let summary = quote_summary(&quote, Some("Bob's Store")).unwrap();
        assert_eq!(summary.receiver_name, "Bob's Store");
        assert_eq!(summary.debit_amount, "$10.50");
        assert_eq!(summary.receive_amount, "$10.00");
        assert_eq!(summary.fee, "$0.50");
    }

    #[test]
    fn test_quote_summary_defaults_receiver_name() {
        let quote = Quote {
            id: "q".into(),
            debit_amount: Amount::from_minor_units(100, "EUR", 2),
            receive_amount: Amount::from_minor_units(100, "EUR", 2),
            wallet_address: "w".into(),
            receiver: "r".into(),
            incoming_payment_grant_token: None,
        };
        assert_eq!(quote_summary(&quote, None).unwrap().receiver_name, "Recipient");
    }

    #[test]
    fn test_request_payment_response_shape() {
        let payment = IncomingPayment {
            id: "https://rs.example/incoming-payments/1".into(),
            wallet_address: "https://wallet.example/bob".into(),
            incoming_amount: Some(Amount::from_minor_units(2500, "USD", 2)),
            received_amount: None,
            completed: false,
            metadata: Some(PaymentMetadata {
                description: Some("lunch".into()),
            }),
            created_at: None,
            expires_at: None,
        };

        let response = request_payment_response(payment).unwrap();
        assert_eq!(response.amount.as_deref(), Some("$25.00"));
        assert_eq!(response.note.as_deref(), Some("lunch"));
    }
}
