//! Open Payments Checkout Server
//!
//! Axum-based JSON API driving the wallet-to-wallet checkout flows, the
//! shareable payment requests, and the card processor fallback.

mod handlers;
mod session;
mod state;

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use checkout_core::{MemoryPaymentRecordStore, MemorySessionStore};
use checkout_payments::{CardClient, ClientConfig, OpenPaymentsClient};

use crate::handlers::{
    cancel_payment, card_checkout, card_result, confirm_payment, create_quote, create_request,
    finish_payment, health_check, pay_request, request_details,
};
use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load environment
    dotenvy::dotenv().ok();

    // Open Payments client, constructed once and shared
    let config = ClientConfig::from_env()?;
    let payments = Arc::new(OpenPaymentsClient::new(config));

    // Stores
    let sessions = Arc::new(MemorySessionStore::new());
    let records = Arc::new(MemoryPaymentRecordStore::new());

    // Card processor is optional
    let card = CardClient::from_env().ok();
    if card.is_some() {
        tracing::info!("card payments configured");
    } else {
        tracing::warn!("card payments disabled, set STRIPE_SECRET_KEY to enable");
    }

    // Build application state
    let state = AppState {
        payments,
        sessions,
        records,
        card: card.map(Arc::new),
    };

    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Build router
    let app = Router::new()
        // Health
        .route("/health", get(health_check))
        // Checkout flow
        .route("/api/pay", post(create_quote))
        .route("/api/pay/confirm", post(confirm_payment))
        .route("/api/pay/cancel", post(cancel_payment))
        // Payment requests
        .route("/api/request", post(create_request))
        .route("/api/request/details", get(request_details))
        .route("/api/request/pay", post(pay_request))
        // Consent callback
        .route("/finish", get(finish_payment))
        // Card fallback
        .route("/api/card/checkout", post(card_checkout))
        .route("/api/card/result", get(card_result))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    // Start server
    let addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("checkout server running on http://{}", addr);
    tracing::info!("Endpoints:");
    tracing::info!("  GET  /health              - Health check");
    tracing::info!("  POST /api/pay             - Quote a payment");
    tracing::info!("  POST /api/pay/confirm     - Request consent grant");
    tracing::info!("  POST /api/pay/cancel      - Abandon the session");
    tracing::info!("  POST /api/request         - Create a payment request");
    tracing::info!("  GET  /api/request/details - Review a payment request");
    tracing::info!("  POST /api/request/pay     - Quote paying a request");
    tracing::info!("  GET  /finish              - Consent callback");
    tracing::info!("  POST /api/card/checkout   - Card payment intent");
    tracing::info!("  GET  /api/card/result     - Card payment result");

    axum::serve(listener, app).await?;

    Ok(())
}
