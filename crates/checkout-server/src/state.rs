//! Application State

use std::sync::Arc;

use checkout_core::{PaymentRecordStore, SessionStore};
use checkout_payments::{CardClient, OpenPaymentsClient};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Open Payments client, constructed once at startup
    pub payments: Arc<OpenPaymentsClient>,

    /// TTL-bound session store for in-flight negotiation state
    pub sessions: Arc<dyn SessionStore>,

    /// Durable payment record store
    pub records: Arc<dyn PaymentRecordStore>,

    /// Card processor client (optional - None if not configured)
    pub card: Option<Arc<CardClient>>,
}
