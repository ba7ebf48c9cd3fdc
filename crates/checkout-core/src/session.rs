//! Payment Session State
//!
//! In-flight negotiation state lives in a per-session record with a short
//! absolute TTL. The state is populated incrementally across the negotiation
//! steps, read back on each subsequent page load, and destroyed on every
//! terminal outcome. A session that outlives its TTL surfaces as a distinct
//! [`CoreError::SessionExpired`], never as a generic failure.

use std::collections::HashMap;
use std::sync::RwLock;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{CoreError, Result};
use crate::grant::PendingGrant;
use crate::quote::Quote;
use crate::wallet::WalletDescriptor;

/// Absolute session lifetime
pub const SESSION_TTL_SECONDS: i64 = 5 * 60;

/// Unique session identifier, bound to the browser session cookie
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(String);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Typed per-session negotiation state
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PaymentSessionState {
    /// Sender wallet, set once resolved
    pub wallet_address: Option<WalletDescriptor>,

    /// Receiver wallet, set once resolved
    pub receiver: Option<WalletDescriptor>,

    /// Quote awaiting confirmation
    pub quote: Option<Quote>,

    /// Interactive outgoing-payment grant awaiting consent
    pub pending_grant: Option<PendingGrant>,

    /// Whether this attempt pays an existing payment request (pull flow)
    pub is_request_payment: bool,

    /// Whether the flow was started from the browser extension surface
    pub from_extension: bool,
}

impl PaymentSessionState {
    /// The quote, or `SessionExpired` when a step arrives out of order
    pub fn quote_required(&self) -> Result<&Quote> {
        self.quote.as_ref().ok_or(CoreError::SessionExpired)
    }

    /// The sender wallet, or `SessionExpired`
    pub fn wallet_required(&self) -> Result<&WalletDescriptor> {
        self.wallet_address.as_ref().ok_or(CoreError::SessionExpired)
    }
}

/// Session store: a TTL-bound key-value mapping
pub trait SessionStore: Send + Sync {
    /// Save state under a session id, resetting the TTL
    fn save(&self, id: &SessionId, state: &PaymentSessionState) -> Result<()>;

    /// Load state. `Ok(None)` when the id was never seen;
    /// `Err(SessionExpired)` when the entry outlived its TTL.
    fn load(&self, id: &SessionId) -> Result<Option<PaymentSessionState>>;

    /// Destroy the session (terminal states, cancellation)
    fn destroy(&self, id: &SessionId) -> Result<()>;
}

/// In-memory session store with absolute TTL
pub struct MemorySessionStore {
    sessions: RwLock<HashMap<SessionId, (PaymentSessionState, DateTime<Utc>)>>,
    ttl: Duration,
}

impl Default for MemorySessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::with_ttl(Duration::seconds(SESSION_TTL_SECONDS))
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            ttl,
        }
    }
}

impl SessionStore for MemorySessionStore {
    fn save(&self, id: &SessionId, state: &PaymentSessionState) -> Result<()> {
        let mut sessions = self
            .sessions
            .write()
            .map_err(|_| CoreError::Storage("session lock poisoned".into()))?;
        sessions.insert(id.clone(), (state.clone(), Utc::now() + self.ttl));
        Ok(())
    }

    fn load(&self, id: &SessionId) -> Result<Option<PaymentSessionState>> {
        let mut sessions = self
            .sessions
            .write()
            .map_err(|_| CoreError::Storage("session lock poisoned".into()))?;
        match sessions.get(id) {
            Some((_, expires_at)) if *expires_at <= Utc::now() => {
                sessions.remove(id);
                Err(CoreError::SessionExpired)
            }
            Some((state, _)) => Ok(Some(state.clone())),
            None => Ok(None),
        }
    }

    fn destroy(&self, id: &SessionId) -> Result<()> {
        let mut sessions = self
            .sessions
            .write()
            .map_err(|_| CoreError::Storage("session lock poisoned".into()))?;
        sessions.remove(id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_and_load() {
        let store = MemorySessionStore::new();
        let id = SessionId::new();
        let state = PaymentSessionState {
            is_request_payment: true,
            ..Default::default()
        };

        store.save(&id, &state).unwrap();
        let loaded = store.load(&id).unwrap().unwrap();
        assert!(loaded.is_request_payment);
    }

    #[test]
    fn test_unknown_session_is_none() {
        let store = MemorySessionStore::new();
        assert!(store.load(&SessionId::new()).unwrap().is_none());
    }

    #[test]
    fn test_expired_session_is_distinct_error() {
        let store = MemorySessionStore::with_ttl(Duration::seconds(-1));
        let id = SessionId::new();
        store.save(&id, &PaymentSessionState::default()).unwrap();

        assert!(matches!(store.load(&id), Err(CoreError::SessionExpired)));
        // Expired entries are purged on first observation.
        assert!(store.load(&id).unwrap().is_none());
    }

    #[test]
    fn test_destroy() {
        let store = MemorySessionStore::new();
        let id = SessionId::new();
        store.save(&id, &PaymentSessionState::default()).unwrap();
        store.destroy(&id).unwrap();
        assert!(store.load(&id).unwrap().is_none());
    }

    #[test]
    fn test_out_of_order_step_is_session_expired() {
        let state = PaymentSessionState::default();
        assert!(matches!(state.quote_required(), Err(CoreError::SessionExpired)));
        assert!(matches!(state.wallet_required(), Err(CoreError::SessionExpired)));
    }
}
