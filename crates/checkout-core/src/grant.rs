//! Authorization Grants
//!
//! A grant request against an authorization server resolves to one of two
//! shapes: a non-interactive grant carrying a usable access token, or a pending
//! grant that must be continued after the account holder consents via redirect.
//! Every code path that requests a grant expects exactly one of the shapes;
//! treating a pending grant as authorized would let a payment proceed without
//! consent, so the two are kept as a tagged union and never coerced.

use serde::{Deserialize, Serialize};

/// Outcome of a grant request
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Grant {
    /// Authorized immediately; no user interaction required
    NonInteractive(NonInteractiveGrant),

    /// Awaiting account-holder consent via redirect
    Pending(PendingGrant),
}

/// A grant that is usable as-is
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NonInteractiveGrant {
    /// Bearer token for resource server calls
    pub access_token: String,
}

/// A grant waiting on interactive consent
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingGrant {
    /// Continuation endpoint to exchange the interaction reference at
    pub continue_uri: String,

    /// Token authorizing the continuation call
    pub continue_token: String,

    /// Where to send the user for consent
    pub redirect_url: String,

    /// Nonce bound to this negotiation's finish callback
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interaction_nonce: Option<String>,
}

impl Grant {
    /// The access token, when the grant is non-interactive
    pub fn access_token(&self) -> Option<&str> {
        match self {
            Grant::NonInteractive(grant) => Some(&grant.access_token),
            Grant::Pending(_) => None,
        }
    }

    /// The pending half of the union, when interaction is required
    pub fn as_pending(&self) -> Option<&PendingGrant> {
        match self {
            Grant::NonInteractive(_) => None,
            Grant::Pending(grant) => Some(grant),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_union_is_exclusive() {
        let grant = Grant::NonInteractive(NonInteractiveGrant {
            access_token: "token".into(),
        });
        assert_eq!(grant.access_token(), Some("token"));
        assert!(grant.as_pending().is_none());

        let grant = Grant::Pending(PendingGrant {
            continue_uri: "https://auth.example/continue/1".into(),
            continue_token: "cont".into(),
            redirect_url: "https://auth.example/interact/1".into(),
            interaction_nonce: Some("nonce".into()),
        });
        assert!(grant.access_token().is_none());
        assert!(grant.as_pending().is_some());
    }
}
