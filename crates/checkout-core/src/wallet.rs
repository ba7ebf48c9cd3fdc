//! Wallet Addresses
//!
//! A wallet is identified by a URL, or by the `$` shorthand pointer form
//! (`$wallet.example/alice` -> `https://wallet.example/alice`). Resolution of a
//! pointer into a [`WalletDescriptor`] is a network concern and lives in the
//! payments crate; the descriptor itself and pointer normalization are pure.

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{CoreError, Result};

/// A resolved wallet address with its asset and authorization endpoints
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletDescriptor {
    /// Canonical wallet address URL
    pub id: String,

    /// Authorization server to request grants from
    pub auth_server: String,

    /// Resource server for payment resources; older servers omit this
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_server: Option<String>,

    /// Asset code of the account
    pub asset_code: String,

    /// Asset scale of the account
    pub asset_scale: u8,

    /// Display name chosen by the account holder
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_name: Option<String>,
}

impl WalletDescriptor {
    /// Origin against which payment resources for this wallet are created
    pub fn resource_origin(&self) -> Result<String> {
        if let Some(rs) = &self.resource_server {
            return Ok(rs.trim_end_matches('/').to_string());
        }
        let url = Url::parse(&self.id).map_err(|_| CoreError::InvalidWalletAddress)?;
        Ok(url.origin().ascii_serialization())
    }
}

/// Normalize a human-entered pointer into a resolvable URL.
///
/// Accepts either a full `https://` URL or the `$` shorthand. Anything else is
/// rejected before a network call is made.
pub fn normalize_wallet_pointer(input: &str) -> Result<String> {
    let trimmed = input.trim();
    let candidate = match trimmed.strip_prefix('$') {
        Some(rest) if !rest.is_empty() => format!("https://{rest}"),
        Some(_) => return Err(CoreError::InvalidWalletAddress),
        None => trimmed.to_string(),
    };

    let url = Url::parse(&candidate).map_err(|_| CoreError::InvalidWalletAddress)?;
    if url.scheme() != "https" || url.host_str().is_none() {
        return Err(CoreError::InvalidWalletAddress);
    }
    Ok(candidate)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pointer_shorthand() {
        assert_eq!(
            normalize_wallet_pointer("$wallet.example/alice").unwrap(),
            "https://wallet.example/alice"
        );
    }

    #[test]
    fn test_full_url_passthrough() {
        assert_eq!(
            normalize_wallet_pointer("https://wallet.example/bob").unwrap(),
            "https://wallet.example/bob"
        );
    }

    #[test]
    fn test_rejects_non_https() {
        assert!(normalize_wallet_pointer("http://wallet.example/alice").is_err());
        assert!(normalize_wallet_pointer("not a url").is_err());
        assert!(normalize_wallet_pointer("$").is_err());
    }

    #[test]
    fn test_resource_origin_falls_back_to_id() {
        let wallet = WalletDescriptor {
            id: "https://wallet.example/alice".into(),
            auth_server: "https://auth.wallet.example".into(),
            resource_server: None,
            asset_code: "USD".into(),
            asset_scale: 2,
            public_name: None,
        };
        assert_eq!(wallet.resource_origin().unwrap(), "https://wallet.example");
    }

    #[test]
    fn test_resource_origin_prefers_resource_server() {
        let wallet = WalletDescriptor {
            id: "https://wallet.example/alice".into(),
            auth_server: "https://auth.wallet.example".into(),
            resource_server: Some("https://rs.wallet.example/".into()),
            asset_code: "USD".into(),
            asset_scale: 2,
            public_name: None,
        };
        assert_eq!(wallet.resource_origin().unwrap(), "https://rs.wallet.example");
    }
}
