//! Session Cookie Plumbing
//!
//! The negotiation state itself lives server-side in the `SessionStore`; the
//! cookie only carries the opaque session id. The cookie's Max-Age matches
//! the store TTL so both halves expire together.

use axum::http::header::COOKIE;
use axum::http::HeaderMap;

use checkout_core::session::SESSION_TTL_SECONDS;
use checkout_core::SessionId;

pub const SESSION_COOKIE: &str = "quote-session";

/// Extract the session id from the request's Cookie header, if present
pub fn session_id_from_headers(headers: &HeaderMap) -> Option<SessionId> {
    let cookies = headers.get(COOKIE)?.to_str().ok()?;
    cookies.split(';').map(str::trim).find_map(|pair| {
        let (name, value) = pair.split_once('=')?;
        (name == SESSION_COOKIE && !value.is_empty()).then(|| SessionId::from_string(value))
    })
}

/// Set-Cookie value binding the session to the browser
pub fn set_session_cookie(id: &SessionId) -> String {
    format!("{SESSION_COOKIE}={id}; Path=/; HttpOnly; SameSite=Lax; Max-Age={SESSION_TTL_SECONDS}")
}

/// Set-Cookie value dropping the session on terminal states
pub fn clear_session_cookie() -> String {
    format!("{SESSION_COOKIE}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0")
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_extracts_session_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(
            COOKIE,
            HeaderValue::from_static("theme=dark; quote-session=abc-123; lang=en"),
        );
        let id = session_id_from_headers(&headers).unwrap();
        assert_eq!(id.as_str(), "abc-123");
    }

    #[test]
    fn test_missing_or_empty_cookie() {
        let headers = HeaderMap::new();
        assert!(session_id_from_headers(&headers).is_none());

        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_static("quote-session="));
        assert!(session_id_from_headers(&headers).is_none());
    }

    #[test]
    fn test_cookie_attributes() {
        let id = SessionId::from_string("abc");
        let cookie = set_session_cookie(&id);
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("Max-Age=300"));
        assert!(clear_session_cookie().contains("Max-Age=0"));
    }
}
