//! Session cookie plumbing.
//!
//! The cookie carries only an opaque session id; all session state
//! lives server-side in the `SessionStore`, which also enforces the
//! idle timeout. No Max-Age on the cookie: the browser keeps it for
//! the browsing session and the server decides when it stops working.

use axum::http::{header, HeaderMap};
use uuid::Uuid;

pub const SESSION_COOKIE: &str = "signpost_sid";

/// Extract the session id from the request's Cookie header, if any.
pub fn session_id(headers: &HeaderMap) -> Option<Uuid> {
    let header = headers.get(header::COOKIE)?.to_str().ok()?;
    parse_cookie(header, SESSION_COOKIE)?.parse().ok()
}

/// Build the Set-Cookie header value for a newly created session.
/// In release builds, adds `Secure` to prevent transmission over HTTP.
pub fn session_cookie(id: Uuid) -> String {
    let secure = if cfg!(debug_assertions) { "" } else { "; Secure" };
    format!("{SESSION_COOKIE}={id}; Path=/; HttpOnly; SameSite=Lax{secure}")
}

/// Build a Set-Cookie header that clears the session cookie.
pub fn clear_session_cookie() -> String {
    format!("{SESSION_COOKIE}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0")
}

/// Parse a specific cookie from the Cookie header string.
fn parse_cookie<'a>(header: &'a str, name: &str) -> Option<&'a str> {
    for part in header.split(';') {
        let part = part.trim();
        if let Some(value) = part.strip_prefix(name) {
            if let Some(value) = value.strip_prefix('=') {
                return Some(value);
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn parse_cookie_works() {
        assert_eq!(
            parse_cookie("signpost_sid=abc123; other=xyz", "signpost_sid"),
            Some("abc123")
        );
        assert_eq!(
            parse_cookie("other=xyz; signpost_sid=abc123", "signpost_sid"),
            Some("abc123")
        );
        assert_eq!(parse_cookie("other=xyz", "signpost_sid"), None);
    }

    #[test]
    fn session_id_round_trip() {
        let id = Uuid::new_v4();
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_str(&format!("a=b; {SESSION_COOKIE}={id}")).unwrap(),
        );
        assert_eq!(session_id(&headers), Some(id));
    }

    #[test]
    fn garbage_ids_are_ignored() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("signpost_sid=not-a-uuid"),
        );
        assert_eq!(session_id(&headers), None);
        assert_eq!(session_id(&HeaderMap::new()), None);
    }

    #[test]
    fn cookie_attributes() {
        let id = Uuid::new_v4();
        let cookie = session_cookie(id);
        assert!(cookie.starts_with(&format!("{SESSION_COOKIE}={id}")));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("SameSite=Lax"));

        assert!(clear_session_cookie().contains("Max-Age=0"));
    }
}
