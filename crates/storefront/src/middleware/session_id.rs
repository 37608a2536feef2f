//! Cart identity cookie.
//!
//! The backend keys guest carts and order history on an opaque session id the
//! client invents. This middleware guarantees every browser carries one: an
//! incoming `sessionId` cookie is reused, otherwise a UUID v4 is minted and
//! set on the response. Handlers read the id from request extensions and pass
//! it along on cart, order, and payment calls.

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{
        HeaderValue,
        header::{COOKIE, SET_COOKIE},
        request::Parts,
    },
    middleware::Next,
    response::Response,
};
use tower_sessions::cookie::{Cookie, SameSite, time::Duration};
use uuid::Uuid;

use crate::state::AppState;

/// Cart identity cookie name.
pub const SESSION_ID_COOKIE: &str = "sessionId";

/// Cart identity lifetime in seconds (30 days).
const SESSION_ID_MAX_AGE_SECONDS: i64 = 30 * 24 * 60 * 60;

/// The browser's cart identity, taken from the `sessionId` cookie.
#[derive(Clone, Debug)]
pub struct SessionId(pub String);

impl SessionId {
    /// Mint a fresh identity.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Get the id value for backend calls.
    #[must_use]
    pub fn value(&self) -> &str {
        &self.0
    }
}

/// Middleware that ensures every request carries a cart identity.
///
/// Reuses a well-formed incoming cookie; otherwise generates a UUID v4 and
/// sets it on the response with a 30-day lifetime, `Path=/`, `SameSite=Lax`,
/// and `HttpOnly`.
pub async fn session_id_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let existing = request
        .headers()
        .get(COOKIE)
        .and_then(|h| h.to_str().ok())
        .and_then(parse_session_id);

    let (id, is_new) = match existing {
        Some(id) => (id, false),
        None => (Uuid::new_v4().to_string(), true),
    };

    request.extensions_mut().insert(SessionId(id.clone()));

    let mut response = next.run(request).await;

    if is_new {
        let secure = state.config().base_url.starts_with("https://");
        let cookie = Cookie::build((SESSION_ID_COOKIE, id))
            .path("/")
            .same_site(SameSite::Lax)
            .http_only(true)
            .secure(secure)
            .max_age(Duration::seconds(SESSION_ID_MAX_AGE_SECONDS))
            .build();

        if let Ok(value) = HeaderValue::from_str(&cookie.to_string()) {
            response.headers_mut().append(SET_COOKIE, value);
        }
    }

    response
}

/// Pull a usable session id out of a `Cookie` header.
fn parse_session_id(header: &str) -> Option<String> {
    Cookie::split_parse(header)
        .filter_map(Result::ok)
        .find(|c| c.name() == SESSION_ID_COOKIE)
        .map(|c| c.value().to_string())
        .filter(|v| is_valid_session_id(v))
}

/// Shape check on incoming ids. The backend treats them as opaque, so this
/// only rejects values that could not have come from this storefront.
fn is_valid_session_id(value: &str) -> bool {
    (8..=64).contains(&value.len())
        && value
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-')
}

/// Extractor to get the cart identity from request extensions.
impl<S> FromRequestParts<S> for SessionId
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts.extensions.get::<Self>().cloned().unwrap_or_else(|| {
            tracing::warn!(
                "Session id not found in request extensions - middleware may be misconfigured"
            );
            Self::generate()
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_session_id_from_cookie_header() {
        let header = "theme=dark; sessionId=3b241101-e2bb-4255-8caf-4136c566a962; other=1";
        assert_eq!(
            parse_session_id(header).as_deref(),
            Some("3b241101-e2bb-4255-8caf-4136c566a962")
        );
    }

    #[test]
    fn test_parse_session_id_missing() {
        assert_eq!(parse_session_id("theme=dark"), None);
        assert_eq!(parse_session_id(""), None);
    }

    #[test]
    fn test_malformed_ids_are_rejected() {
        assert!(!is_valid_session_id(""));
        assert!(!is_valid_session_id("short"));
        assert!(!is_valid_session_id("has spaces in it"));
        assert!(!is_valid_session_id(&"x".repeat(65)));
        assert!(is_valid_session_id("3b241101-e2bb-4255-8caf-4136c566a962"));

        let header = "sessionId=not%20a%20uuid%20with%20junk";
        assert_eq!(parse_session_id(header), None);
    }

    #[test]
    fn test_generated_ids_are_valid() {
        let id = SessionId::generate();
        assert!(is_valid_session_id(id.value()));
    }
}
