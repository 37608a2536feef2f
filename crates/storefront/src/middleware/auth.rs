//! Authentication middleware and extractors.
//!
//! Provides extractors for requiring a signed-in customer in route handlers,
//! plus the middleware that signs a customer out when the backend stops
//! accepting their token.

use axum::{
    extract::{FromRequestParts, Request},
    http::{HeaderName, HeaderValue, StatusCode, header::CONTENT_TYPE, request::Parts},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;

use crate::api::AuthContext;
use crate::error::clear_sentry_user;
use crate::middleware::session_id::SessionId;
use crate::stores::{AuthRecord, AuthStore};

/// Header htmx sets on every request it issues.
const HTMX_REQUEST_HEADER: &str = "hx-request";

/// Response header htmx interprets as a client-side redirect.
const HTMX_REDIRECT_HEADER: &str = "hx-redirect";

/// Extractor that requires a signed-in customer.
///
/// If nobody is signed in, page requests redirect to the login form (keeping
/// checkout intent), htmx requests get an `HX-Redirect`, and JSON requests
/// get a bare 401.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(
///     RequireAuth(auth): RequireAuth,
/// ) -> impl IntoResponse {
///     format!("Hello, {}!", auth.user.name)
/// }
/// ```
pub struct RequireAuth(pub AuthRecord);

/// Error returned when authentication is required but nobody is signed in.
pub enum AuthRejection {
    /// Full-page redirect to the login form (for HTML requests).
    RedirectToLogin(String),
    /// Client-side redirect (for htmx fragment requests).
    HtmxRedirect(String),
    /// Bare unauthorized response (for JSON requests).
    Unauthorized,
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::RedirectToLogin(target) => Redirect::to(&target).into_response(),
            Self::HtmxRedirect(target) => {
                let mut response = StatusCode::UNAUTHORIZED.into_response();
                if let Ok(value) = HeaderValue::from_str(&target) {
                    response
                        .headers_mut()
                        .insert(HeaderName::from_static(HTMX_REDIRECT_HEADER), value);
                }
                response
            }
            Self::Unauthorized => StatusCode::UNAUTHORIZED.into_response(),
        }
    }
}

impl<S> FromRequestParts<S> for RequireAuth
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // Get the session from extensions (set by SessionManagerLayer)
        let session = parts
            .extensions
            .get::<Session>()
            .ok_or(AuthRejection::Unauthorized)?;

        let record = AuthStore::new(session.clone()).get().await;

        record.map(Self).ok_or_else(|| {
            if parts.headers.contains_key(HTMX_REQUEST_HEADER) {
                AuthRejection::HtmxRedirect(login_target(parts.uri.path()))
            } else if wants_json(parts) {
                AuthRejection::Unauthorized
            } else {
                AuthRejection::RedirectToLogin(login_target(parts.uri.path()))
            }
        })
    }
}

/// Extractor that optionally gets the signed-in customer.
///
/// Unlike `RequireAuth`, this does not reject the request when nobody is
/// signed in.
pub struct OptionalAuth(pub Option<AuthRecord>);

impl<S> FromRequestParts<S> for OptionalAuth
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let record = match parts.extensions.get::<Session>() {
            Some(session) => AuthStore::new(session.clone()).get().await,
            None => None,
        };

        Ok(Self(record))
    }
}

/// Extractor assembling the per-request backend call context: the cart
/// identity plus the signed-in customer's bearer token, when there is one.
impl<S> FromRequestParts<S> for AuthContext
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let SessionId(session_id) = SessionId::from_request_parts(parts, state).await?;

        let token = match parts.extensions.get::<Session>() {
            Some(session) => AuthStore::new(session.clone()).token().await,
            None => None,
        };

        Ok(Self::new(session_id, token))
    }
}

/// Middleware that signs the customer out when the backend returns 401.
///
/// A stored token can outlive its backend validity. Rather than teach every
/// handler about that, any 401 bubbling through here clears the auth record
/// and steers the browser to the login form. JSON requests keep their 401 so
/// scripted callers can handle it themselves.
pub async fn handle_expired_auth(request: Request, next: Next) -> Response {
    let session = request.extensions().get::<Session>().cloned();
    let is_htmx = request.headers().contains_key(HTMX_REQUEST_HEADER);
    let is_json = request
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("application/json"));
    let target = login_target(request.uri().path());

    let response = next.run(request).await;

    if response.status() != StatusCode::UNAUTHORIZED {
        return response;
    }

    if let Some(session) = session {
        let auth = AuthStore::new(session);
        if auth.get().await.is_some() {
            tracing::info!("Backend rejected stored token, signing customer out");
            if let Err(e) = auth.clear().await {
                tracing::warn!(error = %e, "Failed to clear auth record after 401");
            }
            clear_sentry_user();
        }
    }

    if is_json {
        return response;
    }
    if is_htmx {
        let mut response = StatusCode::UNAUTHORIZED.into_response();
        if let Ok(value) = HeaderValue::from_str(&target) {
            response
                .headers_mut()
                .insert(HeaderName::from_static(HTMX_REDIRECT_HEADER), value);
        }
        return response;
    }
    Redirect::to(&target).into_response()
}

/// Login URL, carrying checkout intent through the round trip.
fn login_target(path: &str) -> String {
    if path.starts_with("/checkout") {
        "/auth/login?redirect=checkout".to_string()
    } else {
        "/auth/login".to_string()
    }
}

fn wants_json(parts: &Parts) -> bool {
    parts
        .headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("application/json"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_login_target_keeps_checkout_intent() {
        assert_eq!(login_target("/checkout"), "/auth/login?redirect=checkout");
        assert_eq!(
            login_target("/checkout/payment"),
            "/auth/login?redirect=checkout"
        );
        assert_eq!(login_target("/orders"), "/auth/login");
        assert_eq!(login_target("/"), "/auth/login");
    }
}
