//! HTTP middleware stack for storefront.
//!
//! # Middleware Order (bottom to top in Router)
//!
//! 1. Sentry layer (capture errors)
//! 2. `TraceLayer` (request tracing)
//! 3. Request ID (add unique ID to each request)
//! 4. CSP nonce (generate per-request nonce for the payment widget script)
//! 5. Session layer (tower-sessions with in-memory store)
//! 6. Cart identity (ensure the `sessionId` cookie exists)
//! 7. Expired auth (sign out on backend 401)
//! 8. Security headers (CSP, isolation, etc.)
//! 9. Rate limiting (governor, on auth and cart routes)

pub mod auth;
pub mod csp;
pub mod rate_limit;
pub mod request_id;
pub mod security_headers;
pub mod session;
pub mod session_id;

pub use auth::{OptionalAuth, RequireAuth, handle_expired_auth};
pub use csp::{CspNonce, csp_nonce_middleware};
pub use rate_limit::{api_rate_limiter, auth_rate_limiter};
pub use request_id::request_id_middleware;
pub use security_headers::security_headers_middleware;
pub use session::create_session_layer;
pub use session_id::{SessionId, session_id_middleware};
