//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures errors to Sentry before
//! responding to the client. All route handlers should return `Result<T, AppError>`.

use askama::Template;
use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use thiserror::Error;

use crate::api::ApiError;
use crate::checkout::CheckoutError;

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Backend API call failed.
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    /// Checkout flow violation.
    #[error("Checkout error: {0}")]
    Checkout(#[from] CheckoutError),

    /// Session store operation failed.
    #[error("Session error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),
}

/// Branded error page.
#[derive(Template)]
#[template(path = "error.html")]
struct ErrorPage {
    status: u16,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Capture server errors to Sentry
        let server_side = match &self {
            Self::Api(err) => err.is_server_error(),
            Self::Session(_) => true,
            Self::Checkout(_) | Self::NotFound(_) => false,
        };
        if server_side {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        let status = match &self {
            Self::Api(err) => match err {
                ApiError::NotFound(_) => StatusCode::NOT_FOUND,
                ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
                ApiError::Validation(_) => StatusCode::BAD_REQUEST,
                ApiError::RateLimited(_) => StatusCode::TOO_MANY_REQUESTS,
                _ => StatusCode::BAD_GATEWAY,
            },
            Self::Checkout(err) => match err {
                CheckoutError::InvalidTransition { .. } => StatusCode::CONFLICT,
                _ => StatusCode::BAD_REQUEST,
            },
            Self::Session(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
        };

        // Don't expose internal error details to clients
        let message = match &self {
            Self::Api(err) => match err {
                ApiError::NotFound(what) => format!("{what} not found"),
                ApiError::Unauthorized => "Please sign in to continue".to_string(),
                ApiError::Validation(msg) => msg.clone(),
                ApiError::RateLimited(_) => "Too many requests, please slow down".to_string(),
                _ => "External service error".to_string(),
            },
            Self::Checkout(err) => err.to_string(),
            Self::Session(_) => "Internal server error".to_string(),
            Self::NotFound(what) => format!("{what} not found"),
        };

        let page = ErrorPage {
            status: status.as_u16(),
            message: message.clone(),
        };
        match page.render() {
            Ok(body) => (status, Html(body)).into_response(),
            Err(_) => (status, message).into_response(),
        }
    }
}

/// Set the Sentry user context from a user ID.
///
/// Call this after successful authentication to associate errors with users.
pub fn set_sentry_user(user_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
///
/// Call this on logout to stop associating errors with the user.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_error_display() {
        let err = AppError::NotFound("product 42".to_string());
        assert_eq!(err.to_string(), "Not found: product 42");

        let err = AppError::Checkout(CheckoutError::EmptyCart);
        assert_eq!(err.to_string(), "Checkout error: Your cart is empty");
    }

    #[test]
    fn test_app_error_status_codes() {
        fn get_status(err: AppError) -> StatusCode {
            let response = err.into_response();
            response.status()
        }

        assert_eq!(
            get_status(AppError::NotFound("test".to_string())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(AppError::Checkout(CheckoutError::MissingField("name"))),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(AppError::Checkout(CheckoutError::InvalidTransition {
                stage: "payment",
                action: "place an order",
            })),
            StatusCode::CONFLICT
        );
    }

    #[test]
    fn test_api_error_status_mapping() {
        fn get_status(err: ApiError) -> StatusCode {
            AppError::from(err).into_response().status()
        }

        assert_eq!(
            get_status(ApiError::NotFound("Product".to_string())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(get_status(ApiError::Unauthorized), StatusCode::UNAUTHORIZED);
        assert_eq!(
            get_status(ApiError::Validation("quantity must be at least 1".to_string())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(ApiError::RateLimited(30)),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(
            get_status(ApiError::Backend {
                status: 500,
                message: "boom".to_string()
            }),
            StatusCode::BAD_GATEWAY
        );
    }
}
