//! Authentication route handlers.
//!
//! Login, registration, and logout against the backend auth endpoints. A
//! successful call stores the `{ user, token }` record in the session; the
//! bearer token never reaches the browser.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::api::ApiError;
use crate::checkout::CheckoutStore;
use crate::error::{AppError, clear_sentry_user, set_sentry_user};
use crate::filters;
use crate::middleware::SessionId;
use crate::state::AppState;
use crate::stores::{AuthRecord, AuthStore, Flash, FlashStore};

// =============================================================================
// Form and Query Types
// =============================================================================

/// Login form data. `redirect` rides along as a hidden field.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub redirect: Option<String>,
}

/// Registration form data.
#[derive(Debug, Deserialize)]
pub struct RegisterForm {
    pub name: String,
    pub email: String,
    pub password: String,
    pub password_confirm: String,
}

/// Query parameters carrying post-login intent.
#[derive(Debug, Deserialize)]
pub struct LoginQuery {
    pub redirect: Option<String>,
}

/// Where to land after a successful login.
///
/// Only known targets are honored, anything else falls back to the account
/// page.
fn login_destination(redirect: Option<&str>) -> &'static str {
    match redirect {
        Some("checkout") => "/checkout",
        _ => "/account",
    }
}

// =============================================================================
// Templates
// =============================================================================

/// Login page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub error: Option<String>,
    pub email: String,
    pub redirect: Option<String>,
}

/// Register page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/register.html")]
pub struct RegisterTemplate {
    pub error: Option<String>,
    pub name: String,
    pub email: String,
}

// =============================================================================
// Login
// =============================================================================

/// Display the login page.
pub async fn login_page(Query(query): Query<LoginQuery>) -> impl IntoResponse {
    LoginTemplate {
        error: None,
        email: String::new(),
        redirect: query.redirect,
    }
}

/// Handle login form submission.
///
/// # Errors
///
/// Returns an error if the session cannot be written.
#[instrument(skip_all)]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    session_id: SessionId,
    Form(form): Form<LoginForm>,
) -> Result<Response, AppError> {
    let auth = match state
        .api()
        .login(session_id.value(), form.email.trim(), &form.password)
        .await
    {
        Ok(auth) => auth,
        Err(ApiError::Unauthorized) => {
            tracing::info!("Login rejected");
            let page = LoginTemplate {
                error: Some("Incorrect email or password.".to_string()),
                email: form.email,
                redirect: form.redirect,
            };
            return Ok(page.into_response());
        }
        Err(ApiError::Validation(message)) => {
            let page = LoginTemplate {
                error: Some(message),
                email: form.email,
                redirect: form.redirect,
            };
            return Ok(page.into_response());
        }
        Err(e) => {
            tracing::error!("Login call failed: {e}");
            let page = LoginTemplate {
                error: Some("We could not sign you in. Please try again.".to_string()),
                email: form.email,
                redirect: form.redirect,
            };
            return Ok(page.into_response());
        }
    };

    let record = AuthRecord {
        user: auth.user,
        token: auth.token,
    };
    AuthStore::new(session).set(&record).await?;
    set_sentry_user(&record.user.id, Some(record.user.email.as_str()));
    tracing::info!(user_id = %record.user.id, "Customer signed in");

    Ok(Redirect::to(login_destination(form.redirect.as_deref())).into_response())
}

// =============================================================================
// Registration
// =============================================================================

/// Display the registration page.
pub async fn register_page() -> impl IntoResponse {
    RegisterTemplate {
        error: None,
        name: String::new(),
        email: String::new(),
    }
}

/// Handle registration form submission.
///
/// The backend signs the new customer in as part of registration, so the
/// record is stored straight away.
///
/// # Errors
///
/// Returns an error if the session cannot be written.
#[instrument(skip_all)]
pub async fn register(
    State(state): State<AppState>,
    session: Session,
    session_id: SessionId,
    Form(form): Form<RegisterForm>,
) -> Result<Response, AppError> {
    let rerender = |error: String, form: &RegisterForm| {
        RegisterTemplate {
            error: Some(error),
            name: form.name.clone(),
            email: form.email.clone(),
        }
        .into_response()
    };

    let name = form.name.trim();
    if name.is_empty() {
        return Ok(rerender("Please provide your name.".to_string(), &form));
    }
    if form.password != form.password_confirm {
        return Ok(rerender("Passwords do not match.".to_string(), &form));
    }
    if form.password.len() < 8 {
        return Ok(rerender(
            "Password must be at least 8 characters.".to_string(),
            &form,
        ));
    }

    let auth = match state
        .api()
        .register(session_id.value(), name, form.email.trim(), &form.password)
        .await
    {
        Ok(auth) => auth,
        Err(ApiError::Validation(message)) => return Ok(rerender(message, &form)),
        Err(e) => {
            tracing::error!("Registration call failed: {e}");
            return Ok(rerender(
                "We could not create your account. Please try again.".to_string(),
                &form,
            ));
        }
    };

    let record = AuthRecord {
        user: auth.user,
        token: auth.token,
    };
    AuthStore::new(session).set(&record).await?;
    set_sentry_user(&record.user.id, Some(record.user.email.as_str()));
    tracing::info!(user_id = %record.user.id, "Customer registered");

    Ok(Redirect::to("/account").into_response())
}

// =============================================================================
// Logout
// =============================================================================

/// Sign the customer out.
///
/// The cart is keyed by the session identity, not the account, so it
/// survives logout. Any in-flight checkout does not.
#[instrument(skip_all)]
pub async fn logout(session: Session) -> Response {
    let auth = AuthStore::new(session.clone());
    let checkout = CheckoutStore::new(session.clone());

    if let Err(e) = auth.clear().await {
        tracing::error!("Failed to clear auth record: {e}");
    }
    if let Err(e) = checkout.clear().await {
        tracing::warn!("Failed to clear checkout state: {e}");
    }
    clear_sentry_user();

    FlashStore::new(session)
        .push(Flash::info("You have been signed out."))
        .await;
    Redirect::to("/").into_response()
}
