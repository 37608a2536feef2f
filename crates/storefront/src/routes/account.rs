//! Account route handlers.
//!
//! These routes require authentication.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::State,
    response::{IntoResponse, Response},
};
use tracing::instrument;

use crate::api::ApiError;
use crate::api::AuthContext;
use crate::api::types::User;
use crate::error::AppError;
use crate::filters;
use crate::middleware::{RequireAuth, SessionId};
use crate::state::AppState;

/// Profile display data for the account page.
pub struct AccountView {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
}

impl From<User> for AccountView {
    fn from(user: User) -> Self {
        Self {
            name: user.name,
            email: user.email.to_string(),
            phone: user.phone,
        }
    }
}

/// Account overview page template.
#[derive(Template, WebTemplate)]
#[template(path = "account/index.html")]
pub struct AccountIndexTemplate {
    pub user: AccountView,
}

/// Display the account overview.
///
/// The profile comes fresh from the backend; when that read fails the
/// session's copy of the user stands in, so the page still renders.
///
/// # Errors
///
/// Returns an error for expired credentials.
#[instrument(skip_all)]
pub async fn index(
    State(state): State<AppState>,
    session_id: SessionId,
    RequireAuth(record): RequireAuth,
) -> Result<Response, AppError> {
    let ctx = AuthContext::new(session_id.value(), Some(record.token.clone()));

    let user = match state.api().profile(&ctx).await {
        Ok(user) => user,
        Err(ApiError::Unauthorized) => return Err(AppError::Api(ApiError::Unauthorized)),
        Err(e) => {
            tracing::warn!("Profile fetch failed, using session copy: {e}");
            record.user
        }
    };

    let page = AccountIndexTemplate {
        user: AccountView::from(user),
    };
    Ok(page.into_response())
}
