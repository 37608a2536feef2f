//! Static content page route handlers.
//!
//! Serves the markdown-backed policy and info pages.

use askama::Template;
use askama_web::WebTemplate;
use axum::{Router, extract::State, response::IntoResponse, routing::get};
use chrono::NaiveDate;
use tracing::instrument;

use crate::error::AppError;
use crate::filters;
use crate::state::AppState;

/// Content page template.
#[derive(Template, WebTemplate)]
#[template(path = "pages/content.html")]
pub struct ContentPageTemplate {
    pub title: String,
    pub description: String,
    pub updated_at: Option<NaiveDate>,
    pub content_html: String,
}

/// Serve a content page by slug.
fn serve_content_page(state: &AppState, slug: &str) -> Result<ContentPageTemplate, AppError> {
    let page = state
        .content()
        .get_page(slug)
        .ok_or_else(|| AppError::NotFound("Page".to_string()))?;

    Ok(ContentPageTemplate {
        title: page.meta.title.clone(),
        description: page.meta.description.clone().unwrap_or_default(),
        updated_at: page.meta.updated_at,
        content_html: page.content_html.clone(),
    })
}

/// Display the About page.
///
/// # Errors
///
/// Returns 404 if the page doesn't exist.
#[instrument(skip(state))]
pub async fn about(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    serve_content_page(&state, "about")
}

/// Display the Privacy Policy page.
///
/// # Errors
///
/// Returns 404 if the page doesn't exist.
#[instrument(skip(state))]
pub async fn privacy_policy(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    serve_content_page(&state, "privacy-policy")
}

/// Display the Terms of Service page.
///
/// # Errors
///
/// Returns 404 if the page doesn't exist.
#[instrument(skip(state))]
pub async fn terms_of_service(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    serve_content_page(&state, "terms-of-service")
}

/// Display the Shipping Policy page.
///
/// # Errors
///
/// Returns 404 if the page doesn't exist.
#[instrument(skip(state))]
pub async fn shipping_policy(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    serve_content_page(&state, "shipping-policy")
}

/// Display the Refund Policy page.
///
/// # Errors
///
/// Returns 404 if the page doesn't exist.
#[instrument(skip(state))]
pub async fn refund_policy(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    serve_content_page(&state, "refund-policy")
}

/// Create the pages routes router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/about", get(about))
        .route("/privacy-policy", get(privacy_policy))
        .route("/terms-of-service", get(terms_of_service))
        .route("/shipping-policy", get(shipping_policy))
        .route("/refund-policy", get(refund_policy))
}
