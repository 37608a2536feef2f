//! Contact form route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use herbloom_core::Email;

use crate::api::ApiError;
use crate::filters;
use crate::state::AppState;
use crate::stores::{Flash, FlashStore};

/// Contact form data.
#[derive(Debug, Deserialize)]
pub struct ContactForm {
    pub name: String,
    pub email: String,
    pub message: String,
}

/// Contact page template.
#[derive(Template, WebTemplate)]
#[template(path = "contact.html")]
pub struct ContactTemplate {
    pub error: Option<String>,
    pub name: String,
    pub email: String,
    pub message: String,
    pub flash: Option<Flash>,
}

impl ContactTemplate {
    fn blank(flash: Option<Flash>) -> Self {
        Self {
            error: None,
            name: String::new(),
            email: String::new(),
            message: String::new(),
            flash,
        }
    }
}

/// Display the contact form.
pub async fn show(session: Session) -> impl IntoResponse {
    let flash = FlashStore::new(session).take().await;
    ContactTemplate::blank(flash)
}

/// Handle contact form submission.
///
/// Local validation errors re-render the form with what the customer typed;
/// the backend outcome lands back on the page as a flash message.
#[instrument(skip_all)]
pub async fn submit(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<ContactForm>,
) -> Response {
    let rerender = |error: String, form: &ContactForm| {
        ContactTemplate {
            error: Some(error),
            name: form.name.clone(),
            email: form.email.clone(),
            message: form.message.clone(),
            flash: None,
        }
        .into_response()
    };

    let name = form.name.trim();
    if name.is_empty() {
        return rerender("Please provide your name.".to_string(), &form);
    }
    let email = match Email::parse(form.email.trim()) {
        Ok(email) => email,
        Err(_) => {
            return rerender("Please enter a valid email address.".to_string(), &form);
        }
    };
    let message = form.message.trim();
    if message.is_empty() {
        return rerender("Please write a message.".to_string(), &form);
    }

    let flash = FlashStore::new(session);
    match state
        .api()
        .submit_contact(name, email.as_str(), message)
        .await
    {
        Ok(()) => {
            tracing::info!("Contact message submitted");
            flash
                .push(Flash::success(
                    "Thanks for reaching out! We will get back to you soon.",
                ))
                .await;
        }
        Err(ApiError::Validation(message)) => {
            flash.push(Flash::error(message)).await;
        }
        Err(e) => {
            tracing::error!("Contact submission failed: {e}");
            flash
                .push(Flash::error(
                    "We could not send your message. Please try again.",
                ))
                .await;
        }
    }

    Redirect::to("/contact").into_response()
}
