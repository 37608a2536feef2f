//! Auth record store.

use serde::{Deserialize, Serialize};
use tower_sessions::Session;

use crate::api::types::User;
use crate::stores::keys;

/// The signed-in customer's identity as held in the session.
///
/// The token is what the backend issued at login; it is attached as a
/// bearer header on authenticated calls and never sent to the browser.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthRecord {
    pub user: User,
    pub token: String,
}

/// Typed access to the session's auth record.
#[derive(Debug, Clone)]
pub struct AuthStore {
    session: Session,
}

impl AuthStore {
    #[must_use]
    pub const fn new(session: Session) -> Self {
        Self { session }
    }

    /// The current auth record, if the customer is signed in.
    ///
    /// Session read failures are treated as signed-out.
    pub async fn get(&self) -> Option<AuthRecord> {
        self.session.get(keys::AUTH).await.ok().flatten()
    }

    /// The bearer token alone, for building an API context.
    pub async fn token(&self) -> Option<String> {
        self.get().await.map(|record| record.token)
    }

    /// Replace the auth record after login or registration.
    ///
    /// # Errors
    ///
    /// Returns an error if the session cannot be modified.
    pub async fn set(&self, record: &AuthRecord) -> Result<(), tower_sessions::session::Error> {
        self.session.insert(keys::AUTH, record).await
    }

    /// Remove the auth record (logout or expired credentials).
    ///
    /// # Errors
    ///
    /// Returns an error if the session cannot be modified.
    pub async fn clear(&self) -> Result<(), tower_sessions::session::Error> {
        self.session.remove::<AuthRecord>(keys::AUTH).await?;
        Ok(())
    }
}
