//! One-shot flash messages.
//!
//! A handler queues a flash after a redirect-worthy action (order cancelled,
//! review posted, contact sent); the next page render takes and shows it.
//! Reading consumes the message, so it appears exactly once.

use serde::{Deserialize, Serialize};
use tower_sessions::Session;

use crate::stores::keys;

/// Banner severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlashLevel {
    Success,
    Error,
    Info,
}

impl FlashLevel {
    /// CSS class suffix for the banner.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Error => "error",
            Self::Info => "info",
        }
    }
}

/// A message shown once on the next page view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flash {
    pub level: FlashLevel,
    pub message: String,
}

impl Flash {
    #[must_use]
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: FlashLevel::Success,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: FlashLevel::Error,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: FlashLevel::Info,
            message: message.into(),
        }
    }
}

/// Typed access to the session's pending flash.
#[derive(Debug, Clone)]
pub struct FlashStore {
    session: Session,
}

impl FlashStore {
    #[must_use]
    pub const fn new(session: Session) -> Self {
        Self { session }
    }

    /// Queue a flash for the next page view, replacing any pending one.
    ///
    /// # Errors
    ///
    /// Returns an error if the session cannot be modified.
    pub async fn set(&self, flash: Flash) -> Result<(), tower_sessions::session::Error> {
        self.session.insert(keys::FLASH, &flash).await
    }

    /// Set the flash, logging instead of failing when the session write
    /// errors. A lost notification is not worth an error page.
    pub async fn push(&self, flash: Flash) {
        if let Err(e) = self.set(flash).await {
            tracing::warn!("Failed to store flash message: {e}");
        }
    }

    /// Take the pending flash, leaving none behind.
    pub async fn take(&self) -> Option<Flash> {
        self.session.remove(keys::FLASH).await.ok().flatten()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_constructors_set_level() {
        assert_eq!(Flash::success("Order cancelled").level, FlashLevel::Success);
        assert_eq!(Flash::error("Could not cancel").level, FlashLevel::Error);
        assert_eq!(Flash::info("Signed out").level, FlashLevel::Info);
    }

    #[test]
    fn test_level_css_suffix() {
        assert_eq!(FlashLevel::Success.as_str(), "success");
        assert_eq!(FlashLevel::Error.as_str(), "error");
        assert_eq!(FlashLevel::Info.as_str(), "info");
    }

    #[test]
    fn test_flash_roundtrips_through_session_encoding() {
        let flash = Flash::success("Review posted");
        let json = serde_json::to_string(&flash).unwrap();
        assert!(json.contains(r#""level":"success""#));

        let back: Flash = serde_json::from_str(&json).unwrap();
        assert_eq!(back, flash);
    }
}
