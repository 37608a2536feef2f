//! Application state shared across handlers.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::api::{ApiClient, ApiError};
use crate::config::StorefrontConfig;
use crate::content::{ContentError, ContentStore};

/// Error constructing application state.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("api client error: {0}")]
    Api(#[from] ApiError),
    #[error("content error: {0}")]
    Content(#[from] ContentError),
}

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like the backend client and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    api: ApiClient,
    content: ContentStore,
    cart_tickets: AtomicU64,
}

impl AppState {
    /// Create a new application state.
    ///
    /// Builds the backend client and loads markdown content from disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build or content pages
    /// fail to load.
    pub fn new(config: StorefrontConfig) -> Result<Self, StateError> {
        let api = ApiClient::new(&config.api)?;
        let content = ContentStore::load(&config.content_dir)?;

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                api,
                content,
                cart_tickets: AtomicU64::new(0),
            }),
        })
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the backend API client.
    #[must_use]
    pub fn api(&self) -> &ApiClient {
        &self.inner.api
    }

    /// Get a reference to the markdown content store.
    #[must_use]
    pub fn content(&self) -> &ContentStore {
        &self.inner.content
    }

    /// Take the next cart refresh ticket.
    ///
    /// Tickets are process-wide monotonic, so any two refreshes of the same
    /// session are ordered and a stale snapshot can be detected on commit.
    pub fn next_cart_ticket(&self) -> u64 {
        self.inner.cart_tickets.fetch_add(1, Ordering::Relaxed) + 1
    }
}
