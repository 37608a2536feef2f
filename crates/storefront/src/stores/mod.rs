//! Typed stores over the per-browser session.
//!
//! Session records live under distinct keys: the auth record
//! (`{ user, token }`), the cart snapshot, and the in-flight checkout state
//! (owned by [`crate::checkout`]). Handlers construct a store per request and
//! mutate state only through it; there is no ambient global state. The
//! backend stays the source of truth throughout.

pub mod auth;
pub mod cart;
pub mod flash;

pub use auth::{AuthRecord, AuthStore};
pub use cart::{CartLineSummary, CartSnapshot, CartStore};
pub use flash::{Flash, FlashLevel, FlashStore};

/// Session keys for typed records.
pub mod keys {
    /// Key for the signed-in customer's auth record.
    pub const AUTH: &str = "auth";

    /// Key for the cart snapshot.
    pub const CART: &str = "cart";

    /// Key for the in-flight checkout state.
    pub const CHECKOUT: &str = "checkout";

    /// Key for the pending flash message.
    pub const FLASH: &str = "flash";
}
