//! HTTP middleware components.
//!
//! Credential checks for the two authentication schemes.

pub mod api_key;
pub mod session_auth;

pub use api_key::{API_KEY_HEADER, require_api_key};
pub use session_auth::require_session;
