//! Domain services.
//!
//! Each service owns a handle to the entity store and takes the caller's
//! [`RequestContext`](crate::access::RequestContext) explicitly.

pub mod account;
pub mod blog;
pub mod credentials;
pub mod session_token;
pub mod site;
pub mod slug;

pub use account::{AccountService, AuthSession};
pub use blog::BlogService;
pub use credentials::CredentialValidator;
pub use session_token::SessionTokens;
pub use site::SiteService;

use uuid::Uuid;

/// Parse a path id. Malformed ids are indistinguishable from unknown ones.
pub(crate) fn parse_id(raw: &str) -> Option<Uuid> {
    raw.parse().ok()
}
