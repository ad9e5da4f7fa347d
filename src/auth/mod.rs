//! JWT authentication.
//!
//! Tokens are issued in pairs sharing one JTI: a short-lived access token sent
//! with every request and a long-lived refresh token exchanged for a new pair.
//! Both are stateless until their JTI is revoked by logout or rotation.

mod cookie;
mod errors;
mod extractors;
mod ip;
mod state;
mod transport;
mod types;

pub use cookie::{REFRESH_COOKIE_NAME, clear_refresh_cookie, get_cookie, refresh_cookie};
pub use errors::{ApiAuthError, AuthErrorKind};
pub use extractors::{ApiAuth, decode_access_token};
pub use ip::extract_client_ip;
pub use state::HasAuthBackend;
pub use types::AuthenticatedUser;
