//! Authentication user types.

use crate::db::User;
use crate::jwt::Claims;

/// Caller identity resolved from a valid access token.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    /// JWT claims from the access token
    pub claims: Claims,
    /// User record the token's subject resolved to
    pub user: User,
}

impl AuthenticatedUser {
    /// Database user ID.
    pub fn user_id(&self) -> i64 {
        self.user.id
    }
}
