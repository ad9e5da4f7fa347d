//! Ownership policy shared by every resource handler.

use crate::api::ApiError;
use crate::auth::AuthenticatedUser;
use crate::db::{Blog, Post};

/// A resource that belongs to exactly one user.
pub trait Owned {
    fn owner_id(&self) -> i64;
}

impl Owned for Blog {
    fn owner_id(&self) -> i64 {
        self.created_by
    }
}

impl Owned for Post {
    fn owner_id(&self) -> i64 {
        self.owner_id
    }
}

/// Outcome of an authorization check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Permit,
    Deny,
}

impl Access {
    /// Convert a denial into a 403 response.
    pub fn require(self) -> Result<(), ApiError> {
        match self {
            Access::Permit => Ok(()),
            Access::Deny => Err(ApiError::forbidden("You do not own this resource")),
        }
    }
}

/// Only the owner may act on a resource.
pub fn authorize<R: Owned>(caller: &AuthenticatedUser, resource: &R) -> Access {
    if caller.user_id() == resource.owner_id() {
        Access::Permit
    } else {
        tracing::warn!(
            user = %caller.user.username,
            owner_id = resource.owner_id(),
            "Ownership check failed"
        );
        Access::Deny
    }
}
