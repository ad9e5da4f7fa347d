//! Axum extractors for authentication.

use axum::{extract::FromRequestParts, http::request::Parts};

use super::errors::{ApiAuthError, AuthErrorKind};
use super::state::HasAuthBackend;
use super::transport::extract_access_token;
use super::types::AuthenticatedUser;
use crate::db::Database;
use crate::jwt::{Claims, JwtConfig};

/// Validate an access token and make sure its JTI has not been revoked.
pub async fn decode_access_token(
    jwt: &JwtConfig,
    db: &Database,
    token: &str,
) -> Result<Claims, AuthErrorKind> {
    let claims = jwt.validate_access_token(token).map_err(|e| {
        tracing::debug!("Rejected access token: {}", e);
        AuthErrorKind::InvalidToken
    })?;

    let revoked = db
        .revoked_tokens()
        .is_revoked(&claims.jti)
        .await
        .map_err(|e| {
            tracing::error!("Failed to check token revocation: {}", e);
            AuthErrorKind::DatabaseError
        })?;

    if revoked {
        tracing::warn!(jti = %claims.jti, "Revoked access token presented");
        return Err(AuthErrorKind::TokenRevoked);
    }

    Ok(claims)
}

/// Resolve the caller from the access token carried by a request.
async fn authenticate_request<S>(
    parts: &Parts,
    state: &S,
) -> Result<AuthenticatedUser, AuthErrorKind>
where
    S: HasAuthBackend + Send + Sync,
{
    let token = extract_access_token(parts).ok_or(AuthErrorKind::NotAuthenticated)?;
    let claims = decode_access_token(state.jwt(), state.db(), &token).await?;

    let user = state
        .db()
        .users()
        .get_by_username(&claims.sub)
        .await
        .map_err(|e| {
            tracing::error!("Failed to get user: {}", e);
            AuthErrorKind::DatabaseError
        })?
        .ok_or(AuthErrorKind::UserNotFound)?;

    Ok(AuthenticatedUser { claims, user })
}

/// Extractor for API endpoints that require authentication.
/// Every request re-derives the caller from its own access token.
pub struct ApiAuth(pub AuthenticatedUser);

impl<S> FromRequestParts<S> for ApiAuth
where
    S: HasAuthBackend + Send + Sync,
{
    type Rejection = ApiAuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        authenticate_request(parts, state)
            .await
            .map(ApiAuth)
            .map_err(ApiAuthError::from)
    }
}
