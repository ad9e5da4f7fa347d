//! Account and token endpoints.
//!
//! - POST `/register` - Create an account
//! - POST `/login` - Exchange credentials for a token pair
//! - POST `/refresh` - Exchange a refresh token for a new pair (rotates the JTI)
//! - POST `/logout` - Revoke the current pair and clear the refresh cookie
//! - GET `/me` - Current user

use axum::{
    Json, Router,
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode, header::SET_COOKIE},
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, warn};

use super::error::{ApiError, ResultExt};
use crate::auth::{ApiAuth, REFRESH_COOKIE_NAME, clear_refresh_cookie, get_cookie, refresh_cookie};
use crate::db::{Database, is_unique_violation};
use crate::impl_has_auth_backend;
use crate::jwt::{JwtConfig, TokenPair};
use crate::password::{hash_password, verify_password};
use crate::rate_limit::{RateLimitConfig, rate_limit_login, rate_limit_register};

const MAX_USERNAME_LENGTH: usize = 32;
const MIN_PASSWORD_LENGTH: usize = 8;
const MAX_PASSWORD_LENGTH: usize = 128;

#[derive(Clone)]
pub struct AuthState {
    pub db: Database,
    pub jwt: Arc<JwtConfig>,
    pub secure_cookies: bool,
    pub no_signup: bool,
    pub rate_limit: Arc<RateLimitConfig>,
}

impl_has_auth_backend!(AuthState);

pub fn router(state: AuthState) -> Router {
    let login_router = Router::new()
        .route("/login", post(login))
        .route("/refresh", post(refresh))
        .with_state(state.clone())
        .layer(middleware::from_fn_with_state(
            state.rate_limit.clone(),
            rate_limit_login,
        ));

    let session_router = Router::new()
        .route("/logout", post(logout))
        .route("/me", get(me))
        .with_state(state.clone());

    let router = Router::new().merge(login_router).merge(session_router);

    if state.no_signup {
        router
    } else {
        let register_router = Router::new()
            .route("/register", post(register))
            .with_state(state.clone())
            .layer(middleware::from_fn_with_state(
                state.rate_limit.clone(),
                rate_limit_register,
            ));
        router.merge(register_router)
    }
}

// --- Request/Response types ---

#[derive(Deserialize)]
struct CredentialsRequest {
    username: String,
    password: String,
}

#[derive(Deserialize)]
struct RefreshRequest {
    #[serde(default)]
    refresh_token: Option<String>,
}

#[derive(Serialize)]
struct UserResponse {
    uuid: String,
    username: String,
}

#[derive(Serialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: String,
    token_type: &'static str,
    expires_in: u64,
}

// --- Helpers ---

fn validate_username(username: &str) -> Result<&str, ApiError> {
    let username = username.trim();

    if username.is_empty() {
        return Err(ApiError::bad_request("Username cannot be empty"));
    }

    if username.len() > MAX_USERNAME_LENGTH {
        return Err(ApiError::bad_request(format!(
            "Username cannot be longer than {} characters",
            MAX_USERNAME_LENGTH
        )));
    }

    if !username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_')
    {
        return Err(ApiError::bad_request(
            "Username can only contain letters, numbers, and underscores",
        ));
    }

    Ok(username)
}

fn validate_password(password: &str) -> Result<(), ApiError> {
    let len = password.chars().count();
    if len < MIN_PASSWORD_LENGTH {
        return Err(ApiError::bad_request(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LENGTH
        )));
    }
    if len > MAX_PASSWORD_LENGTH {
        return Err(ApiError::bad_request(format!(
            "Password cannot be longer than {} characters",
            MAX_PASSWORD_LENGTH
        )));
    }
    Ok(())
}

/// Issue a new pair for `subject` and build the response, setting the refresh cookie.
fn issue_tokens(state: &AuthState, subject: &str) -> Result<Response, ApiError> {
    let pair: TokenPair = state.jwt.issue_pair(subject).map_err(|e| {
        error!("Failed to generate tokens: {}", e);
        ApiError::internal("Failed to generate token")
    })?;

    let cookie = refresh_cookie(
        &pair.refresh_token,
        pair.refresh_duration,
        state.secure_cookies,
    );

    Ok((
        StatusCode::OK,
        [(SET_COOKIE, cookie)],
        Json(TokenResponse {
            access_token: pair.access_token,
            refresh_token: pair.refresh_token,
            token_type: "bearer",
            expires_in: pair.access_duration,
        }),
    )
        .into_response())
}

// --- Handlers ---

async fn register(
    State(state): State<AuthState>,
    Json(payload): Json<CredentialsRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let username = validate_username(&payload.username)?.to_string();
    validate_password(&payload.password)?;

    let available = state
        .db
        .users()
        .is_username_available(&username)
        .await
        .db_err("Failed to check username availability")?;

    if !available {
        return Err(ApiError::conflict("Username is already taken"));
    }

    // Argon2 is CPU bound
    let password = payload.password;
    let password_hash = tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| ApiError::internal(format!("Password hashing task failed: {}", e)))?
        .map_err(|e| {
            error!("Failed to hash password: {}", e);
            ApiError::internal("Failed to hash password")
        })?;

    let uuid = uuid::Uuid::new_v4().to_string();

    match state.db.users().create(&uuid, &username, &password_hash).await {
        Ok(_) => {}
        Err(e) if is_unique_violation(&e) => {
            return Err(ApiError::conflict("Username is already taken"));
        }
        Err(e) => return Err(ApiError::db_error("Failed to create user", e)),
    }

    info!(username = %username, "User registered");

    Ok((StatusCode::CREATED, Json(UserResponse { uuid, username })))
}

async fn login(
    State(state): State<AuthState>,
    Json(payload): Json<CredentialsRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let invalid = || ApiError::unauthorized("Invalid username or password");

    let user = state
        .db
        .users()
        .get_by_username(payload.username.trim())
        .await
        .db_err("Failed to get user")?
        .ok_or_else(invalid)?;

    let password = payload.password;
    let hash = user.password_hash.clone();
    let matches = tokio::task::spawn_blocking(move || verify_password(&password, &hash))
        .await
        .map_err(|e| ApiError::internal(format!("Password verification task failed: {}", e)))?
        .map_err(|e| {
            error!(username = %user.username, "Stored password hash is invalid: {}", e);
            ApiError::internal("Failed to verify password")
        })?;

    if !matches {
        warn!(username = %user.username, "Failed login attempt");
        return Err(invalid());
    }

    info!(username = %user.username, "User logged in");
    issue_tokens(&state, &user.username)
}

/// Exchange a refresh token (JSON body or cookie) for a new pair.
/// The old JTI is revoked, so the previous access and refresh tokens stop working.
async fn refresh(
    State(state): State<AuthState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    let from_body = if body.is_empty() {
        None
    } else {
        let request: RefreshRequest = serde_json::from_slice(&body)
            .map_err(|e| ApiError::bad_request(format!("Invalid refresh request: {}", e)))?;
        request.refresh_token.filter(|t| !t.is_empty())
    };

    let refresh_token = from_body
        .or_else(|| get_cookie(&headers, REFRESH_COOKIE_NAME).map(str::to_string))
        .filter(|t| !t.is_empty())
        .ok_or_else(|| ApiError::unauthorized("No refresh token"))?;

    let claims = state
        .jwt
        .validate_refresh_token(&refresh_token)
        .map_err(|_| ApiError::unauthorized("Invalid or expired refresh token"))?;

    let user = state
        .db
        .users()
        .get_by_username(&claims.sub)
        .await
        .db_err("Failed to get user")?
        .ok_or_else(|| ApiError::unauthorized("User not found"))?;

    // Revoking is the atomic check: only one refresh per JTI can succeed
    let rotated = state
        .db
        .revoked_tokens()
        .revoke(&claims.jti, state.jwt.pair_expires_at(claims.iat))
        .await
        .db_err("Failed to revoke token")?;

    if !rotated {
        warn!(jti = %claims.jti, username = %user.username, "Revoked refresh token presented");
        return Err(ApiError::unauthorized("Refresh token has been revoked"));
    }

    info!(username = %user.username, "Token pair refreshed");
    issue_tokens(&state, &user.username)
}

async fn logout(
    State(state): State<AuthState>,
    ApiAuth(auth): ApiAuth,
) -> Result<impl IntoResponse, ApiError> {
    state
        .db
        .revoked_tokens()
        .revoke(&auth.claims.jti, state.jwt.pair_expires_at(auth.claims.iat))
        .await
        .db_err("Failed to revoke token")?;

    info!(username = %auth.user.username, "User logged out");

    Ok((
        StatusCode::OK,
        [(SET_COOKIE, clear_refresh_cookie(state.secure_cookies))],
        Json(serde_json::json!({ "message": "Logged out successfully" })),
    ))
}

async fn me(ApiAuth(auth): ApiAuth) -> impl IntoResponse {
    Json(UserResponse {
        uuid: auth.user.uuid,
        username: auth.user.username,
    })
}
