//! Rate limiting for authentication endpoints.
//!
//! Uses a token bucket algorithm with per-IP tracking to slow down password
//! guessing and signup spam.

use axum::{
    Json,
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use governor::{Quota, RateLimiter, clock::DefaultClock, state::keyed::DefaultKeyedStateStore};
use std::{num::NonZeroU32, sync::Arc};

use crate::auth::extract_client_ip;
use crate::cli::IpExtractor;

/// Per-IP rate limiter.
pub type IpLimiter = RateLimiter<String, DefaultKeyedStateStore<String>, DefaultClock>;

/// Default login attempts per minute per IP.
pub const LOGIN_PER_MINUTE: u32 = 10;

/// Default registrations per minute per IP.
pub const REGISTER_PER_MINUTE: u32 = 3;

/// Rate limiting configuration for authentication endpoints.
#[derive(Clone)]
pub struct RateLimitConfig {
    pub login: Arc<IpLimiter>,
    pub register: Arc<IpLimiter>,
    /// Proxy header to key on. None keys on the socket address.
    pub ip_extractor: Option<IpExtractor>,
}

impl RateLimitConfig {
    /// Create limiters allowing the given number of requests per minute per IP.
    /// A zero quota is treated as one.
    pub fn new(login_per_minute: u32, register_per_minute: u32) -> Self {
        Self {
            login: Arc::new(RateLimiter::keyed(per_minute(login_per_minute))),
            register: Arc::new(RateLimiter::keyed(per_minute(register_per_minute))),
            ip_extractor: None,
        }
    }

    /// Key limits on a trusted proxy header instead of the socket address.
    pub fn with_ip_extractor(mut self, ip_extractor: Option<IpExtractor>) -> Self {
        self.ip_extractor = ip_extractor;
        self
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self::new(LOGIN_PER_MINUTE, REGISTER_PER_MINUTE)
    }
}

fn per_minute(n: u32) -> Quota {
    Quota::per_minute(NonZeroU32::new(n).unwrap_or(NonZeroU32::MIN))
}

fn check(
    config: &RateLimitConfig,
    limiter: &IpLimiter,
    request: &Request,
    message: &'static str,
) -> Result<(), Response> {
    let ip = extract_client_ip(request, config.ip_extractor.as_ref()).map_err(|e| {
        tracing::warn!(reason = e, "Unable to determine client IP");
        (
            StatusCode::FORBIDDEN,
            Json(serde_json::json!({ "error": "Unable to determine client IP" })),
        )
            .into_response()
    })?;

    limiter.check_key(&ip).map_err(|_| {
        tracing::warn!(ip = %ip, "Rate limit exceeded");
        (
            StatusCode::TOO_MANY_REQUESTS,
            Json(serde_json::json!({ "error": message })),
        )
            .into_response()
    })
}

/// Middleware for rate limiting login and refresh endpoints.
pub async fn rate_limit_login(
    State(config): State<Arc<RateLimitConfig>>,
    request: Request,
    next: Next,
) -> Response {
    match check(
        &config,
        &config.login,
        &request,
        "Too many authentication attempts. Please wait before trying again.",
    ) {
        Ok(()) => next.run(request).await,
        Err(response) => response,
    }
}

/// Middleware for rate limiting user registration.
pub async fn rate_limit_register(
    State(config): State<Arc<RateLimitConfig>>,
    request: Request,
    next: Next,
) -> Response {
    match check(
        &config,
        &config.register,
        &request,
        "Too many signup attempts. Please wait before trying again.",
    ) {
        Ok(()) => next.run(request).await,
        Err(response) => response,
    }
}
