//! Locating the access token in a request.
//!
//! Checked in order: `Authorization: Bearer`, `?token=` query parameter,
//! `access_token` cookie.

use axum::{
    extract::Query,
    http::{header, request::Parts},
};
use serde::Deserialize;

use super::cookie::{ACCESS_COOKIE_NAME, get_cookie};

#[derive(Deserialize)]
struct TokenQuery {
    token: Option<String>,
}

/// Extract a bearer token from the Authorization header.
fn bearer_token(headers: &axum::http::HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let token = value.strip_prefix("Bearer ")?.trim();
    if token.is_empty() { None } else { Some(token) }
}

/// Find the access token carried by a request, if any.
pub fn extract_access_token(parts: &Parts) -> Option<String> {
    if let Some(token) = bearer_token(&parts.headers) {
        return Some(token.to_string());
    }

    if let Ok(Query(query)) = Query::<TokenQuery>::try_from_uri(&parts.uri) {
        if let Some(token) = query.token.filter(|t| !t.is_empty()) {
            return Some(token);
        }
    }

    get_cookie(&parts.headers, ACCESS_COOKIE_NAME)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
}
