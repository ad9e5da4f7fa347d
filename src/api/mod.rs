mod auth;
mod blogs;
mod error;
mod posts;

use axum::{Router, routing::get};
use std::sync::Arc;

use crate::db::Database;
use crate::jwt::JwtConfig;
use crate::rate_limit::RateLimitConfig;

pub use error::ApiError;

/// Create the API router.
pub fn create_api_router(
    db: Database,
    jwt: Arc<JwtConfig>,
    secure_cookies: bool,
    no_signup: bool,
    rate_limit: Arc<RateLimitConfig>,
) -> Router {
    let auth_state = auth::AuthState {
        db: db.clone(),
        jwt: jwt.clone(),
        secure_cookies,
        no_signup,
        rate_limit,
    };

    let blogs_state = blogs::BlogsState {
        db: db.clone(),
        jwt: jwt.clone(),
    };

    let posts_state = posts::PostsState { db, jwt };

    // Nested roots only match without the trailing slash
    Router::new()
        .nest("/auth", auth::router(auth_state))
        .route(
            "/blog/",
            get(blogs::list_blogs).with_state(blogs_state.clone()),
        )
        .nest("/blog", blogs::router(blogs_state))
        .route(
            "/post/",
            get(posts::list_posts).with_state(posts_state.clone()),
        )
        .nest("/post", posts::router(posts_state))
}
