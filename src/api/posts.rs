//! Posts API.
//!
//! All endpoints require an access token. A post is owned by whoever owns its blog.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    response::IntoResponse,
    routing::{delete, get, post},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

use super::error::{ApiError, ResultExt, validate_title, validate_uuid};
use crate::auth::{ApiAuth, AuthenticatedUser};
use crate::db::{Blog, Database, Post, PostSummary};
use crate::impl_has_auth_backend;
use crate::jwt::JwtConfig;
use crate::policy::authorize;

const MAX_TITLE_LENGTH: usize = 200;

/// State for posts endpoints.
#[derive(Clone)]
pub struct PostsState {
    pub db: Database,
    pub jwt: Arc<JwtConfig>,
}

impl_has_auth_backend!(PostsState);

pub fn router(state: PostsState) -> Router {
    Router::new()
        .route("/", get(list_posts))
        .route("/create", post(create_post))
        .route("/create/", post(create_post))
        .route("/delete/{id}", delete(delete_post))
        .route("/{id}", post(post_details))
        .with_state(state)
}

// --- Request/Response types ---

#[derive(Deserialize)]
pub(super) struct ListPostsQuery {
    blog_id: Option<String>,
}

#[derive(Deserialize)]
struct CreatePostRequest {
    blog_id: String,
    title: String,
    #[serde(default)]
    content: String,
}

#[derive(Serialize)]
struct PostResponse {
    id: String,
    blog_id: String,
    title: String,
    content: String,
    created_at: String,
    updated_at: String,
}

impl From<Post> for PostResponse {
    fn from(post: Post) -> Self {
        Self {
            id: post.uuid,
            blog_id: post.blog_uuid,
            title: post.title,
            content: post.content,
            created_at: post.created_at,
            updated_at: post.updated_at,
        }
    }
}

#[derive(Serialize)]
struct PostSummaryResponse {
    id: String,
    title: String,
    created_at: String,
    updated_at: String,
}

impl From<PostSummary> for PostSummaryResponse {
    fn from(post: PostSummary) -> Self {
        Self {
            id: post.uuid,
            title: post.title,
            created_at: post.created_at,
            updated_at: post.updated_at,
        }
    }
}

#[derive(Serialize)]
struct PostsList {
    posts: Vec<PostSummaryResponse>,
}

// --- Helpers ---

/// Fetch a blog the caller owns, or fail with 400/404/403.
async fn owned_blog(db: &Database, auth: &AuthenticatedUser, blog_id: &str) -> Result<Blog, ApiError> {
    validate_uuid(blog_id)?;

    let blog = db
        .blogs()
        .get_by_uuid(blog_id)
        .await
        .db_err("Failed to get blog")?
        .ok_or_else(|| ApiError::not_found("Blog not found"))?;

    authorize(auth, &blog).require()?;
    Ok(blog)
}

// --- Handlers ---

pub(super) async fn list_posts(
    State(state): State<PostsState>,
    ApiAuth(auth): ApiAuth,
    Query(query): Query<ListPostsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let blog_id = query
        .blog_id
        .ok_or_else(|| ApiError::bad_request("blog_id query parameter is required"))?;
    let blog = owned_blog(&state.db, &auth, &blog_id).await?;

    let posts = state
        .db
        .posts()
        .list_by_blog(blog.id)
        .await
        .db_err("Failed to list posts")?;

    Ok(Json(PostsList {
        posts: posts.into_iter().map(PostSummaryResponse::from).collect(),
    }))
}

async fn create_post(
    State(state): State<PostsState>,
    ApiAuth(auth): ApiAuth,
    Json(payload): Json<CreatePostRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let title = validate_title(&payload.title, MAX_TITLE_LENGTH)?;
    let blog = owned_blog(&state.db, &auth, &payload.blog_id).await?;

    let post = state
        .db
        .posts()
        .create(blog.id, title, &payload.content)
        .await
        .db_err("Failed to create post")?;

    info!(post = %post.uuid, blog = %blog.uuid, "Post created");

    Ok(Json(PostResponse::from(post)))
}

async fn post_details(
    State(state): State<PostsState>,
    ApiAuth(auth): ApiAuth,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    validate_uuid(&id)?;

    let post = state
        .db
        .posts()
        .get_by_uuid(&id)
        .await
        .db_err("Failed to get post")?
        .ok_or_else(|| ApiError::not_found("Post not found"))?;

    authorize(&auth, &post).require()?;

    Ok(Json(PostResponse::from(post)))
}

async fn delete_post(
    State(state): State<PostsState>,
    ApiAuth(auth): ApiAuth,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let deleted = state
        .db
        .posts()
        .delete_owned(&id, auth.user_id())
        .await
        .db_err("Failed to delete post")?;

    if !deleted {
        return Err(ApiError::not_found("Post not found"));
    }

    info!(post = %id, owner = %auth.user.username, "Post deleted");

    Ok(Json(
        serde_json::json!({ "message": "Post deleted successfully" }),
    ))
}
