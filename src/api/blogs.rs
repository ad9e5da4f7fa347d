//! Blog API.
//!
//! All endpoints require an access token. Blogs are only visible to their owner.

use axum::{
    Json, Router,
    extract::{Path, State},
    response::IntoResponse,
    routing::{delete, get, post},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

use super::error::{ApiError, ResultExt, validate_title, validate_uuid};
use crate::auth::ApiAuth;
use crate::db::{Blog, Database, is_unique_violation};
use crate::impl_has_auth_backend;
use crate::jwt::JwtConfig;
use crate::policy::authorize;

const MAX_TITLE_LENGTH: usize = 200;
const MAX_DESCRIPTION_LENGTH: usize = 2000;

/// State for blog endpoints.
#[derive(Clone)]
pub struct BlogsState {
    pub db: Database,
    pub jwt: Arc<JwtConfig>,
}

impl_has_auth_backend!(BlogsState);

pub fn router(state: BlogsState) -> Router {
    Router::new()
        .route("/", get(list_blogs))
        .route("/create", post(create_blog))
        .route("/create/", post(create_blog))
        .route("/delete/{id}", delete(delete_blog))
        .route("/{id}", post(blog_details))
        .with_state(state)
}

// --- Request/Response types ---

#[derive(Deserialize)]
struct CreateBlogRequest {
    title: String,
    description: Option<String>,
}

#[derive(Serialize)]
struct BlogResponse {
    id: String,
    title: String,
    description: Option<String>,
    owner: String,
    created_at: String,
}

impl From<Blog> for BlogResponse {
    fn from(blog: Blog) -> Self {
        Self {
            id: blog.uuid,
            title: blog.title,
            description: blog.description,
            owner: blog.owner,
            created_at: blog.created_at,
        }
    }
}

#[derive(Serialize)]
struct BlogsList {
    blogs: Vec<BlogResponse>,
}

#[derive(Serialize)]
struct BlogDetails {
    blog: BlogResponse,
    post_titles: Vec<String>,
}

// --- Handlers ---

pub(super) async fn list_blogs(
    State(state): State<BlogsState>,
    ApiAuth(auth): ApiAuth,
) -> Result<impl IntoResponse, ApiError> {
    let blogs = state
        .db
        .blogs()
        .list_by_owner(auth.user_id())
        .await
        .db_err("Failed to list blogs")?;

    Ok(Json(BlogsList {
        blogs: blogs.into_iter().map(BlogResponse::from).collect(),
    }))
}

async fn blog_details(
    State(state): State<BlogsState>,
    ApiAuth(auth): ApiAuth,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    validate_uuid(&id)?;

    let blog = state
        .db
        .blogs()
        .get_by_uuid(&id)
        .await
        .db_err("Failed to get blog")?
        .ok_or_else(|| ApiError::not_found("Blog not found"))?;

    authorize(&auth, &blog).require()?;

    let post_titles = state
        .db
        .posts()
        .titles_by_blog(blog.id)
        .await
        .db_err("Failed to list post titles")?;

    Ok(Json(BlogDetails {
        blog: blog.into(),
        post_titles,
    }))
}

async fn create_blog(
    State(state): State<BlogsState>,
    ApiAuth(auth): ApiAuth,
    Json(payload): Json<CreateBlogRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let title = validate_title(&payload.title, MAX_TITLE_LENGTH)?;

    let description = payload
        .description
        .as_deref()
        .map(str::trim)
        .filter(|d| !d.is_empty());
    if description.is_some_and(|d| d.chars().count() > MAX_DESCRIPTION_LENGTH) {
        return Err(ApiError::bad_request(format!(
            "Description cannot be longer than {} characters",
            MAX_DESCRIPTION_LENGTH
        )));
    }

    let duplicate = || ApiError::bad_request("Blog title already exists for the user");

    let available = state
        .db
        .blogs()
        .is_title_available(auth.user_id(), title)
        .await
        .db_err("Failed to check blog title")?;
    if !available {
        return Err(duplicate());
    }

    let blog = match state
        .db
        .blogs()
        .create(auth.user_id(), title, description)
        .await
    {
        Ok(blog) => blog,
        // Lost a race against a concurrent create with the same title
        Err(e) if is_unique_violation(&e) => return Err(duplicate()),
        Err(e) => return Err(ApiError::db_error("Failed to create blog", e)),
    };

    info!(blog = %blog.uuid, owner = %auth.user.username, "Blog created");

    Ok(Json(BlogResponse::from(blog)))
}

async fn delete_blog(
    State(state): State<BlogsState>,
    ApiAuth(auth): ApiAuth,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    // Scoped to the caller: someone else's blog looks the same as a missing one
    let deleted = state
        .db
        .blogs()
        .delete_owned(&id, auth.user_id())
        .await
        .db_err("Failed to delete blog")?;

    if !deleted {
        return Err(ApiError::not_found("Blog not found"));
    }

    info!(blog = %id, owner = %auth.user.username, "Blog deleted");

    Ok(Json(
        serde_json::json!({ "message": "Blog deleted successfully" }),
    ))
}
