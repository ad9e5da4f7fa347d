#![allow(dead_code)]

use axum::{
    Router,
    body::Body,
    extract::ConnectInfo,
    http::{Request, Response, StatusCode, request::Builder},
};
use quillpost::jwt::JwtConfig;
use quillpost::rate_limit::RateLimitConfig;
use quillpost::{ServerConfig, create_app, db::Database};
use serde_json::Value;
use std::net::SocketAddr;
use std::sync::Arc;
use tower::ServiceExt;

pub const JWT_SECRET: &[u8] = b"test-jwt-secret-that-is-long-enough";

/// Peer address attached to every test request, as `into_make_service_with_connect_info` would.
pub const TEST_PEER: &str = "192.0.2.10:50000";

pub struct TestApp {
    pub router: Router,
    pub db: Database,
    pub jwt: JwtConfig,
}

impl TestApp {
    /// Send a request through a fresh clone of the router.
    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.router.clone().oneshot(request).await.unwrap()
    }

    /// Insert a user directly and mint an access token for them.
    /// The stored hash is not a valid password hash, so these users cannot log in.
    pub async fn user_with_token(&self, username: &str) -> String {
        let uuid = uuid::Uuid::new_v4().to_string();
        self.db
            .users()
            .create(&uuid, username, "not-a-real-hash")
            .await
            .expect("Failed to create user");
        self.jwt.issue_pair(username).unwrap().access_token
    }

    /// Log out with the given access token, revoking its pair.
    pub async fn logout(&self, token: &str) {
        let response = self
            .send(empty_request("POST", "/v1/api/auth/logout", Some(token)))
            .await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    /// Create a blog as the given caller and return its id.
    pub async fn create_blog(&self, token: &str, title: &str) -> String {
        let response = self
            .send(json_request(
                "POST",
                "/v1/api/blog/create/",
                Some(token),
                &serde_json::json!({ "title": title, "description": "about things" }),
            ))
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        body_json(response).await["id"].as_str().unwrap().to_string()
    }

    /// Create a post in a blog as the given caller and return its id.
    pub async fn create_post(&self, token: &str, blog_id: &str, title: &str) -> String {
        let response = self
            .send(json_request(
                "POST",
                "/v1/api/post/create/",
                Some(token),
                &serde_json::json!({ "blog_id": blog_id, "title": title, "content": "body text" }),
            ))
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        body_json(response).await["id"].as_str().unwrap().to_string()
    }
}

pub async fn create_test_app() -> TestApp {
    create_test_app_with(false, RateLimitConfig::new(1000, 1000)).await
}

pub async fn create_test_app_with(no_signup: bool, rate_limit: RateLimitConfig) -> TestApp {
    let db = Database::open(":memory:")
        .await
        .expect("Failed to open test database");
    let config = ServerConfig {
        db: db.clone(),
        jwt_secret: JWT_SECRET.to_vec(),
        access_token_secs: 1800,
        refresh_token_secs: 3600,
        secure_cookies: false,
        no_signup,
        rate_limit: Arc::new(rate_limit),
    };
    TestApp {
        router: create_app(&config),
        db,
        jwt: JwtConfig::new(JWT_SECRET).with_durations(1800, 3600),
    }
}

/// Start a request coming from the given peer address.
pub fn request_from(peer: &str) -> Builder {
    let addr: SocketAddr = peer.parse().unwrap();
    Request::builder().extension(ConnectInfo(addr))
}

/// Start a request coming from the default test peer.
pub fn request() -> Builder {
    request_from(TEST_PEER)
}

/// Build a request with an optional bearer token and a JSON body.
pub fn json_request(method: &str, uri: &str, token: Option<&str>, body: &Value) -> Request<Body> {
    let mut builder = request()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {}", token));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

/// Build a request with an optional bearer token and no body.
pub fn empty_request(method: &str, uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = request().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {}", token));
    }
    builder.body(Body::empty()).unwrap()
}

pub async fn body_json(response: Response<Body>) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}
