mod common;

use axum::{body::Body, http::StatusCode};
use common::{body_json, create_test_app, empty_request, json_request, request};
use serde_json::json;

#[tokio::test]
async fn test_list_blogs_empty() {
    let app = create_test_app().await;
    let token = app.user_with_token("alice").await;

    let response = app
        .send(empty_request("GET", "/v1/api/blog", Some(&token)))
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["blogs"], json!([]));
}

#[tokio::test]
async fn test_list_blogs_trailing_slash() {
    let app = create_test_app().await;
    let token = app.user_with_token("alice").await;
    app.create_blog(&token, "Travel").await;

    let response = app
        .send(empty_request("GET", "/v1/api/blog/", Some(&token)))
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["blogs"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_list_blogs_requires_auth() {
    let app = create_test_app().await;

    let response = app.send(empty_request("GET", "/v1/api/blog", None)).await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let json = body_json(response).await;
    assert!(json["error"].as_str().is_some());
}

#[tokio::test]
async fn test_list_blogs_only_returns_own() {
    let app = create_test_app().await;
    let alice = app.user_with_token("alice").await;
    let bob = app.user_with_token("bob").await;

    app.create_blog(&alice, "First").await;
    app.create_blog(&alice, "Second").await;
    app.create_blog(&bob, "Bob's blog").await;

    let response = app
        .send(empty_request("GET", "/v1/api/blog", Some(&alice)))
        .await;
    let json = body_json(response).await;
    let blogs = json["blogs"].as_array().unwrap();

    assert_eq!(blogs.len(), 2);
    assert_eq!(blogs[0]["title"], "First");
    assert_eq!(blogs[1]["title"], "Second");
    assert!(blogs.iter().all(|b| b["owner"] == "alice"));
}

#[tokio::test]
async fn test_create_blog() {
    let app = create_test_app().await;
    let token = app.user_with_token("alice").await;

    let response = app
        .send(json_request(
            "POST",
            "/v1/api/blog/create/",
            Some(&token),
            &json!({ "title": "  Cooking  ", "description": "Recipes" }),
        ))
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["title"], "Cooking");
    assert_eq!(json["description"], "Recipes");
    assert_eq!(json["owner"], "alice");
    assert!(uuid::Uuid::parse_str(json["id"].as_str().unwrap()).is_ok());
}

#[tokio::test]
async fn test_create_blog_without_trailing_slash() {
    let app = create_test_app().await;
    let token = app.user_with_token("alice").await;

    let response = app
        .send(json_request(
            "POST",
            "/v1/api/blog/create",
            Some(&token),
            &json!({ "title": "Cooking" }),
        ))
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert!(json["description"].is_null());
}

#[tokio::test]
async fn test_create_blog_duplicate_title() {
    let app = create_test_app().await;
    let token = app.user_with_token("alice").await;
    app.create_blog(&token, "Cooking").await;

    let response = app
        .send(json_request(
            "POST",
            "/v1/api/blog/create/",
            Some(&token),
            &json!({ "title": "Cooking" }),
        ))
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["error"], "Blog title already exists for the user");
}

#[tokio::test]
async fn test_same_title_allowed_for_different_users() {
    let app = create_test_app().await;
    let alice = app.user_with_token("alice").await;
    let bob = app.user_with_token("bob").await;

    app.create_blog(&alice, "Cooking").await;
    app.create_blog(&bob, "Cooking").await;
}

#[tokio::test]
async fn test_create_blog_empty_title() {
    let app = create_test_app().await;
    let token = app.user_with_token("alice").await;

    let response = app
        .send(json_request(
            "POST",
            "/v1/api/blog/create/",
            Some(&token),
            &json!({ "title": "   " }),
        ))
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_create_blog_requires_auth() {
    let app = create_test_app().await;

    let response = app
        .send(json_request(
            "POST",
            "/v1/api/blog/create/",
            None,
            &json!({ "title": "Cooking" }),
        ))
        .await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_blog_details_with_post_titles() {
    let app = create_test_app().await;
    let token = app.user_with_token("alice").await;
    let blog_id = app.create_blog(&token, "Cooking").await;
    app.create_post(&token, &blog_id, "Bread").await;
    app.create_post(&token, &blog_id, "Soup").await;

    let response = app
        .send(empty_request(
            "POST",
            &format!("/v1/api/blog/{}", blog_id),
            Some(&token),
        ))
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["blog"]["id"], blog_id);
    assert_eq!(json["blog"]["title"], "Cooking");
    assert_eq!(json["post_titles"], json!(["Bread", "Soup"]));
}

#[tokio::test]
async fn test_blog_details_other_user_forbidden() {
    let app = create_test_app().await;
    let alice = app.user_with_token("alice").await;
    let bob = app.user_with_token("bob").await;
    let blog_id = app.create_blog(&alice, "Private").await;

    let response = app
        .send(empty_request(
            "POST",
            &format!("/v1/api/blog/{}", blog_id),
            Some(&bob),
        ))
        .await;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_blog_details_invalid_id() {
    let app = create_test_app().await;
    let token = app.user_with_token("alice").await;

    let response = app
        .send(empty_request("POST", "/v1/api/blog/not-a-uuid", Some(&token)))
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_blog_details_not_found() {
    let app = create_test_app().await;
    let token = app.user_with_token("alice").await;

    let response = app
        .send(empty_request(
            "POST",
            &format!("/v1/api/blog/{}", uuid::Uuid::new_v4()),
            Some(&token),
        ))
        .await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_blog() {
    let app = create_test_app().await;
    let token = app.user_with_token("alice").await;
    let blog_id = app.create_blog(&token, "Cooking").await;

    let response = app
        .send(empty_request(
            "DELETE",
            &format!("/v1/api/blog/delete/{}", blog_id),
            Some(&token),
        ))
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["message"], "Blog deleted successfully");

    let response = app
        .send(empty_request("GET", "/v1/api/blog", Some(&token)))
        .await;
    let json = body_json(response).await;
    assert_eq!(json["blogs"], json!([]));
}

#[tokio::test]
async fn test_delete_blog_of_other_user_not_found() {
    let app = create_test_app().await;
    let alice = app.user_with_token("alice").await;
    let bob = app.user_with_token("bob").await;
    let blog_id = app.create_blog(&alice, "Cooking").await;

    let response = app
        .send(empty_request(
            "DELETE",
            &format!("/v1/api/blog/delete/{}", blog_id),
            Some(&bob),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    // Still there for the owner
    let response = app
        .send(empty_request(
            "POST",
            &format!("/v1/api/blog/{}", blog_id),
            Some(&alice),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_delete_blog_twice() {
    let app = create_test_app().await;
    let token = app.user_with_token("alice").await;
    let blog_id = app.create_blog(&token, "Cooking").await;
    let uri = format!("/v1/api/blog/delete/{}", blog_id);

    let response = app.send(empty_request("DELETE", &uri, Some(&token))).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = app.send(empty_request("DELETE", &uri, Some(&token))).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_token_in_query_parameter() {
    let app = create_test_app().await;
    let token = app.user_with_token("alice").await;

    let response = app
        .send(empty_request(
            "GET",
            &format!("/v1/api/blog?token={}", token),
            None,
        ))
        .await;

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_token_in_cookie() {
    let app = create_test_app().await;
    let token = app.user_with_token("alice").await;

    let response = app
        .send(
            request()
                .method("GET")
                .uri("/v1/api/blog")
                .header("cookie", format!("access_token={}", token))
                .body(Body::empty())
                .unwrap(),
        )
        .await;

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_token_for_deleted_user_rejected() {
    let app = create_test_app().await;
    // Valid signature, but no such account
    let token = app.jwt.issue_pair("ghost").unwrap().access_token;

    let response = app
        .send(empty_request("GET", "/v1/api/blog", Some(&token)))
        .await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_blog_details_requires_auth() {
    let app = create_test_app().await;
    let token = app.user_with_token("alice").await;
    let blog_id = app.create_blog(&token, "Cooking").await;

    let response = app
        .send(empty_request(
            "POST",
            &format!("/v1/api/blog/{}", blog_id),
            None,
        ))
        .await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_delete_blog_requires_auth() {
    let app = create_test_app().await;
    let token = app.user_with_token("alice").await;
    let blog_id = app.create_blog(&token, "Cooking").await;

    let response = app
        .send(empty_request(
            "DELETE",
            &format!("/v1/api/blog/delete/{}", blog_id),
            None,
        ))
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // Untouched
    let response = app
        .send(empty_request(
            "POST",
            &format!("/v1/api/blog/{}", blog_id),
            Some(&token),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_logged_out_token_rejected_on_every_blog_endpoint() {
    let app = create_test_app().await;
    let token = app.user_with_token("alice").await;
    let blog_id = app.create_blog(&token, "Cooking").await;
    app.logout(&token).await;

    let requests = [
        empty_request("GET", "/v1/api/blog", Some(&token)),
        empty_request("POST", &format!("/v1/api/blog/{}", blog_id), Some(&token)),
        json_request(
            "POST",
            "/v1/api/blog/create/",
            Some(&token),
            &json!({ "title": "Another" }),
        ),
        empty_request(
            "DELETE",
            &format!("/v1/api/blog/delete/{}", blog_id),
            Some(&token),
        ),
    ];

    for request in requests {
        let response = app.send(request).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let json = body_json(response).await;
        assert_eq!(json["error"], "Token has been revoked");
    }

    assert!(app.db.blogs().get_by_uuid(&blog_id).await.unwrap().is_some());
}
