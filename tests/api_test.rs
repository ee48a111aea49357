//! Integration tests for API endpoints.
//!
//! Requests go through the full router (middleware, extractors, handlers)
//! against a seeded in-memory database.

mod common;

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use sea_orm::{ConnectionTrait, DbBackend, Statement};
use serde_json::{json, Value};
use tower::ServiceExt;

use church_admin::api::{create_router, AppState};
use church_admin::domain::{Principal, RoleCode};
use church_admin::infra::Database;
use church_admin::services::{ServiceContainer, TransferModel};

use common::{client, seeded_app, TestApp, SUPER_ADMIN_PASSWORD};

fn router(app: &TestApp) -> Router {
    let state = AppState::new(
        Arc::new(app.services.clone()),
        Arc::new(Database::from_connection(app.db.clone())),
    );
    create_router(state)
}

async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Vec<u8>) {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, body.to_vec())
}

async fn send_json(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let (status, body) = send(router, request).await;
    let value = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body).unwrap()
    };
    (status, value)
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get_with_token(uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap()
}

async fn super_admin_token(router: &Router) -> String {
    let (status, body) = send_json(
        router,
        post_json(
            "/auth/super-admin/login",
            json!({
                "email": "superadmin@kasiglahan.jcsgo.com",
                "password": SUPER_ADMIN_PASSWORD,
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    body["access_token"].as_str().unwrap().to_string()
}

// =============================================================================
// Public endpoints
// =============================================================================

#[tokio::test]
async fn test_health_reports_database() {
    let app = seeded_app().await;
    let router = router(&app);

    let (status, body) = send_json(
        &router,
        Request::builder().uri("/health").body(Body::empty()).unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["database"]["status"], "healthy");
}

#[tokio::test]
async fn test_church_directory_is_grouped_by_region() {
    let app = seeded_app().await;
    let router = router(&app);

    let (status, body) = send_json(
        &router,
        Request::builder().uri("/churches").body(Body::empty()).unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let regions = body.as_array().unwrap();
    assert_eq!(regions.len(), 2);
    let total: usize = regions
        .iter()
        .map(|r| r["churches"].as_array().unwrap().len())
        .sum();
    assert_eq!(total, 6);
}

#[tokio::test]
async fn test_detect_church_from_email() {
    let app = seeded_app().await;
    let router = router(&app);

    let (status, body) = send_json(
        &router,
        post_json("/churches/detect", json!({ "email": "ana@tabak.jcsgo.com" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["domain"], "tabak");

    let (status, body) = send_json(
        &router,
        post_json("/churches/detect", json!({ "email": "ana@gmail.com" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_register_by_host_then_login() {
    let app = seeded_app().await;
    let router = router(&app);

    let mut request = post_json(
        "/auth/register",
        json!({
            "email_prefix": "lorna",
            "password": "securepassword123",
            "password_confirm": "securepassword123",
            "first_name": "Lorna",
            "last_name": "Reyes",
        }),
    );
    request
        .headers_mut()
        .insert(header::HOST, "sanjose.jcsgo.com".parse().unwrap());
    let (status, body) = send_json(&router, request).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["email"], "lorna@sanjose.jcsgo.com");
    assert_eq!(body["role"], "NEW_FRIEND");

    let (status, body) = send_json(
        &router,
        post_json(
            "/churches/sanjose/login",
            json!({ "email": "lorna", "password": "securepassword123" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["token_type"], "Bearer");
}

#[tokio::test]
async fn test_register_without_church_host_is_rejected() {
    let app = seeded_app().await;
    let router = router(&app);

    let mut request = post_json(
        "/auth/register",
        json!({
            "email_prefix": "nobody",
            "password": "securepassword123",
            "password_confirm": "securepassword123",
            "first_name": "No",
            "last_name": "Body",
        }),
    );
    request
        .headers_mut()
        .insert(header::HOST, "localhost:3000".parse().unwrap());
    let (status, _) = send_json(&router, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

// =============================================================================
// Protected endpoints
// =============================================================================

#[tokio::test]
async fn test_protected_routes_require_token() {
    let app = seeded_app().await;
    let router = router(&app);

    let (status, body) = send_json(
        &router,
        Request::builder().uri("/members").body(Body::empty()).unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "UNAUTHORIZED");

    let (status, _) = send_json(&router, get_with_token("/dashboard", "garbage")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_token_follows_current_role_and_status() {
    let app = seeded_app().await;
    let router = router(&app);
    app.import_csv(
        Principal::system(),
        TransferModel::User,
        "email,first_name,last_name,role,password\nmila@tabak.jcsgo.com,Mila,Cruz,CM,securepassword123\n",
    )
    .await;

    let (status, body) = send_json(
        &router,
        post_json(
            "/churches/tabak/login",
            json!({ "email": "mila", "password": "securepassword123" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let token = body["access_token"].as_str().unwrap().to_string();

    let (status, _) = send_json(&router, get_with_token("/members", &token)).await;
    assert_eq!(status, StatusCode::OK);

    // Demoted after login: the same token no longer lists members
    let mila = app.user("mila@tabak.jcsgo.com").await;
    app.services
        .members()
        .change_role(app.admin("tabak").await, mila.id, RoleCode::NewFriend, client())
        .await
        .unwrap();
    let (status, _) = send_json(&router, get_with_token("/members", &token)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    app.db
        .execute(Statement::from_string(
            DbBackend::Sqlite,
            "UPDATE users SET is_active = 0 WHERE email = 'mila@tabak.jcsgo.com'".to_string(),
        ))
        .await
        .unwrap();
    let (status, body) = send_json(&router, get_with_token("/dashboard", &token)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn test_super_admin_dashboard_and_overview() {
    let app = seeded_app().await;
    let router = router(&app);
    let token = super_admin_token(&router).await;

    let (status, body) = send_json(&router, get_with_token("/dashboard/tabak", &token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["church"]["domain"], "tabak");
    assert_eq!(body["total_members"], 0);

    let (status, body) = send_json(&router, get_with_token("/dashboard/overview", &token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 6);
}

#[tokio::test]
async fn test_export_downloads_attachment() {
    let app = seeded_app().await;
    let router = router(&app);
    let token = super_admin_token(&router).await;

    let response = router
        .clone()
        .oneshot(get_with_token("/export/church?format=csv", &token))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let disposition = response
        .headers()
        .get(header::CONTENT_DISPOSITION)
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(disposition.starts_with("attachment; filename=\"church_"));

    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let text = String::from_utf8(body.to_vec()).unwrap();
    // Header plus six churches
    assert_eq!(text.lines().count(), 7);
}

#[tokio::test]
async fn test_import_reports_rows() {
    let app = seeded_app().await;
    let router = router(&app);
    let token = super_admin_token(&router).await;

    let csv = "email,first_name,last_name,role\n\
               tess@tabak.jcsgo.com,Tess,Cruz,CM\n\
               not-an-email,Bad,Row,CM\n";
    let request = Request::builder()
        .method(Method::POST)
        .uri("/import/user?format=csv")
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .header(header::CONTENT_TYPE, "text/csv")
        .body(Body::from(csv))
        .unwrap();

    let (status, body) = send_json(&router, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["created"], 1);
    assert_eq!(body["errors"][0]["line"], 3);

    let (status, body) = send_json(
        &router,
        get_with_token("/members?search=tess", &token),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["meta"]["total"], 1);
}

#[tokio::test]
async fn test_unknown_export_model_is_bad_request() {
    let app = seeded_app().await;
    let router = router(&app);
    let token = super_admin_token(&router).await;

    let (status, body) = send_json(&router, get_with_token("/export/pastors", &token)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
}
