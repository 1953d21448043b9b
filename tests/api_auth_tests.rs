// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! API authentication, role gating and CORS tests.
//!
//! These tests verify that:
//! 1. Protected routes reject requests without valid tokens
//! 2. Staff and admin routes check the role carried in the token
//! 3. CORS preflight requests return correct headers

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    response::Response,
};
use squadsync::models::{AccountStatus, Role};
use tower::ServiceExt;

mod common;

async fn get(app: axum::Router, uri: &str, token: Option<&str>) -> Response {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    app.oneshot(builder.body(Body::empty()).unwrap())
        .await
        .unwrap()
}

async fn json_body(response: Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_health_is_public() {
    let (app, _) = common::create_test_app();
    let response = get(app, "/health", None).await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_protected_route_without_token() {
    let (app, _) = common::create_test_app();
    let response = get(app, "/api/me", None).await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = json_body(response).await;
    assert_eq!(body["error"], "unauthorized");
}

#[tokio::test]
async fn test_protected_route_with_invalid_token() {
    let (app, _) = common::create_test_app();
    let response = get(app, "/api/bookings", Some("invalid.token.here")).await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = json_body(response).await;
    assert_eq!(body["error"], "invalid_token");
}

#[tokio::test]
async fn test_token_signed_with_other_key_rejected() {
    let (app, _) = common::create_test_app();
    let token = common::create_test_jwt("u1", Role::Admin, b"some-other-key-some-other-key!!");
    let response = get(app, "/api/admin/dashboard", Some(&token)).await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_protected_route_with_valid_token() {
    let (app, state) = common::create_test_app();
    let token = common::sign_in(&state, "u1", Role::Student);
    let response = get(app, "/api/courts", Some(&token)).await;

    // Auth passes; the offline database then fails the request.
    assert_ne!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = json_body(response).await;
    assert_eq!(body["error"], "database_error");
    assert!(body.get("details").is_none());
}

#[tokio::test]
async fn test_session_cookie_accepted() {
    let (app, state) = common::create_test_app();
    let token = common::sign_in(&state, "u1", Role::Student);

    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/api/notifications")
                .header(header::COOKIE, format!("squadsync_token={}", token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_ne!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_student_cannot_reach_staff_routes() {
    let (app, state) = common::create_test_app();
    let token = common::sign_in(&state, "u1", Role::Student);
    let response = get(app, "/api/admin/dashboard", Some(&token)).await;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let body = json_body(response).await;
    assert_eq!(body["error"], "forbidden");
}

#[tokio::test]
async fn test_faculty_reaches_staff_but_not_admin_routes() {
    let (app, state) = common::create_test_app();
    let token = common::sign_in(&state, "f1", Role::Faculty);

    let staff = get(app.clone(), "/api/admin/bookings", Some(&token)).await;
    assert_ne!(staff.status(), StatusCode::UNAUTHORIZED);
    assert_ne!(staff.status(), StatusCode::FORBIDDEN);

    let admin = get(app, "/api/admin/users", Some(&token)).await;
    assert_eq!(admin.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_admin_reaches_admin_routes() {
    let (app, state) = common::create_test_app();
    let token = common::sign_in(&state, "a1", Role::Admin);

    for uri in ["/api/admin/users", "/api/admin/inventory", "/api/admin/dashboard"] {
        let response = get(app.clone(), uri, Some(&token)).await;
        assert_ne!(response.status(), StatusCode::FORBIDDEN, "{uri}");
        assert_ne!(response.status(), StatusCode::UNAUTHORIZED, "{uri}");
    }
}

#[tokio::test]
async fn test_stored_role_overrides_token_role() {
    let (app, state) = common::create_test_app();
    // Issued while the account was an admin, then demoted.
    let token = common::create_test_jwt("a1", Role::Admin, &state.config.jwt_signing_key);
    common::remember_account(&state, "a1", Role::Student, AccountStatus::Active);

    let admin = get(app.clone(), "/api/admin/users", Some(&token)).await;
    assert_eq!(admin.status(), StatusCode::FORBIDDEN);

    let staff = get(app, "/api/admin/dashboard", Some(&token)).await;
    assert_eq!(staff.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_suspended_account_rejected() {
    let (app, state) = common::create_test_app();
    let token = common::create_test_jwt("u1", Role::Admin, &state.config.jwt_signing_key);
    common::remember_account(&state, "u1", Role::Admin, AccountStatus::Suspended);

    let response = get(app, "/api/me", Some(&token)).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let body = json_body(response).await;
    assert_eq!(body["error"], "forbidden");
    assert_eq!(body["details"], "account is suspended");
}

#[tokio::test]
async fn test_unknown_session_looks_up_profile() {
    let (app, state) = common::create_test_app();
    // Nothing cached: the profile is read from the (offline) database.
    let token = common::create_test_jwt("u1", Role::Student, &state.config.jwt_signing_key);

    let response = get(app, "/api/courts", Some(&token)).await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn test_cors_preflight_from_localhost() {
    let (app, _) = common::create_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .method("OPTIONS")
                .uri("/api/bookings")
                .header(header::ORIGIN, "http://localhost:5173")
                .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .unwrap(),
        "http://localhost:5173"
    );
    assert_eq!(
        response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_CREDENTIALS)
            .unwrap(),
        "true"
    );
}

#[tokio::test]
async fn test_cors_rejects_unknown_origin() {
    let (app, _) = common::create_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .method("OPTIONS")
                .uri("/api/bookings")
                .header(header::ORIGIN, "https://evil.example.com")
                .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert!(response
        .headers()
        .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
        .is_none());
}
