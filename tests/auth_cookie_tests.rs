// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Auth cookie attribute tests.
//!
//! These tests verify cookie removal attributes on logout match the creation
//! attributes for plain-HTTP development and HTTPS deployments.

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    response::Response,
};
use tower::ServiceExt;

mod common;

fn set_cookie_headers(response: &Response) -> Vec<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .map(|value| value.to_str().unwrap().to_string())
        .collect()
}

fn find_cookie(headers: &[String], name: &str) -> String {
    headers
        .iter()
        .find(|value| value.starts_with(&format!("{name}=")))
        .cloned()
        .unwrap_or_else(|| panic!("missing Set-Cookie header for {name}: {headers:?}"))
}

async fn logout(frontend_url: &str) -> Response {
    let (app, _) = common::create_test_app_with_frontend_url(frontend_url);

    app.oneshot(
        Request::builder()
            .method("POST")
            .uri("/auth/logout")
            .header(header::COOKIE, "squadsync_token=test; squadsync_logged_in=1")
            .body(Body::empty())
            .unwrap(),
    )
    .await
    .unwrap()
}

#[tokio::test]
async fn test_logout_cookie_removal_localhost_attributes() {
    let response = logout("http://localhost:5173").await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let set_cookies = set_cookie_headers(&response);
    let token_cookie = find_cookie(&set_cookies, "squadsync_token");
    let hint_cookie = find_cookie(&set_cookies, "squadsync_logged_in");

    assert!(token_cookie.contains("Path=/"));
    assert!(token_cookie.contains("HttpOnly"));
    assert!(token_cookie.contains("SameSite=Lax"));
    assert!(token_cookie.contains("Max-Age=0"));
    assert!(!token_cookie.contains("Secure"));
    assert!(!token_cookie.contains("Domain="));

    assert!(hint_cookie.contains("Path=/"));
    assert!(hint_cookie.contains("SameSite=Lax"));
    assert!(hint_cookie.contains("Max-Age=0"));
    assert!(!hint_cookie.contains("HttpOnly"));
    assert!(!hint_cookie.contains("Secure"));
}

#[tokio::test]
async fn test_logout_cookie_removal_https_attributes() {
    let response = logout("https://squadsync.example.edu").await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let set_cookies = set_cookie_headers(&response);
    let token_cookie = find_cookie(&set_cookies, "squadsync_token");
    let hint_cookie = find_cookie(&set_cookies, "squadsync_logged_in");

    assert!(token_cookie.contains("Path=/"));
    assert!(token_cookie.contains("HttpOnly"));
    assert!(token_cookie.contains("SameSite=Lax"));
    assert!(token_cookie.contains("Max-Age=0"));
    assert!(token_cookie.contains("Secure"));
    assert!(!token_cookie.contains("Domain="));

    assert!(hint_cookie.contains("Max-Age=0"));
    assert!(hint_cookie.contains("Secure"));
    assert!(!hint_cookie.contains("HttpOnly"));
}

#[tokio::test]
async fn test_logout_without_session_still_succeeds() {
    let (app, _) = common::create_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/auth/logout")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NO_CONTENT);
}
