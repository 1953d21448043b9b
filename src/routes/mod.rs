// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! HTTP route handlers.

pub mod admin;
pub mod api;
pub mod auth;
pub mod bookings;
pub mod events;
pub mod manage;
pub mod notifications;

use crate::middleware::auth::{require_admin, require_auth, require_staff};
use crate::AppState;
use axum::http::{header, HeaderValue, Method};
use axum::{middleware, routing::get, Json, Router};
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct HealthResponse {
    pub status: String,
    pub build_id: String,
}

/// Health check response
async fn health_check() -> Json<HealthResponse> {
    let build_id = option_env!("BUILD_ID").unwrap_or("unknown").to_string();
    Json(HealthResponse {
        status: "ok".to_string(),
        build_id,
    })
}

/// The configured frontend, plus local dev servers.
fn origin_allowed(origin: &str, frontend_url: &str) -> bool {
    origin == frontend_url.trim_end_matches('/')
        || origin.starts_with("http://localhost")
        || origin.starts_with("http://127.0.0.1")
}

/// Build the complete router with all routes.
pub fn create_router(state: Arc<AppState>) -> Router {
    let frontend_url = state.config.frontend_url.clone();
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::predicate(
            move |origin: &HeaderValue, _parts: &axum::http::request::Parts| {
                origin
                    .to_str()
                    .is_ok_and(|origin| origin_allowed(origin, &frontend_url))
            },
        ))
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::ACCEPT]);

    let authenticated = middleware::from_fn_with_state(state.clone(), require_auth);

    // Public routes (no auth required)
    let public_routes = Router::new()
        .route("/health", get(health_check))
        .merge(auth::routes());

    // Any signed-in user
    let user_routes = Router::new()
        .merge(api::routes())
        .merge(bookings::routes())
        .merge(notifications::routes())
        .merge(events::routes())
        .route_layer(authenticated.clone());

    // Faculty and admins. The last route_layer runs first.
    let staff_routes = admin::routes()
        .route_layer(middleware::from_fn(require_staff))
        .route_layer(authenticated.clone());

    let admin_routes = manage::routes()
        .route_layer(middleware::from_fn(require_admin))
        .route_layer(authenticated);

    Router::new()
        .merge(public_routes)
        .merge(user_routes)
        .merge(staff_routes)
        .merge(admin_routes)
        .layer(middleware::from_fn(
            crate::middleware::security::add_security_headers,
        ))
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .with_state(state)
}
