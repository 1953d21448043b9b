// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Registration, login and logout routes.

use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use validator::Validate;

use crate::config::Config;
use crate::error::{AppError, Result};
use crate::middleware::auth::{create_jwt, SESSION_COOKIE, SESSION_TTL_SECS};
use crate::models::{Class, Profile};
use crate::services::accounts::ClassRegistration;
use crate::AppState;

/// Non-HttpOnly hint so the frontend knows a session exists.
pub const LOGGED_IN_COOKIE: &str = "squadsync_logged_in";

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/register-class", post(register_class))
        .route("/auth/login", post(class_login))
        .route("/auth/admin/login", post(staff_login))
        .route("/auth/logout", post(logout))
}

fn secure_cookies(config: &Config) -> bool {
    config.frontend_url.starts_with("https://")
}

fn session_cookie(value: String, config: &Config) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, value))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure_cookies(config))
        .max_age(time::Duration::seconds(SESSION_TTL_SECS as i64))
        .build()
}

fn hint_cookie(config: &Config) -> Cookie<'static> {
    Cookie::build((LOGGED_IN_COOKIE, "1"))
        .path("/")
        .same_site(SameSite::Lax)
        .secure(secure_cookies(config))
        .max_age(time::Duration::seconds(SESSION_TTL_SECS as i64))
        .build()
}

/// Issue the session JWT and attach both cookies.
fn start_session(jar: CookieJar, state: &AppState, profile: &Profile) -> Result<(CookieJar, String)> {
    let token = create_jwt(&profile.user_id, profile.role, &state.config.jwt_signing_key)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("JWT creation failed: {}", e)))?;
    let jar = jar
        .add(session_cookie(token.clone(), &state.config))
        .add(hint_cookie(&state.config));
    Ok((jar, token))
}

// ─── Registration ────────────────────────────────────────────

#[derive(Debug, Deserialize, Validate)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct RegisterClassRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 6, message = "password must be at least 6 characters"))]
    pub password: String,
    #[validate(length(min = 2))]
    pub full_name: String,
    pub phone: Option<String>,
    #[validate(length(min = 2))]
    pub class_name: String,
    #[validate(length(min = 2))]
    pub class_id: String,
    #[validate(length(min = 2))]
    pub department: String,
    #[validate(range(min = 1, max = 6))]
    pub year: u32,
    #[validate(range(min = 1))]
    pub student_count: u32,
}

#[derive(Debug, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct RegisterClassResponse {
    pub success: bool,
    pub class_code: String,
    pub class_id: String,
    pub message: String,
}

/// Register a class and its representative account.
async fn register_class(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RegisterClassRequest>,
) -> Result<(StatusCode, Json<RegisterClassResponse>)> {
    req.validate()?;

    let (_, class) = state
        .accounts
        .register_class(ClassRegistration {
            email: req.email,
            password: req.password,
            full_name: req.full_name,
            phone: req.phone,
            class_name: req.class_name,
            class_id_code: req.class_id,
            department: req.department,
            year: req.year,
            student_count: req.student_count,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(RegisterClassResponse {
            success: true,
            message: "Class registered. The class code has been sent to the representative's e-mail."
                .to_string(),
            class_code: class.class_code,
            class_id: class.id,
        }),
    ))
}

// ─── Login ───────────────────────────────────────────────────

#[derive(Debug, Deserialize, Validate)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ClassLoginRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1))]
    pub password: String,
    #[validate(length(min = 1, message = "class code is required"))]
    pub class_code: String,
}

#[derive(Debug, Deserialize, Validate)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct StaffLoginRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1))]
    pub password: String,
}

#[derive(Debug, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct LoginResponse {
    /// Also set as an HttpOnly cookie
    pub token: String,
    pub user: Profile,
    pub class: Option<Class>,
}

async fn class_login(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(req): Json<ClassLoginRequest>,
) -> Result<(CookieJar, Json<LoginResponse>)> {
    req.validate()?;

    let (profile, class) = state
        .accounts
        .class_login(&req.email, &req.password, &req.class_code)
        .await?;
    let (jar, token) = start_session(jar, &state, &profile)?;

    Ok((
        jar,
        Json(LoginResponse {
            token,
            user: profile,
            class: Some(class),
        }),
    ))
}

async fn staff_login(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(req): Json<StaffLoginRequest>,
) -> Result<(CookieJar, Json<LoginResponse>)> {
    req.validate()?;

    let profile = state.accounts.staff_login(&req.email, &req.password).await?;
    let (jar, token) = start_session(jar, &state, &profile)?;

    Ok((
        jar,
        Json(LoginResponse {
            token,
            user: profile,
            class: None,
        }),
    ))
}

/// Clear session cookies with the same attributes they were set with.
async fn logout(State(state): State<Arc<AppState>>, jar: CookieJar) -> (CookieJar, StatusCode) {
    let jar = jar
        .remove(session_cookie(String::new(), &state.config))
        .remove(hint_cookie(&state.config));
    (jar, StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_request_validation() {
        let mut req = RegisterClassRequest {
            email: "rep@college.edu".to_string(),
            password: "secret1".to_string(),
            full_name: "Asha Rao".to_string(),
            phone: None,
            class_name: "CSE 3A".to_string(),
            class_id: "4AI23CS".to_string(),
            department: "Computer Science".to_string(),
            year: 3,
            student_count: 60,
        };
        assert!(req.validate().is_ok());

        req.year = 7;
        assert!(req.validate().is_err());
        req.year = 3;

        req.password = "12345".to_string();
        assert!(req.validate().is_err());
        req.password = "secret1".to_string();

        req.student_count = 0;
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_secure_cookies_follow_frontend_scheme() {
        let mut config = Config::test_default();
        assert!(!secure_cookies(&config));
        config.frontend_url = "https://squadsync.example.edu".to_string();
        assert!(secure_cookies(&config));
        assert!(session_cookie("t".to_string(), &config).secure().unwrap_or(false));
    }
}
