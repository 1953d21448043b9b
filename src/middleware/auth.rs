// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! JWT authentication middleware.

use crate::error::AppError;
use crate::models::Role;
use crate::AppState;
use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Session cookie name.
pub const SESSION_COOKIE: &str = "squadsync_token";

/// Session lifetime in seconds (7 days).
pub const SESSION_TTL_SECS: usize = 7 * 24 * 60 * 60;

/// JWT claims structure.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,
    /// Role at sign-in; authorization uses the stored profile
    pub role: Role,
    /// Expiration time (Unix timestamp)
    pub exp: usize,
    /// Issued at (Unix timestamp)
    pub iat: usize,
}

/// Authenticated user extracted from JWT.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: String,
    pub role: Role,
}

fn bearer_token(request: &Request) -> Option<String> {
    request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::to_string)
}

/// Decode and validate a session token.
pub fn decode_jwt(token: &str, signing_key: &[u8]) -> Result<Claims, AppError> {
    let key = DecodingKey::from_secret(signing_key);
    let validation = Validation::new(Algorithm::HS256);
    decode::<Claims>(token, &key, &validation)
        .map(|data| data.claims)
        .map_err(|_| AppError::InvalidToken)
}

/// Middleware that requires valid JWT authentication.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    // Try cookie first, then header
    let token = match jar.get(SESSION_COOKIE) {
        Some(cookie) => cookie.value().to_string(),
        None => bearer_token(&request).ok_or(AppError::Unauthorized)?,
    };

    let claims = decode_jwt(&token, &state.config.jwt_signing_key)?;

    // The stored profile is authoritative; the token's role may be stale.
    let role = state.accounts.session_role(&claims.sub).await?;
    if role != claims.role {
        tracing::debug!(user_id = %claims.sub, "Session role differs from stored role");
    }

    request.extensions_mut().insert(AuthUser {
        user_id: claims.sub,
        role,
    });

    Ok(next.run(request).await)
}

/// Layered after [`require_auth`]: faculty or admin only.
pub async fn require_staff(request: Request, next: Next) -> Result<Response, AppError> {
    match request.extensions().get::<AuthUser>() {
        Some(user) if user.role.is_staff() => Ok(next.run(request).await),
        Some(_) => Err(AppError::Forbidden("staff access required".to_string())),
        None => Err(AppError::Unauthorized),
    }
}

/// Layered after [`require_auth`]: admin only.
pub async fn require_admin(request: Request, next: Next) -> Result<Response, AppError> {
    match request.extensions().get::<AuthUser>() {
        Some(user) if user.role == Role::Admin => Ok(next.run(request).await),
        Some(_) => Err(AppError::Forbidden("admin access required".to_string())),
        None => Err(AppError::Unauthorized),
    }
}

/// Create a JWT for a user session.
pub fn create_jwt(user_id: &str, role: Role, signing_key: &[u8]) -> anyhow::Result<String> {
    use jsonwebtoken::{encode, EncodingKey, Header};
    use std::time::{SystemTime, UNIX_EPOCH};

    let now = SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs() as usize;

    let claims = Claims {
        sub: user_id.to_string(),
        role,
        iat: now,
        exp: now + SESSION_TTL_SECS,
    };

    Ok(encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(signing_key),
    )?)
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: &[u8] = b"test-signing-key-32-bytes-long!!";

    #[test]
    fn test_jwt_round_trip_keeps_role() {
        let token = create_jwt("user-1", Role::Faculty, KEY).unwrap();
        let claims = decode_jwt(&token, KEY).unwrap();
        assert_eq!(claims.sub, "user-1");
        assert_eq!(claims.role, Role::Faculty);
        assert_eq!(claims.exp - claims.iat, SESSION_TTL_SECS);
    }

    #[test]
    fn test_jwt_wrong_key_rejected() {
        let token = create_jwt("user-1", Role::Admin, KEY).unwrap();
        let err = decode_jwt(&token, b"another-key-another-key-another!").unwrap_err();
        assert!(matches!(err, AppError::InvalidToken));
    }
}
