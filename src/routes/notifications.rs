// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-app notification routes.

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::Notification;
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

const DEFAULT_LIMIT: u32 = 50;
const MAX_LIMIT: u32 = 100;
/// Cap on notifications scanned for the unread badge.
const UNREAD_SCAN_LIMIT: u32 = 1000;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/notifications", get(list_notifications))
        .route("/api/notifications/unread-count", get(unread_count))
        .route("/api/notifications/read-all", post(mark_all_read))
        .route("/api/notifications/{id}/read", post(mark_read))
}

#[derive(Deserialize)]
struct ListQuery {
    #[serde(default)]
    unread_only: bool,
    limit: Option<u32>,
}

async fn list_notifications(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Query(params): Query<ListQuery>,
) -> Result<Json<Vec<Notification>>> {
    let limit = params.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
    let notifications = state
        .db
        .list_notifications(&user.user_id, params.unread_only, limit)
        .await?;
    Ok(Json(notifications))
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct UnreadCountResponse {
    pub count: u32,
}

async fn unread_count(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<UnreadCountResponse>> {
    let unread = state
        .db
        .list_notifications(&user.user_id, true, UNREAD_SCAN_LIMIT)
        .await?;
    Ok(Json(UnreadCountResponse {
        count: unread.len() as u32,
    }))
}

async fn mark_read(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<Json<Notification>> {
    let mut notification = state
        .db
        .get_notification(&id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("notification {}", id)))?;
    if notification.user_id != user.user_id {
        return Err(AppError::Forbidden("not your notification".to_string()));
    }

    if !notification.is_read {
        notification.is_read = true;
        state.db.upsert_notification(&notification).await?;
    }
    Ok(Json(notification))
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct MarkAllReadResponse {
    pub updated: u32,
}

async fn mark_all_read(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<MarkAllReadResponse>> {
    let updated = state.db.mark_all_notifications_read(&user.user_id).await?;
    tracing::debug!(user_id = %user.user_id, updated, "Marked notifications read");
    Ok(Json(MarkAllReadResponse {
        updated: updated as u32,
    }))
}
