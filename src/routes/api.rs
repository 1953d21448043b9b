// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! API routes for authenticated users: profile and facility browsing.

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::{BookingType, Class, Court, Equipment, Profile, ResourceType};
use crate::services::availability::{generate_slots, CourtOccupancy, TimeSlot};
use crate::time_utils::now;
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    routing::get,
    Extension, Json, Router,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use validator::Validate;

/// API routes (require authentication via JWT).
/// The auth middleware is applied in routes/mod.rs for these routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/me", get(get_me).put(update_me))
        .route("/api/courts", get(list_courts))
        .route("/api/courts/{id}", get(get_court))
        .route("/api/courts/{id}/availability", get(court_availability))
        .route("/api/equipment", get(list_equipment))
}

// ─── User Profile ────────────────────────────────────────────

/// Current user response.
#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct MeResponse {
    #[serde(flatten)]
    pub profile: Profile,
    pub class: Option<Class>,
}

async fn get_me(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<MeResponse>> {
    let (profile, class) = state.accounts.profile(&user.user_id).await?;
    Ok(Json(MeResponse { profile, class }))
}

#[derive(Debug, Deserialize, Validate)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct UpdateProfileRequest {
    #[validate(length(min = 2, max = 100))]
    pub full_name: Option<String>,
    #[validate(length(max = 20))]
    pub phone: Option<String>,
}

async fn update_me(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(req): Json<UpdateProfileRequest>,
) -> Result<Json<Profile>> {
    req.validate()?;
    let profile = state
        .accounts
        .update_profile(&user.user_id, req.full_name, req.phone)
        .await?;
    Ok(Json(profile))
}

// ─── Courts ──────────────────────────────────────────────────

async fn list_courts(State(state): State<Arc<AppState>>) -> Result<Json<Vec<Court>>> {
    Ok(Json(state.db.list_courts().await?))
}

async fn get_court(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Court>> {
    let court = state
        .db
        .get_court(&id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("court {}", id)))?;
    Ok(Json(court))
}

#[derive(Deserialize)]
struct AvailabilityQuery {
    /// YYYY-MM-DD
    date: String,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct AvailabilityResponse {
    pub court_id: String,
    pub date: String,
    pub slots: Vec<TimeSlot>,
}

fn parse_date(raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|_| AppError::BadRequest(format!("invalid date {:?}, expected YYYY-MM-DD", raw)))
}

/// Slot grid for one court on one day.
async fn court_availability(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(params): Query<AvailabilityQuery>,
) -> Result<Json<AvailabilityResponse>> {
    let date = parse_date(&params.date)?;

    let court = state
        .db
        .get_court(&id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("court {}", id)))?;

    let (open, close) = state.config.schedule.day_bounds(date);
    let bookings = state
        .db
        .list_bookings_for_resource(ResourceType::Court, &court.id, open, close)
        .await?;
    let blocks = state.db.list_time_blocks_overlapping(open, close).await?;

    let class_ids: HashSet<&str> = bookings
        .iter()
        .filter(|b| b.booking_type == BookingType::Class)
        .filter_map(|b| b.class_id.as_deref())
        .collect();
    let mut class_names = HashMap::new();
    for class_id in class_ids {
        if let Some(class) = state.db.get_class(class_id).await? {
            class_names.insert(class.id, class.name);
        }
    }

    let occupancy = CourtOccupancy {
        court_id: &court.id,
        bookings: &bookings,
        blocks: &blocks,
        class_names: &class_names,
    };
    let slots = generate_slots(date, &state.config.schedule, &occupancy, now());

    tracing::debug!(
        court_id = %court.id,
        date = %date,
        bookings = bookings.len(),
        blocks = blocks.len(),
        "Computed court availability"
    );

    Ok(Json(AvailabilityResponse {
        court_id: court.id,
        date: date.format("%Y-%m-%d").to_string(),
        slots,
    }))
}

// ─── Equipment ───────────────────────────────────────────────

async fn list_equipment(State(state): State<Arc<AppState>>) -> Result<Json<Vec<Equipment>>> {
    Ok(Json(state.db.list_equipment().await?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_date() {
        assert_eq!(
            parse_date("2026-01-15").unwrap(),
            NaiveDate::from_ymd_opt(2026, 1, 15).unwrap()
        );
        assert!(matches!(parse_date("15/01/2026"), Err(AppError::BadRequest(_))));
        assert!(parse_date("2026-02-30").is_err());
    }
}
