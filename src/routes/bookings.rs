// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Booking routes for the signed-in user.

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::{Booking, BookingStatus, BookingType, ResourceType, UserBookingStats};
use crate::services::availability::validate_window;
use crate::services::booking::{HistoryEntry, NewCourtBooking, NewEquipmentBooking};
use crate::services::notification::resource_details;
use crate::services::pass::{self, BookingPass};
use crate::time_utils::now;
use crate::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Extension, Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use validator::Validate;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/bookings", get(list_bookings).post(create_booking))
        .route("/api/bookings/upcoming", get(upcoming))
        .route("/api/bookings/stats", get(stats))
        .route("/api/bookings/{id}/cancel", post(cancel))
        .route("/api/bookings/{id}/history", get(history))
        .route("/api/bookings/{id}/pass", get(booking_pass))
}

async fn list_bookings(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<Booking>>> {
    Ok(Json(state.bookings.list_for_user(&user.user_id).await?))
}

async fn upcoming(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<Booking>>> {
    Ok(Json(state.bookings.upcoming(&user.user_id).await?))
}

async fn stats(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<UserBookingStats>> {
    Ok(Json(state.bookings.user_stats(&user.user_id).await?))
}

// ─── Create ──────────────────────────────────────────────────

/// Booking request for either a court or equipment.
#[derive(Debug, Deserialize, Validate)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct CreateBookingRequest {
    pub resource_type: ResourceType,
    pub court_id: Option<String>,
    pub equipment_id: Option<String>,
    #[serde(default = "default_booking_type")]
    pub booking_type: BookingType,
    #[validate(range(min = 1, max = 100))]
    pub quantity: Option<u32>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    #[validate(length(max = 500))]
    pub notes: Option<String>,
}

fn default_booking_type() -> BookingType {
    BookingType::Individual
}

enum NewBooking {
    Court(NewCourtBooking),
    Equipment(NewEquipmentBooking),
}

/// Resource IDs that must be present for the requested resource type.
fn required_id(id: Option<String>, field: &str) -> Result<String> {
    id.map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| AppError::BadRequest(format!("{} is required", field)))
}

async fn create_booking(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(req): Json<CreateBookingRequest>,
) -> Result<(StatusCode, Json<Booking>)> {
    req.validate()?;
    validate_window(
        req.start_time,
        req.end_time,
        now(),
        &state.config.schedule,
        state.config.max_booking_hours,
    )
    .map_err(|e| AppError::BadRequest(e.to_string()))?;
    let notes = req
        .notes
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty());

    // Shape checks before touching the database.
    let request = match req.resource_type {
        ResourceType::Court => {
            if req.quantity.is_some() {
                return Err(AppError::BadRequest(
                    "court bookings do not take a quantity".to_string(),
                ));
            }
            NewBooking::Court(NewCourtBooking {
                court_id: required_id(req.court_id, "court_id")?,
                booking_type: req.booking_type,
                start_time: req.start_time,
                end_time: req.end_time,
                notes,
            })
        }
        ResourceType::Equipment => NewBooking::Equipment(NewEquipmentBooking {
            equipment_id: required_id(req.equipment_id, "equipment_id")?,
            booking_type: req.booking_type,
            quantity: req.quantity.unwrap_or(1),
            start_time: req.start_time,
            end_time: req.end_time,
            notes,
        }),
    };

    let profile = state
        .db
        .get_profile(&user.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("profile".to_string()))?;

    let booking = match request {
        NewBooking::Court(court) => state.bookings.create_court_booking(&profile, court).await?,
        NewBooking::Equipment(equipment) => {
            state
                .bookings
                .create_equipment_booking(&profile, equipment)
                .await?
        }
    };
    Ok((StatusCode::CREATED, Json(booking)))
}

// ─── Lifecycle ───────────────────────────────────────────────

async fn cancel(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<Json<Booking>> {
    let booking = state.bookings.cancel(&user.user_id, user.role, &id).await?;
    Ok(Json(booking))
}

async fn history(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<Json<Vec<HistoryEntry>>> {
    Ok(Json(
        state.bookings.history(&user.user_id, user.role, &id).await?,
    ))
}

/// Signed pass for an approved booking, shown at the facility desk.
async fn booking_pass(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<Json<BookingPass>> {
    let booking = state
        .db
        .get_booking(&id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("booking {}", id)))?;
    if booking.user_id != user.user_id {
        return Err(AppError::Forbidden("not your booking".to_string()));
    }
    if booking.status != BookingStatus::Approved {
        return Err(AppError::Conflict(
            "passes are only issued for approved bookings".to_string(),
        ));
    }

    let resource = resource_details(&state.db, &booking).await?;
    let holder_name = state
        .db
        .get_profile(&booking.user_id)
        .await?
        .map(|p| p.full_name)
        .unwrap_or_default();
    let signature = pass::sign(&state.config.pass_signing_key, &booking)?;

    Ok(Json(BookingPass {
        code: booking.short_code(),
        booking_id: booking.id,
        resource_name: resource.name,
        location: resource.location,
        start_time: booking.start_time,
        end_time: booking.end_time,
        holder_name,
        quantity: booking.quantity,
        signature,
    }))
}
