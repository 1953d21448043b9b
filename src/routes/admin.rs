// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Staff routes: booking review, pass checks, dashboard and analytics.
//!
//! Mounted behind `require_auth` and `require_staff` in routes/mod.rs.

use crate::db::BookingFilter;
use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::stats::{AnalyticsInput, DashboardCounts};
use crate::models::{Analytics, Booking, BookingStatus, DashboardStats, ResourceType};
use crate::services::booking::BulkApproveReport;
use crate::services::pass;
use crate::time_utils::{now, parse_utc_rfc3339};
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Extension, Json, Router,
};
use chrono::{DateTime, Months, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use validator::Validate;

const MAX_PER_PAGE: u32 = 100;
/// Analytics window when none is given.
const DEFAULT_ANALYTICS_MONTHS: u32 = 6;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/admin/bookings", get(list_bookings))
        .route("/api/admin/bookings/bulk-approve", post(bulk_approve))
        .route("/api/admin/bookings/{id}/approve", post(approve))
        .route("/api/admin/bookings/{id}/reject", post(reject))
        .route("/api/admin/bookings/{id}/complete", post(complete))
        .route("/api/admin/passes/verify", post(verify_pass))
        .route("/api/admin/dashboard", get(dashboard))
        .route("/api/admin/analytics", get(analytics))
}

// ─── Booking Review ──────────────────────────────────────────

#[derive(Deserialize)]
struct BookingsQuery {
    status: Option<String>,
    resource_type: Option<String>,
    user_id: Option<String>,
    /// Pagination: page number (1-indexed)
    #[serde(default = "default_page")]
    page: u32,
    /// Pagination: items per page
    #[serde(default = "default_per_page")]
    per_page: u32,
}

fn default_page() -> u32 {
    1
}
fn default_per_page() -> u32 {
    50
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct BookingsPage {
    pub bookings: Vec<Booking>,
    pub page: u32,
    pub per_page: u32,
}

fn booking_filter(params: &BookingsQuery) -> Result<BookingFilter> {
    let status = params
        .status
        .as_deref()
        .map(|s| {
            BookingStatus::parse(s)
                .ok_or_else(|| AppError::BadRequest(format!("unknown status {:?}", s)))
        })
        .transpose()?;
    let resource_type = params
        .resource_type
        .as_deref()
        .map(|r| {
            ResourceType::parse(r)
                .ok_or_else(|| AppError::BadRequest(format!("unknown resource type {:?}", r)))
        })
        .transpose()?;
    Ok(BookingFilter {
        status,
        resource_type,
        user_id: params.user_id.clone(),
    })
}

async fn list_bookings(
    State(state): State<Arc<AppState>>,
    Query(params): Query<BookingsQuery>,
) -> Result<Json<BookingsPage>> {
    if params.page < 1 {
        return Err(AppError::BadRequest(
            "Page must be greater than 0".to_string(),
        ));
    }
    let filter = booking_filter(&params)?;
    let per_page = params.per_page.clamp(1, MAX_PER_PAGE);
    let offset = (params.page - 1).saturating_mul(per_page);

    let bookings = state.db.list_bookings(&filter, per_page, offset).await?;
    Ok(Json(BookingsPage {
        bookings,
        page: params.page,
        per_page,
    }))
}

#[derive(Debug, Default, Deserialize, Validate)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ReviewRequest {
    #[validate(length(max = 500))]
    #[serde(default)]
    pub notes: Option<String>,
}

/// Review notes are optional; an empty request body means none.
fn review_notes(body: Option<Json<ReviewRequest>>) -> Result<Option<String>> {
    let Some(Json(req)) = body else {
        return Ok(None);
    };
    req.validate()?;
    Ok(req
        .notes
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty()))
}

async fn approve(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
    body: Option<Json<ReviewRequest>>,
) -> Result<Json<Booking>> {
    let notes = review_notes(body)?;
    Ok(Json(state.bookings.approve(&user.user_id, &id, notes).await?))
}

async fn reject(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
    body: Option<Json<ReviewRequest>>,
) -> Result<Json<Booking>> {
    let notes = review_notes(body)?;
    Ok(Json(state.bookings.reject(&user.user_id, &id, notes).await?))
}

async fn complete(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
    body: Option<Json<ReviewRequest>>,
) -> Result<Json<Booking>> {
    let notes = review_notes(body)?;
    Ok(Json(state.bookings.complete(&user.user_id, &id, notes).await?))
}

#[derive(Debug, Deserialize, Validate)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct BulkApproveRequest {
    #[validate(length(min = 1, max = 100))]
    pub ids: Vec<String>,
}

async fn bulk_approve(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(req): Json<BulkApproveRequest>,
) -> Result<Json<BulkApproveReport>> {
    req.validate()?;
    Ok(Json(state.bookings.bulk_approve(&user.user_id, &req.ids).await))
}

// ─── Pass Verification ───────────────────────────────────────

#[derive(Debug, Deserialize, Validate)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct VerifyPassRequest {
    #[validate(length(equal = 8))]
    pub code: String,
    #[validate(length(equal = 64))]
    pub signature: String,
}

#[derive(Debug, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct PassVerification {
    pub valid: bool,
    /// Why the pass was refused
    pub reason: Option<String>,
    pub booking: Option<Booking>,
}

impl PassVerification {
    fn refused(reason: &str) -> Self {
        Self {
            valid: false,
            reason: Some(reason.to_string()),
            booking: None,
        }
    }
}

async fn verify_pass(
    State(state): State<Arc<AppState>>,
    Json(req): Json<VerifyPassRequest>,
) -> Result<Json<PassVerification>> {
    req.validate()?;

    let prefix = req.code.trim().to_lowercase();
    let mut matches = state.db.find_bookings_by_id_prefix(&prefix).await?;
    let booking = match matches.len() {
        0 => return Ok(Json(PassVerification::refused("unknown pass code"))),
        1 => matches.remove(0),
        _ => return Ok(Json(PassVerification::refused("ambiguous pass code"))),
    };

    if !pass::verify(&state.config.pass_signing_key, &booking, &req.signature) {
        tracing::warn!(booking_id = %booking.id, "Pass signature mismatch");
        return Ok(Json(PassVerification::refused("invalid signature")));
    }
    if booking.status != BookingStatus::Approved {
        return Ok(Json(PassVerification {
            valid: false,
            reason: Some(format!("booking is {}", booking.status)),
            booking: Some(booking),
        }));
    }

    Ok(Json(PassVerification {
        valid: true,
        reason: None,
        booking: Some(booking),
    }))
}

// ─── Dashboard & Analytics ───────────────────────────────────

async fn dashboard(State(state): State<Arc<AppState>>) -> Result<Json<DashboardStats>> {
    let profiles = state.db.list_profiles().await?;
    let classes = state.db.list_classes().await?;
    let courts = state.db.list_courts().await?;
    let equipment = state.db.list_equipment().await?;
    let bookings = state.db.list_all_bookings().await?;

    let counts = DashboardCounts {
        total_users: profiles.len() as u32,
        active_classes: classes.iter().filter(|c| c.is_active).count() as u32,
    };
    Ok(Json(DashboardStats::compute(
        counts,
        &courts,
        &equipment,
        &bookings,
        state.config.low_stock_threshold,
    )))
}

#[derive(Deserialize)]
struct AnalyticsQuery {
    /// RFC 3339 timestamp or YYYY-MM-DD
    from: Option<String>,
    to: Option<String>,
}

fn parse_bound(raw: &str) -> Result<DateTime<Utc>> {
    if let Some(at) = parse_utc_rfc3339(raw) {
        return Ok(at);
    }
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|d| d.and_utc())
        .ok_or_else(|| AppError::BadRequest(format!("invalid date {:?}", raw)))
}

/// Resolve the analytics window, defaulting to the last six months.
fn analytics_window(
    params: &AnalyticsQuery,
    now: DateTime<Utc>,
) -> Result<(DateTime<Utc>, DateTime<Utc>)> {
    let to = params.to.as_deref().map(parse_bound).transpose()?.unwrap_or(now);
    let from = match params.from.as_deref() {
        Some(raw) => parse_bound(raw)?,
        None => to
            .checked_sub_months(Months::new(DEFAULT_ANALYTICS_MONTHS))
            .ok_or_else(|| AppError::BadRequest("window start out of range".to_string()))?,
    };
    if from >= to {
        return Err(AppError::BadRequest(
            "'from' must be before 'to'".to_string(),
        ));
    }
    Ok((from, to))
}

async fn analytics(
    State(state): State<Arc<AppState>>,
    Query(params): Query<AnalyticsQuery>,
) -> Result<Json<Analytics>> {
    let (from, to) = analytics_window(&params, now())?;

    let bookings = state.db.list_bookings_between(from, to).await?;
    let courts = state.db.list_courts().await?;
    let equipment = state.db.list_equipment().await?;

    tracing::debug!(%from, %to, bookings = bookings.len(), "Computing analytics");

    Ok(Json(Analytics::compute(AnalyticsInput {
        from,
        to,
        bookings: &bookings,
        courts: &courts,
        equipment: &equipment,
        open_hours_per_day: state.config.schedule.open_hours_per_day(),
    })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn query(status: Option<&str>, resource_type: Option<&str>) -> BookingsQuery {
        BookingsQuery {
            status: status.map(str::to_string),
            resource_type: resource_type.map(str::to_string),
            user_id: None,
            page: 1,
            per_page: 50,
        }
    }

    #[test]
    fn test_booking_filter_parsing() {
        let filter = booking_filter(&query(Some("pending"), Some("court"))).unwrap();
        assert_eq!(filter.status, Some(BookingStatus::Pending));
        assert_eq!(filter.resource_type, Some(ResourceType::Court));

        assert!(booking_filter(&query(Some("waiting"), None)).is_err());
        assert!(booking_filter(&query(None, Some("pool"))).is_err());
    }

    #[test]
    fn test_analytics_window_defaults_to_six_months() {
        let now = Utc.with_ymd_and_hms(2026, 7, 31, 12, 0, 0).unwrap();
        let (from, to) = analytics_window(
            &AnalyticsQuery {
                from: None,
                to: None,
            },
            now,
        )
        .unwrap();
        assert_eq!(to, now);
        assert_eq!(from, Utc.with_ymd_and_hms(2026, 1, 31, 12, 0, 0).unwrap());
    }

    #[test]
    fn test_review_notes() {
        assert_eq!(review_notes(None).unwrap(), None);
        assert_eq!(
            review_notes(Some(Json(ReviewRequest {
                notes: Some("  see you at 9 ".to_string())
            })))
            .unwrap(),
            Some("see you at 9".to_string())
        );
        assert_eq!(
            review_notes(Some(Json(ReviewRequest {
                notes: Some("   ".to_string())
            })))
            .unwrap(),
            None
        );
        assert!(matches!(
            review_notes(Some(Json(ReviewRequest {
                notes: Some("x".repeat(501))
            }))),
            Err(AppError::BadRequest(_))
        ));
    }

    #[test]
    fn test_analytics_window_explicit_bounds() {
        let now = Utc::now();
        let (from, to) = analytics_window(
            &AnalyticsQuery {
                from: Some("2026-01-01".to_string()),
                to: Some("2026-02-01T00:00:00Z".to_string()),
            },
            now,
        )
        .unwrap();
        assert_eq!(from, Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap());
        assert_eq!(to, Utc.with_ymd_and_hms(2026, 2, 1, 0, 0, 0).unwrap());

        let reversed = analytics_window(
            &AnalyticsQuery {
                from: Some("2026-02-01".to_string()),
                to: Some("2026-01-01".to_string()),
            },
            now,
        );
        assert!(matches!(reversed, Err(AppError::BadRequest(_))));
    }
}
