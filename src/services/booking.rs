// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Booking workflow.
//!
//! Handles the core lifecycle:
//! 1. Validate and create a pending booking (court or equipment)
//! 2. Move it through the status machine (approve, reject, cancel, complete)
//! 3. Write the booking and its history row atomically
//! 4. Fire notification side effects after the write

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::{HashMap, HashSet};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use crate::db::FirestoreDb;
use crate::error::{AppError, Result};
use crate::models::{
    Booking, BookingStatus, BookingType, EquipmentCondition, Profile, ResourceType, Role,
    StatusChange, UserBookingStats,
};
use crate::services::availability::{
    find_block, find_conflict, reserved_quantity, validate_window, SlotSchedule,
};
use crate::services::notification::Notifier;
use crate::time_utils::{now, truncate_to_seconds};

/// Upcoming bookings shown on the dashboard.
pub const UPCOMING_LIMIT: usize = 5;

/// Request to book a court.
#[derive(Debug, Clone)]
pub struct NewCourtBooking {
    pub court_id: String,
    pub booking_type: BookingType,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub notes: Option<String>,
}

/// Request to reserve equipment.
#[derive(Debug, Clone)]
pub struct NewEquipmentBooking {
    pub equipment_id: String,
    pub booking_type: BookingType,
    pub quantity: u32,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub notes: Option<String>,
}

/// Result of a bulk approval.
#[derive(Debug, Default, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct BulkApproveReport {
    pub approved: Vec<String>,
    pub failed: Vec<BulkFailure>,
}

#[derive(Debug, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct BulkFailure {
    pub id: String,
    pub reason: String,
}

/// A history row with the acting user's identity resolved.
#[derive(Debug, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct HistoryEntry {
    #[serde(flatten)]
    pub change: StatusChange,
    pub changed_by_name: Option<String>,
    pub changed_by_email: Option<String>,
}

/// Error for a transition the status machine does not allow.
pub fn invalid_transition(from: BookingStatus, to: BookingStatus) -> AppError {
    AppError::Conflict(format!(
        "{}: {} -> {}",
        AppError::INVALID_TRANSITION,
        from,
        to
    ))
}

/// Check that `status` may move to `next`.
pub fn check_transition(status: BookingStatus, next: BookingStatus) -> Result<()> {
    if status.can_transition_to(next) {
        Ok(())
    } else {
        Err(invalid_transition(status, next))
    }
}

/// New history row for a booking entering `new_status`.
pub fn history_row(
    booking_id: &str,
    old_status: Option<BookingStatus>,
    new_status: BookingStatus,
    changed_by: Option<&str>,
    notes: Option<String>,
    at: DateTime<Utc>,
) -> StatusChange {
    StatusChange {
        id: uuid::Uuid::new_v4().to_string(),
        booking_id: booking_id.to_string(),
        old_status,
        new_status,
        changed_by: changed_by.map(str::to_string),
        changed_at: at,
        notes,
    }
}

/// Booking lifecycle service.
#[derive(Clone)]
pub struct BookingService {
    db: FirestoreDb,
    notifier: Notifier,
    schedule: SlotSchedule,
    max_booking_hours: i64,
}

impl BookingService {
    pub fn new(
        db: FirestoreDb,
        notifier: Notifier,
        schedule: SlotSchedule,
        max_booking_hours: i64,
    ) -> Self {
        Self {
            db,
            notifier,
            schedule,
            max_booking_hours,
        }
    }

    /// Checks shared by every new booking; returns the booker's class for class bookings.
    async fn check_booker(
        &self,
        user: &Profile,
        booking_type: BookingType,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Option<String>> {
        if !user.is_active() {
            return Err(AppError::Forbidden("account is not active".to_string()));
        }

        validate_window(start, end, now(), &self.schedule, self.max_booking_hours)
            .map_err(|e| AppError::BadRequest(e.to_string()))?;

        match booking_type {
            BookingType::Individual => Ok(None),
            BookingType::Class => {
                let class_id = user.class_id.as_deref().ok_or_else(|| {
                    AppError::BadRequest("class bookings require a class".to_string())
                })?;
                let class = self
                    .db
                    .get_class(class_id)
                    .await?
                    .ok_or_else(|| AppError::BadRequest("class not found".to_string()))?;
                if !class.is_active {
                    return Err(AppError::BadRequest("class is not active".to_string()));
                }
                Ok(Some(class.id))
            }
        }
    }

    /// Store a new pending booking and announce it.
    async fn insert(&self, booking: Booking) -> Result<Booking> {
        let change = history_row(
            &booking.id,
            None,
            BookingStatus::Pending,
            Some(&booking.user_id),
            None,
            booking.created_at,
        );
        self.db.save_booking_with_history(&booking, &change).await?;

        tracing::info!(
            booking_id = %booking.id,
            user_id = %booking.user_id,
            resource_type = booking.resource_type.as_str(),
            resource_id = booking.resource_id().unwrap_or_default(),
            "Booking created"
        );
        self.notifier.booking_created(&booking);
        Ok(booking)
    }

    pub async fn create_court_booking(
        &self,
        user: &Profile,
        request: NewCourtBooking,
    ) -> Result<Booking> {
        let start = truncate_to_seconds(request.start_time);
        let end = truncate_to_seconds(request.end_time);
        let class_id = self
            .check_booker(user, request.booking_type, start, end)
            .await?;

        let court = self
            .db
            .get_court(&request.court_id)
            .await?
            .ok_or_else(|| AppError::NotFound("court".to_string()))?;
        if !court.is_available {
            return Err(AppError::BadRequest(
                "court is not open for bookings".to_string(),
            ));
        }

        let existing = self
            .db
            .list_bookings_for_resource(ResourceType::Court, &court.id, start, end)
            .await?;
        if let Some(conflict) = find_conflict(start, end, &existing) {
            tracing::debug!(conflicting = %conflict.id, "Court slot already booked");
            return Err(AppError::Conflict(
                "time slot is already booked".to_string(),
            ));
        }

        let blocks = self.db.list_time_blocks_overlapping(start, end).await?;
        if let Some(block) = find_block(&court.id, start, end, &blocks) {
            return Err(AppError::Conflict(format!(
                "court is unavailable: {}",
                block.reason
            )));
        }

        let created = now();
        self.insert(Booking {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: user.user_id.clone(),
            class_id,
            court_id: Some(court.id),
            equipment_id: None,
            resource_type: ResourceType::Court,
            booking_type: request.booking_type,
            quantity: None,
            start_time: start,
            end_time: end,
            status: BookingStatus::Pending,
            notes: request.notes,
            created_at: created,
            updated_at: created,
        })
        .await
    }

    pub async fn create_equipment_booking(
        &self,
        user: &Profile,
        request: NewEquipmentBooking,
    ) -> Result<Booking> {
        let start = truncate_to_seconds(request.start_time);
        let end = truncate_to_seconds(request.end_time);
        if request.quantity == 0 {
            return Err(AppError::BadRequest(
                "quantity must be at least 1".to_string(),
            ));
        }
        let class_id = self
            .check_booker(user, request.booking_type, start, end)
            .await?;

        let equipment = self
            .db
            .get_equipment(&request.equipment_id)
            .await?
            .ok_or_else(|| AppError::NotFound("equipment".to_string()))?;
        if equipment.condition == EquipmentCondition::Maintenance {
            return Err(AppError::BadRequest(
                "equipment is under maintenance".to_string(),
            ));
        }

        let existing = self
            .db
            .list_bookings_for_resource(ResourceType::Equipment, &equipment.id, start, end)
            .await?;
        let bookable = equipment.bookable_quantity(reserved_quantity(start, end, &existing));
        if request.quantity > bookable {
            return Err(AppError::Conflict(format!(
                "only {} available for this time",
                bookable
            )));
        }

        let created = now();
        self.insert(Booking {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: user.user_id.clone(),
            class_id,
            court_id: None,
            equipment_id: Some(equipment.id),
            resource_type: ResourceType::Equipment,
            booking_type: request.booking_type,
            quantity: Some(request.quantity),
            start_time: start,
            end_time: end,
            status: BookingStatus::Pending,
            notes: request.notes,
            created_at: created,
            updated_at: created,
        })
        .await
    }

    async fn load(&self, booking_id: &str) -> Result<Booking> {
        self.db
            .get_booking(booking_id)
            .await?
            .ok_or_else(|| AppError::NotFound("booking".to_string()))
    }

    /// Approval must not double-book what other approved bookings hold.
    async fn check_approvable(&self, booking: &Booking) -> Result<()> {
        let Some(resource_id) = booking.resource_id() else {
            return Ok(());
        };
        let others: Vec<Booking> = self
            .db
            .list_bookings_for_resource(
                booking.resource_type,
                resource_id,
                booking.start_time,
                booking.end_time,
            )
            .await?
            .into_iter()
            .filter(|b| b.id != booking.id && b.status == BookingStatus::Approved)
            .collect();

        match booking.resource_type {
            ResourceType::Court => {
                if let Some(conflict) = find_conflict(booking.start_time, booking.end_time, &others)
                {
                    return Err(AppError::Conflict(format!(
                        "overlaps approved booking {}",
                        conflict.short_code()
                    )));
                }
            }
            ResourceType::Equipment => {
                let equipment = self
                    .db
                    .get_equipment(resource_id)
                    .await?
                    .ok_or_else(|| AppError::NotFound("equipment".to_string()))?;
                let reserved = reserved_quantity(booking.start_time, booking.end_time, &others);
                if booking.quantity.unwrap_or(0) > equipment.bookable_quantity(reserved) {
                    return Err(AppError::Conflict(
                        "not enough equipment in stock to approve".to_string(),
                    ));
                }
            }
        }
        Ok(())
    }

    /// Apply a transition and persist it; side effects are left to the caller.
    async fn apply(
        &self,
        mut booking: Booking,
        next: BookingStatus,
        actor_id: &str,
        notes: Option<String>,
    ) -> Result<(Booking, BookingStatus)> {
        let old = booking.status;
        check_transition(old, next)?;
        if next == BookingStatus::Approved {
            self.check_approvable(&booking).await?;
        }

        let at = now();
        booking.status = next;
        booking.updated_at = at;
        let change = history_row(&booking.id, Some(old), next, Some(actor_id), notes, at);
        self.db.save_booking_with_history(&booking, &change).await?;

        tracing::info!(
            booking_id = %booking.id,
            user_id = %booking.user_id,
            actor_id,
            from = %old,
            to = %next,
            "Booking status changed"
        );
        Ok((booking, old))
    }

    async fn transition(
        &self,
        booking_id: &str,
        next: BookingStatus,
        actor_id: &str,
        notes: Option<String>,
    ) -> Result<Booking> {
        let booking = self.load(booking_id).await?;
        let (booking, old) = self.apply(booking, next, actor_id, notes).await?;
        self.notifier.booking_status_changed(&booking, old).await;
        Ok(booking)
    }

    /// Cancel a booking (owner or staff).
    pub async fn cancel(&self, actor_id: &str, actor_role: Role, booking_id: &str) -> Result<Booking> {
        let booking = self.load(booking_id).await?;
        if booking.user_id != actor_id && !actor_role.is_staff() {
            return Err(AppError::Forbidden(
                "only the owner or staff can cancel".to_string(),
            ));
        }
        let (booking, old) = self
            .apply(booking, BookingStatus::Cancelled, actor_id, None)
            .await?;
        self.notifier.booking_status_changed(&booking, old).await;
        Ok(booking)
    }

    pub async fn approve(
        &self,
        actor_id: &str,
        booking_id: &str,
        notes: Option<String>,
    ) -> Result<Booking> {
        self.transition(booking_id, BookingStatus::Approved, actor_id, notes)
            .await
    }

    pub async fn reject(
        &self,
        actor_id: &str,
        booking_id: &str,
        notes: Option<String>,
    ) -> Result<Booking> {
        self.transition(booking_id, BookingStatus::Rejected, actor_id, notes)
            .await
    }

    pub async fn complete(
        &self,
        actor_id: &str,
        booking_id: &str,
        notes: Option<String>,
    ) -> Result<Booking> {
        self.transition(booking_id, BookingStatus::Completed, actor_id, notes)
            .await
    }

    /// Approve each booking independently and report per-ID outcomes.
    pub async fn bulk_approve(&self, actor_id: &str, ids: &[String]) -> BulkApproveReport {
        let mut report = BulkApproveReport::default();
        let mut changed = Vec::new();

        for id in ids {
            let outcome = match self.load(id).await {
                Ok(booking) => {
                    self.apply(booking, BookingStatus::Approved, actor_id, None)
                        .await
                }
                Err(e) => Err(e),
            };
            match outcome {
                Ok((booking, old)) => {
                    report.approved.push(booking.id.clone());
                    changed.push((booking, old));
                }
                Err(e) => {
                    tracing::warn!(booking_id = %id, error = %e, "Bulk approval failed for booking");
                    report.failed.push(BulkFailure {
                        id: id.clone(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        tracing::info!(
            actor_id,
            approved = report.approved.len(),
            failed = report.failed.len(),
            "Bulk approval complete"
        );
        self.notifier.bookings_status_changed(changed).await;
        report
    }

    // ─── Queries ─────────────────────────────────────────────────

    pub async fn list_for_user(&self, user_id: &str) -> Result<Vec<Booking>> {
        self.db.list_bookings_for_user(user_id).await
    }

    /// Next active bookings starting at or after now.
    pub async fn upcoming(&self, user_id: &str) -> Result<Vec<Booking>> {
        let now = now();
        Ok(self
            .db
            .list_bookings_for_user(user_id)
            .await?
            .into_iter()
            .filter(|b| b.status.is_active() && b.start_time >= now)
            .take(UPCOMING_LIMIT)
            .collect())
    }

    pub async fn user_stats(&self, user_id: &str) -> Result<UserBookingStats> {
        let bookings = self.db.list_bookings_for_user(user_id).await?;
        let issues = self.db.list_issues_for_user(user_id).await?;
        Ok(UserBookingStats::compute(&bookings, &issues, now()))
    }

    /// Status history for a booking the viewer may see.
    pub async fn history(
        &self,
        viewer_id: &str,
        viewer_role: Role,
        booking_id: &str,
    ) -> Result<Vec<HistoryEntry>> {
        let booking = self.load(booking_id).await?;
        if booking.user_id != viewer_id && !viewer_role.is_staff() {
            return Err(AppError::Forbidden("not your booking".to_string()));
        }

        let changes = self.db.list_status_history(booking_id).await?;
        let actor_ids: HashSet<&str> = changes
            .iter()
            .filter_map(|c| c.changed_by.as_deref())
            .collect();

        let mut actors: HashMap<String, Profile> = HashMap::new();
        for id in actor_ids {
            if let Some(profile) = self.db.get_profile(id).await? {
                actors.insert(id.to_string(), profile);
            }
        }

        Ok(changes
            .into_iter()
            .map(|change| {
                let actor = change.changed_by.as_ref().and_then(|id| actors.get(id));
                HistoryEntry {
                    changed_by_name: actor.map(|p| p.full_name.clone()),
                    changed_by_email: actor.map(|p| p.email.clone()),
                    change,
                }
            })
            .collect())
    }
}
