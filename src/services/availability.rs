// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Slot generation and conflict detection.
//!
//! All checks are linear scans over the bookings and time blocks of a
//! single court or item; the caller narrows the candidate set with a
//! Firestore query first.

use crate::models::{Booking, BookingType, TimeBlock};
use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Half-open interval intersection: `[a_start, a_end)` and `[b_start, b_end)`.
pub fn overlaps(
    a_start: DateTime<Utc>,
    a_end: DateTime<Utc>,
    b_start: DateTime<Utc>,
    b_end: DateTime<Utc>,
) -> bool {
    a_start < b_end && b_start < a_end
}

/// Daily opening hours (UTC) and slot length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotSchedule {
    pub open_hour: u32,
    pub close_hour: u32,
    pub slot_minutes: u32,
}

impl Default for SlotSchedule {
    fn default() -> Self {
        Self {
            open_hour: 6,
            close_hour: 21,
            slot_minutes: 60,
        }
    }
}

impl SlotSchedule {
    pub fn validate(&self) -> Result<(), String> {
        if self.open_hour >= self.close_hour {
            return Err("opening hour must be before closing hour".to_string());
        }
        if self.close_hour > 24 {
            return Err("closing hour must be at most 24".to_string());
        }
        if self.slot_minutes == 0 || self.slot_minutes > self.open_minutes() {
            return Err("slot length must fit within opening hours".to_string());
        }
        Ok(())
    }

    fn open_minutes(&self) -> u32 {
        self.close_hour.saturating_sub(self.open_hour) * 60
    }

    pub fn open_hours_per_day(&self) -> f64 {
        f64::from(self.close_hour.saturating_sub(self.open_hour))
    }

    pub fn slot_count(&self) -> u32 {
        self.open_minutes() / self.slot_minutes.max(1)
    }

    /// Opening and closing instants on `date`.
    pub fn day_bounds(&self, date: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
        let midnight = Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN));
        (
            midnight + Duration::hours(i64::from(self.open_hour)),
            midnight + Duration::hours(i64::from(self.close_hour)),
        )
    }
}

/// Why a slot cannot be booked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub enum SlotReason {
    Booked,
    Blocked,
    Past,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct TimeSlot {
    /// "slot-N", zero-based
    pub id: String,
    /// "HH:MM"
    pub time: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub available: bool,
    pub reason: Option<SlotReason>,
    pub booking_type: Option<BookingType>,
    /// Class name, or "Individual"
    pub booked_by: Option<String>,
}

/// What occupies a court on a given day.
pub struct CourtOccupancy<'a> {
    pub court_id: &'a str,
    pub bookings: &'a [Booking],
    pub blocks: &'a [TimeBlock],
    /// Class document ID to display name
    pub class_names: &'a HashMap<String, String>,
}

/// Build the slot grid for one court on `date`.
pub fn generate_slots(
    date: NaiveDate,
    schedule: &SlotSchedule,
    occupancy: &CourtOccupancy<'_>,
    now: DateTime<Utc>,
) -> Vec<TimeSlot> {
    let (open, _) = schedule.day_bounds(date);
    let step = Duration::minutes(i64::from(schedule.slot_minutes));

    (0..schedule.slot_count())
        .map(|n| {
            let start = open + step * n as i32;
            let end = start + step;
            let mut slot = TimeSlot {
                id: format!("slot-{n}"),
                time: start.format("%H:%M").to_string(),
                start_time: start,
                end_time: end,
                available: false,
                reason: None,
                booking_type: None,
                booked_by: None,
            };

            if let Some(booking) = find_conflict(start, end, occupancy.bookings) {
                slot.reason = Some(SlotReason::Booked);
                slot.booking_type = Some(booking.booking_type);
                slot.booked_by = Some(booked_by(booking, occupancy.class_names));
            } else if find_block(occupancy.court_id, start, end, occupancy.blocks).is_some() {
                slot.reason = Some(SlotReason::Blocked);
            } else if start <= now {
                slot.reason = Some(SlotReason::Past);
            } else {
                slot.available = true;
            }
            slot
        })
        .collect()
}

fn booked_by(booking: &Booking, class_names: &HashMap<String, String>) -> String {
    match (booking.booking_type, booking.class_id.as_ref()) {
        (BookingType::Class, Some(class_id)) => class_names
            .get(class_id)
            .cloned()
            .unwrap_or_else(|| "Class".to_string()),
        _ => "Individual".to_string(),
    }
}

/// First active booking overlapping `[start, end)`.
pub fn find_conflict(
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    bookings: &[Booking],
) -> Option<&Booking> {
    bookings
        .iter()
        .find(|b| b.status.is_active() && overlaps(start, end, b.start_time, b.end_time))
}

/// First block closing `court_id` during `[start, end)`.
pub fn find_block<'a>(
    court_id: &str,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    blocks: &'a [TimeBlock],
) -> Option<&'a TimeBlock> {
    blocks
        .iter()
        .find(|b| b.applies_to_court(court_id) && overlaps(start, end, b.start_time, b.end_time))
}

/// Items already promised to active bookings overlapping `[start, end)`.
pub fn reserved_quantity(start: DateTime<Utc>, end: DateTime<Utc>, bookings: &[Booking]) -> u32 {
    bookings
        .iter()
        .filter(|b| b.status.is_active() && overlaps(start, end, b.start_time, b.end_time))
        .map(|b| b.quantity.unwrap_or(0))
        .sum()
}

/// Reasons a requested booking window is rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WindowError {
    #[error("end time must be after start time")]
    Empty,
    #[error("start time must be in the future")]
    InPast,
    #[error("bookings are limited to {0} hours")]
    TooLong(i64),
    #[error("booking must fall within opening hours")]
    OutsideHours,
}

/// Check a requested window against the clock and opening hours.
pub fn validate_window(
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    now: DateTime<Utc>,
    schedule: &SlotSchedule,
    max_hours: i64,
) -> Result<(), WindowError> {
    if end <= start {
        return Err(WindowError::Empty);
    }
    if start <= now {
        return Err(WindowError::InPast);
    }
    if end - start > Duration::hours(max_hours) {
        return Err(WindowError::TooLong(max_hours));
    }
    let (open, close) = schedule.day_bounds(start.date_naive());
    if start < open || end > close {
        return Err(WindowError::OutsideHours);
    }
    Ok(())
}
