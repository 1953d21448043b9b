// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Booking model and its status machine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Lifecycle of a booking request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub enum BookingStatus {
    Pending,
    Approved,
    Rejected,
    Cancelled,
    Completed,
}

impl BookingStatus {
    pub const ALL: [BookingStatus; 5] = [
        BookingStatus::Pending,
        BookingStatus::Approved,
        BookingStatus::Rejected,
        BookingStatus::Cancelled,
        BookingStatus::Completed,
    ];

    /// Statuses reachable from `self` in one step.
    pub fn successors(self) -> &'static [BookingStatus] {
        use BookingStatus::*;
        match self {
            Pending => &[Approved, Rejected, Cancelled],
            Approved => &[Completed, Cancelled],
            Rejected | Cancelled | Completed => &[],
        }
    }

    pub fn can_transition_to(self, next: BookingStatus) -> bool {
        self.successors().contains(&next)
    }

    pub fn is_terminal(self) -> bool {
        self.successors().is_empty()
    }

    /// Active bookings hold their time slot (and equipment quantity).
    pub fn is_active(self) -> bool {
        matches!(self, BookingStatus::Pending | BookingStatus::Approved)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Approved => "approved",
            BookingStatus::Rejected => "rejected",
            BookingStatus::Cancelled => "cancelled",
            BookingStatus::Completed => "completed",
        }
    }

    /// Capitalized form used in notification titles.
    pub fn label(self) -> &'static str {
        match self {
            BookingStatus::Pending => "Pending",
            BookingStatus::Approved => "Approved",
            BookingStatus::Rejected => "Rejected",
            BookingStatus::Cancelled => "Cancelled",
            BookingStatus::Completed => "Completed",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.as_str() == raw)
    }
}

impl std::fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether the booking is for the requester alone or for their class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub enum BookingType {
    Individual,
    Class,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub enum ResourceType {
    Court,
    Equipment,
}

impl ResourceType {
    pub fn as_str(self) -> &'static str {
        match self {
            ResourceType::Court => "court",
            ResourceType::Equipment => "equipment",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "court" => Some(ResourceType::Court),
            "equipment" => Some(ResourceType::Equipment),
            _ => None,
        }
    }
}

/// Stored booking record in Firestore.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Booking {
    /// Booking ID (also used as document ID)
    pub id: String,
    /// Requesting user
    pub user_id: String,
    /// Set for class bookings
    pub class_id: Option<String>,
    pub court_id: Option<String>,
    pub equipment_id: Option<String>,
    pub resource_type: ResourceType,
    pub booking_type: BookingType,
    /// Number of items (equipment bookings only)
    pub quantity: Option<u32>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub status: BookingStatus,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Booking {
    /// The court or equipment document this booking reserves.
    pub fn resource_id(&self) -> Option<&str> {
        match self.resource_type {
            ResourceType::Court => self.court_id.as_deref(),
            ResourceType::Equipment => self.equipment_id.as_deref(),
        }
    }

    pub fn duration_hours(&self) -> f64 {
        (self.end_time - self.start_time).num_seconds() as f64 / 3600.0
    }

    /// Short human-facing code printed on booking passes.
    pub fn short_code(&self) -> String {
        self.id.chars().take(8).collect::<String>().to_uppercase()
    }
}

/// Audit row appended on every status change.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct StatusChange {
    pub id: String,
    pub booking_id: String,
    /// None for the creation entry
    pub old_status: Option<BookingStatus>,
    pub new_status: BookingStatus,
    /// Acting user (None for system changes)
    pub changed_by: Option<String>,
    pub changed_at: DateTime<Utc>,
    pub notes: Option<String>,
}
