// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Equipment inventory and issue records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub enum EquipmentCondition {
    Good,
    Fair,
    NeedsAttention,
    Maintenance,
}

/// Stock of one kind of equipment.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Equipment {
    /// Document ID
    pub id: String,
    pub name: String,
    pub category: String,
    /// Items owned
    pub total_quantity: u32,
    /// Items on the shelf (not issued, damaged or lost)
    pub available_quantity: u32,
    pub condition: EquipmentCondition,
    pub image_url: Option<String>,
    pub last_restocked: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Equipment {
    /// Items currently off the shelf.
    pub fn issued_quantity(&self) -> u32 {
        self.total_quantity.saturating_sub(self.available_quantity)
    }

    /// Items still free to promise in a window where `reserved` are already
    /// promised to active bookings.
    ///
    /// Reservations count against owned stock, not the shelf: issued items
    /// belong to a booking that is itself part of `reserved`.
    pub fn bookable_quantity(&self, reserved: u32) -> u32 {
        self.total_quantity.saturating_sub(reserved)
    }

    /// Add new stock; restocking resets the condition.
    pub fn restock(&mut self, amount: u32, now: DateTime<Utc>) {
        self.total_quantity += amount;
        self.available_quantity += amount;
        self.condition = EquipmentCondition::Good;
        self.last_restocked = Some(now);
        self.updated_at = now;
    }
}

/// Condition of items handed back at the desk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub enum ReturnCondition {
    Good,
    Damaged,
    Lost,
}

impl ReturnCondition {
    /// Whether returned items go back into available stock.
    pub fn restores_stock(self) -> bool {
        self == ReturnCondition::Good
    }
}

/// Physical hand-out of items for an approved equipment booking.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct EquipmentIssue {
    pub id: String,
    pub booking_id: String,
    pub equipment_id: String,
    pub user_id: String,
    pub quantity: u32,
    pub issued_at: DateTime<Utc>,
    pub due_at: DateTime<Utc>,
    pub returned_at: Option<DateTime<Utc>>,
    pub return_condition: Option<ReturnCondition>,
    pub delay_fee: Option<f64>,
    pub notes: Option<String>,
}

impl EquipmentIssue {
    pub fn is_outstanding(&self) -> bool {
        self.returned_at.is_none()
    }
}

/// Fee for returning at `returned_at` an item due at `due_at`.
///
/// Every started hour past the due time is charged.
pub fn late_fee(due_at: DateTime<Utc>, returned_at: DateTime<Utc>, fee_per_hour: f64) -> f64 {
    let late_seconds = (returned_at - due_at).num_seconds();
    if late_seconds <= 0 {
        return 0.0;
    }
    let started_hours = (late_seconds + 3599) / 3600;
    started_hours as f64 * fee_per_hour
}
