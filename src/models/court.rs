// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Court model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// A bookable court, field, hall or pool.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Court {
    /// Document ID
    pub id: String,
    /// Display name (e.g., "Indoor Basketball Court A")
    pub name: String,
    pub sport: String,
    pub location: String,
    /// Maximum players
    pub capacity: u32,
    pub image_url: Option<String>,
    #[serde(default)]
    pub amenities: Vec<String>,
    /// Closed courts reject new bookings
    pub is_available: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
