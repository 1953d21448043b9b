// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Administrative time blocks.

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
pub enum BlockScope {
    /// A single court
    Court,
    /// Every court
    Global,
}

impl BlockScope {
    pub fn as_str(self) -> &'static str {
        match self {
            BlockScope::Court => "court",
            BlockScope::Global => "global",
        }
    }
}

/// An interval during which bookings are refused (maintenance, events).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct TimeBlock {
    pub id: String,
    pub scope: BlockScope,
    /// Required for court-scoped blocks
    pub court_id: Option<String>,
    pub reason: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
}

impl TimeBlock {
    /// Whether this block closes the given court.
    pub fn applies_to_court(&self, court_id: &str) -> bool {
        match self.scope {
            BlockScope::Global => true,
            BlockScope::Court => self.court_id.as_deref() == Some(court_id),
        }
    }
}
