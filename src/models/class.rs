// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Student class model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// A class (cohort/section) booked for by its representative.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Class {
    /// Document ID
    pub id: String,
    /// Institution identifier, e.g. "4AI23CD"
    pub class_id: String,
    pub name: String,
    pub department: String,
    pub year: u32,
    pub student_count: u32,
    /// Login code issued at registration (upper-case)
    pub class_code: String,
    pub representative_user_id: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
