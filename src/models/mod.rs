// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod booking;
pub mod class;
pub mod court;
pub mod equipment;
pub mod notification;
pub mod stats;
pub mod time_block;
pub mod user;

pub use booking::{Booking, BookingStatus, BookingType, ResourceType, StatusChange};
pub use class::Class;
pub use court::Court;
pub use equipment::{Equipment, EquipmentCondition, EquipmentIssue, ReturnCondition};
pub use notification::{Notification, NotificationKind};
pub use stats::{Analytics, DashboardStats, UserBookingStats};
pub use time_block::{BlockScope, TimeBlock};
pub use user::{AccountStatus, Credentials, Profile, Role};
