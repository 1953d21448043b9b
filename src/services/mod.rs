// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod accounts;
pub mod availability;
pub mod booking;
pub mod class_code;
pub mod email;
pub mod events;
pub mod inventory;
pub mod notification;
pub mod pass;
pub mod password;
pub mod sessions;
pub mod throttle;

pub use accounts::AccountService;
pub use availability::SlotSchedule;
pub use booking::BookingService;
pub use email::EmailClient;
pub use events::EventHub;
pub use inventory::InventoryService;
pub use notification::Notifier;
pub use sessions::SessionCache;
pub use throttle::LoginThrottle;
