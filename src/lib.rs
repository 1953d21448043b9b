// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! SquadSync: campus sports facility booking
//!
//! This crate provides the backend API for booking courts and equipment,
//! routing requests through staff approval, and tracking inventory.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::Config;
use db::FirestoreDb;
use services::{
    AccountService, BookingService, EmailClient, EventHub, InventoryService, LoginThrottle,
    Notifier, SessionCache,
};
use std::sync::Arc;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub db: FirestoreDb,
    pub events: EventHub,
    /// Stored role and status of signed-in users
    pub sessions: Arc<SessionCache>,
    pub notifier: Notifier,
    pub bookings: BookingService,
    pub inventory: InventoryService,
    pub accounts: AccountService,
}

impl AppState {
    /// Wire every service around one database handle.
    pub fn new(config: Config, db: FirestoreDb) -> anyhow::Result<Self> {
        let events = EventHub::new();
        let email = EmailClient::new(config.resend_api_key.clone(), config.email_from.clone())?;
        let notifier = Notifier::new(db.clone(), email, events.clone());

        let bookings = BookingService::new(
            db.clone(),
            notifier.clone(),
            config.schedule,
            config.max_booking_hours,
        );
        let inventory =
            InventoryService::new(db.clone(), notifier.clone(), config.late_fee_per_hour);
        let sessions = Arc::new(SessionCache::new());
        let accounts = AccountService::new(
            db.clone(),
            notifier.clone(),
            Arc::new(LoginThrottle::new()),
            sessions.clone(),
        );

        Ok(Self {
            config,
            db,
            events,
            sessions,
            notifier,
            bookings,
            inventory,
            accounts,
        })
    }
}
