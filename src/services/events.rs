// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-process realtime event hub.
//!
//! Every SSE connection subscribes to one broadcast channel and filters
//! events by audience, so publishing never blocks on slow clients.

use serde::Serialize;
use tokio::sync::broadcast;

use crate::models::{Booking, BookingStatus, Notification, Role};

const CHANNEL_CAPACITY: usize = 1000;

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RealtimeEvent {
    BookingCreated {
        booking: Booking,
    },
    BookingStatusChanged {
        booking: Booking,
        old_status: BookingStatus,
    },
    NotificationCreated {
        notification: Notification,
    },
}

impl RealtimeEvent {
    /// SSE `event:` name.
    pub fn name(&self) -> &'static str {
        match self {
            RealtimeEvent::BookingCreated { .. } => "booking_created",
            RealtimeEvent::BookingStatusChanged { .. } => "booking_status_changed",
            RealtimeEvent::NotificationCreated { .. } => "notification_created",
        }
    }
}

/// An event plus who may see it.
#[derive(Debug, Clone)]
pub struct Envelope {
    pub user_id: String,
    pub include_staff: bool,
    pub event: RealtimeEvent,
}

impl Envelope {
    pub fn is_visible_to(&self, user_id: &str, role: Role) -> bool {
        self.user_id == user_id || (self.include_staff && role.is_staff())
    }
}

#[derive(Clone)]
pub struct EventHub {
    tx: broadcast::Sender<Envelope>,
}

impl Default for EventHub {
    fn default() -> Self {
        Self::new()
    }
}

impl EventHub {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Envelope> {
        self.tx.subscribe()
    }

    /// Booking events go to the owner and to staff.
    pub fn publish_booking(&self, event: RealtimeEvent, owner_id: &str) {
        self.publish(Envelope {
            user_id: owner_id.to_string(),
            include_staff: true,
            event,
        });
    }

    /// Notification events go to the recipient only.
    pub fn publish_notification(&self, notification: Notification) {
        self.publish(Envelope {
            user_id: notification.user_id.clone(),
            include_staff: false,
            event: RealtimeEvent::NotificationCreated { notification },
        });
    }

    fn publish(&self, envelope: Envelope) {
        // An error only means nobody is listening.
        if self.tx.send(envelope).is_err() {
            tracing::trace!("No realtime subscribers");
        }
    }
}
