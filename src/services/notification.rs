// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Side effects of booking status changes.
//!
//! Each change produces:
//! 1. An in-app notification for the booking owner
//! 2. An e-mail (when configured)
//! 3. Realtime events for the owner and staff
//!
//! Failures here are logged and never undo the status change.

use chrono::{DateTime, Utc};
use futures_util::{stream, StreamExt};

use crate::db::FirestoreDb;
use crate::error::Result;
use crate::models::{Booking, BookingStatus, Notification, NotificationKind, Profile, ResourceType};
use crate::services::email::{class_code_email, BookingEmail, EmailClient};
use crate::services::events::{EventHub, RealtimeEvent};

/// Concurrent side-effect fan-out for bulk operations.
const MAX_CONCURRENT_NOTIFICATIONS: usize = 8;

/// Display details of the court or item a booking reserves.
#[derive(Debug, Clone)]
pub struct ResourceDetails {
    pub name: String,
    pub location: Option<String>,
}

/// Look up the display name (and court location) for a booking.
pub async fn resource_details(db: &FirestoreDb, booking: &Booking) -> Result<ResourceDetails> {
    let details = match booking.resource_type {
        ResourceType::Court => match booking.court_id.as_deref() {
            Some(id) => db.get_court(id).await?.map(|c| ResourceDetails {
                name: c.name,
                location: Some(c.location),
            }),
            None => None,
        },
        ResourceType::Equipment => match booking.equipment_id.as_deref() {
            Some(id) => db.get_equipment(id).await?.map(|e| ResourceDetails {
                name: e.name,
                location: None,
            }),
            None => None,
        },
    };
    Ok(details.unwrap_or_else(|| ResourceDetails {
        name: "Unknown Resource".to_string(),
        location: None,
    }))
}

/// "Thursday, January 15, 2026"
pub fn format_booking_date(at: DateTime<Utc>) -> String {
    at.format("%A, %B %-d, %Y").to_string()
}

/// "9:00 AM - 10:00 AM"
pub fn format_time_range(start: DateTime<Utc>, end: DateTime<Utc>) -> String {
    format!("{} - {}", start.format("%-I:%M %p"), end.format("%-I:%M %p"))
}

pub fn notification_kind(status: BookingStatus) -> NotificationKind {
    match status {
        BookingStatus::Approved => NotificationKind::Success,
        BookingStatus::Rejected => NotificationKind::Error,
        _ => NotificationKind::Info,
    }
}

/// In-app notification for a booking that just moved to its current status.
pub fn build_notification(booking: &Booking, resource_name: &str, now: DateTime<Utc>) -> Notification {
    let kind = match booking.resource_type {
        ResourceType::Court => "court",
        ResourceType::Equipment => "equipment",
    };
    Notification {
        id: uuid::Uuid::new_v4().to_string(),
        user_id: booking.user_id.clone(),
        kind: notification_kind(booking.status),
        title: format!("Booking {}", booking.status.label()),
        message: format!(
            "Your {} booking for {} on {} has been {}.",
            kind,
            resource_name,
            format_booking_date(booking.start_time),
            booking.status.as_str()
        ),
        is_read: false,
        created_at: now,
    }
}

/// Delivers notifications, e-mails and realtime events.
#[derive(Clone)]
pub struct Notifier {
    db: FirestoreDb,
    email: EmailClient,
    events: EventHub,
}

impl Notifier {
    pub fn new(db: FirestoreDb, email: EmailClient, events: EventHub) -> Self {
        Self { db, email, events }
    }

    /// Announce a newly created booking to its owner and to staff.
    pub fn booking_created(&self, booking: &Booking) {
        self.events.publish_booking(
            RealtimeEvent::BookingCreated {
                booking: booking.clone(),
            },
            &booking.user_id,
        );
    }

    /// Run every side effect of a status change; errors are logged only.
    pub async fn booking_status_changed(&self, booking: &Booking, old_status: BookingStatus) {
        self.events.publish_booking(
            RealtimeEvent::BookingStatusChanged {
                booking: booking.clone(),
                old_status,
            },
            &booking.user_id,
        );

        if let Err(e) = self.deliver(booking).await {
            tracing::error!(
                booking_id = %booking.id,
                user_id = %booking.user_id,
                status = %booking.status,
                error = %e,
                "Failed to deliver booking notification"
            );
        }
    }

    /// Status-change side effects for many bookings with bounded concurrency.
    pub async fn bookings_status_changed(&self, changes: Vec<(Booking, BookingStatus)>) {
        stream::iter(changes)
            .for_each_concurrent(MAX_CONCURRENT_NOTIFICATIONS, |(booking, old)| async move {
                self.booking_status_changed(&booking, old).await;
            })
            .await;
    }

    async fn deliver(&self, booking: &Booking) -> Result<()> {
        let resource = resource_details(&self.db, booking).await?;

        let notification = build_notification(booking, &resource.name, crate::time_utils::now());
        self.db.upsert_notification(&notification).await?;
        self.events.publish_notification(notification);

        let Some(profile) = self.db.get_profile(&booking.user_id).await? else {
            tracing::warn!(user_id = %booking.user_id, "Booking owner has no profile, skipping e-mail");
            return Ok(());
        };

        let class_name = match booking.class_id.as_deref() {
            Some(id) => self.db.get_class(id).await?.map(|c| c.name),
            None => None,
        };

        let message = BookingEmail {
            recipient_name: &profile.full_name,
            status: booking.status,
            resource_kind: match booking.resource_type {
                ResourceType::Court => "Court",
                ResourceType::Equipment => "Equipment",
            },
            resource_name: &resource.name,
            date: format_booking_date(booking.start_time),
            time_range: format_time_range(booking.start_time, booking.end_time),
            quantity: booking.quantity,
            class_name: class_name.as_deref(),
        }
        .render();

        self.email.send(&profile.email, &message).await?;
        Ok(())
    }

    /// E-mail a new class code to its representative; errors are logged only.
    pub async fn send_class_code(&self, profile: &Profile, class_name: &str, class_code: &str) {
        let message = class_code_email(&profile.full_name, class_name, class_code);
        if let Err(e) = self.email.send(&profile.email, &message).await {
            tracing::error!(user_id = %profile.user_id, error = %e, "Failed to send class code e-mail");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::BookingType;
    use chrono::{Duration, TimeZone};

    fn booking(status: BookingStatus, resource_type: ResourceType) -> Booking {
        let start = Utc.with_ymd_and_hms(2026, 1, 15, 9, 0, 0).unwrap();
        Booking {
            id: "b1".to_string(),
            user_id: "u1".to_string(),
            class_id: None,
            court_id: Some("c1".to_string()),
            equipment_id: None,
            resource_type,
            booking_type: BookingType::Individual,
            quantity: None,
            start_time: start,
            end_time: start + Duration::hours(1),
            status,
            notes: None,
            created_at: start,
            updated_at: start,
        }
    }

    #[test]
    fn test_build_notification_approved() {
        let b = booking(BookingStatus::Approved, ResourceType::Court);
        let n = build_notification(&b, "Indoor Basketball Court A", Utc::now());
        assert_eq!(n.user_id, "u1");
        assert_eq!(n.kind, NotificationKind::Success);
        assert_eq!(n.title, "Booking Approved");
        assert_eq!(
            n.message,
            "Your court booking for Indoor Basketball Court A on Thursday, January 15, 2026 has been approved."
        );
        assert!(!n.is_read);
    }

    #[test]
    fn test_notification_kinds() {
        assert_eq!(notification_kind(BookingStatus::Rejected), NotificationKind::Error);
        assert_eq!(notification_kind(BookingStatus::Cancelled), NotificationKind::Info);
        assert_eq!(notification_kind(BookingStatus::Completed), NotificationKind::Info);

        let b = booking(BookingStatus::Cancelled, ResourceType::Equipment);
        let n = build_notification(&b, "Cricket Kit", Utc::now());
        assert_eq!(n.title, "Booking Cancelled");
        assert!(n.message.starts_with("Your equipment booking for Cricket Kit"));
        assert!(n.message.ends_with("has been cancelled."));
    }

    #[test]
    fn test_time_range_format() {
        let start = Utc.with_ymd_and_hms(2026, 1, 15, 9, 0, 0).unwrap();
        assert_eq!(
            format_time_range(start, start + Duration::hours(5)),
            "9:00 AM - 2:00 PM"
        );
    }
}
