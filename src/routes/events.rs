// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Server-Sent Events stream of booking and notification updates.

use crate::middleware::auth::AuthUser;
use crate::services::events::Envelope;
use crate::AppState;
use axum::{
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
    routing::get,
    Extension, Router,
};
use futures_util::stream::{self, Stream};
use std::convert::Infallible;
use std::sync::Arc;
use tokio::sync::broadcast::{error::RecvError, Receiver};

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/api/events", get(events))
}

fn to_sse(envelope: &Envelope) -> Option<Event> {
    match Event::default()
        .event(envelope.event.name())
        .json_data(&envelope.event)
    {
        Ok(event) => Some(event),
        Err(e) => {
            tracing::warn!(error = %e, event = envelope.event.name(), "Failed to encode SSE event");
            None
        }
    }
}

/// Wait for the next event this user may see.
async fn next_visible(rx: &mut Receiver<Envelope>, user: &AuthUser) -> Option<Event> {
    loop {
        match rx.recv().await {
            Ok(envelope) if envelope.is_visible_to(&user.user_id, user.role) => {
                if let Some(event) = to_sse(&envelope) {
                    return Some(event);
                }
            }
            Ok(_) => {}
            Err(RecvError::Lagged(skipped)) => {
                tracing::warn!(user_id = %user.user_id, skipped, "SSE subscriber lagged");
            }
            Err(RecvError::Closed) => return None,
        }
    }
}

async fn events(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    tracing::debug!(user_id = %user.user_id, "SSE subscriber connected");
    let rx = state.events.subscribe();

    let stream = stream::unfold((rx, user), |(mut rx, user)| async move {
        let event = next_visible(&mut rx, &user).await?;
        Some((Ok(event), (rx, user)))
    });

    Sse::new(stream).keep_alive(KeepAlive::default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Notification, NotificationKind, Role};
    use crate::services::events::EventHub;
    use chrono::Utc;

    fn notification(user_id: &str) -> Notification {
        Notification {
            id: format!("n-{user_id}"),
            user_id: user_id.to_string(),
            kind: NotificationKind::Info,
            title: "Booking Cancelled".to_string(),
            message: "Your booking has been cancelled.".to_string(),
            is_read: false,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_next_visible_skips_other_users() {
        let hub = EventHub::new();
        let mut rx = hub.subscribe();
        hub.publish_notification(notification("someone-else"));
        hub.publish_notification(notification("u1"));

        let user = AuthUser {
            user_id: "u1".to_string(),
            role: Role::Student,
        };
        assert!(next_visible(&mut rx, &user).await.is_some());
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_next_visible_ends_when_hub_dropped() {
        let hub = EventHub::new();
        let mut rx = hub.subscribe();
        drop(hub);

        let user = AuthUser {
            user_id: "u1".to_string(),
            role: Role::Admin,
        };
        assert!(next_visible(&mut rx, &user).await.is_none());
    }
}
