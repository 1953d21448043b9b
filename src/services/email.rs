// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Outbound e-mail via the Resend HTTP API.
//!
//! Sending is disabled (logged and skipped) when no API key is configured.

use anyhow::Context;
use serde::Serialize;
use std::time::Duration;

use crate::error::AppError;
use crate::models::BookingStatus;

const RESEND_URL: &str = "https://api.resend.com/emails";
/// Upper bound on one Resend API call, connect through response.
const SEND_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Serialize)]
struct SendRequest<'a> {
    from: &'a str,
    to: [&'a str; 1],
    subject: &'a str,
    html: &'a str,
    text: &'a str,
}

/// A rendered message ready to send.
#[derive(Debug, Clone, PartialEq)]
pub struct EmailMessage {
    pub subject: String,
    pub html: String,
    pub text: String,
}

#[derive(Clone)]
pub struct EmailClient {
    http: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
    from: String,
}

impl EmailClient {
    pub fn new(api_key: Option<String>, from: String) -> anyhow::Result<Self> {
        Self::with_endpoint(RESEND_URL.to_string(), SEND_TIMEOUT, api_key, from)
    }

    fn with_endpoint(
        endpoint: String,
        timeout: Duration,
        api_key: Option<String>,
        from: String,
    ) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("failed building e-mail HTTP client")?;
        Ok(Self {
            http,
            endpoint,
            api_key,
            from,
        })
    }

    pub fn is_enabled(&self) -> bool {
        self.api_key.is_some()
    }

    /// Send `message` to `to`. Returns `Ok(false)` when e-mail is disabled.
    pub async fn send(&self, to: &str, message: &EmailMessage) -> Result<bool, AppError> {
        let Some(api_key) = self.api_key.as_deref() else {
            tracing::info!(to, subject = %message.subject, "E-mail disabled, skipping send");
            return Ok(false);
        };

        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(api_key)
            .json(&SendRequest {
                from: &self.from,
                to: [to],
                subject: &message.subject,
                html: &message.html,
                text: &message.text,
            })
            .send()
            .await
            .map_err(|e| AppError::Email(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Email(format!("HTTP {}: {}", status, body)));
        }

        tracing::info!(to, subject = %message.subject, "E-mail sent");
        Ok(true)
    }
}

/// Values shown in a booking status e-mail.
#[derive(Debug, Clone)]
pub struct BookingEmail<'a> {
    pub recipient_name: &'a str,
    pub status: BookingStatus,
    /// "Court" or "Equipment"
    pub resource_kind: &'a str,
    pub resource_name: &'a str,
    /// e.g. "Thursday, January 15, 2026"
    pub date: String,
    /// e.g. "9:00 AM - 10:00 AM"
    pub time_range: String,
    pub quantity: Option<u32>,
    pub class_name: Option<&'a str>,
}

fn escape(raw: &str) -> String {
    raw.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn status_color(status: BookingStatus) -> &'static str {
    match status {
        BookingStatus::Approved => "#22c55e",
        BookingStatus::Rejected => "#ef4444",
        BookingStatus::Completed => "#3b82f6",
        BookingStatus::Pending => "#f59e0b",
        BookingStatus::Cancelled => "#6b7280",
    }
}

fn status_sentence(status: BookingStatus, resource: &str) -> String {
    match status {
        BookingStatus::Approved => {
            format!("Great news! Your booking for {resource} has been approved. You're all set!")
        }
        BookingStatus::Rejected => format!(
            "Unfortunately, your booking for {resource} has been rejected. Please contact \
             administration for more details or try booking a different time slot."
        ),
        BookingStatus::Cancelled => format!("Your booking for {resource} has been cancelled."),
        BookingStatus::Completed => format!(
            "Your booking for {resource} has been marked as completed. Thank you for using our facilities!"
        ),
        BookingStatus::Pending => {
            format!("Your booking for {resource} has been received and is awaiting approval.")
        }
    }
}

impl BookingEmail<'_> {
    pub fn render(&self) -> EmailMessage {
        let subject = format!("Your booking has been {}", self.status.as_str());

        let mut rows = vec![
            (self.resource_kind.to_string(), self.resource_name.to_string()),
            ("Date".to_string(), self.date.clone()),
            ("Time".to_string(), self.time_range.clone()),
        ];
        if let Some(quantity) = self.quantity.filter(|q| *q > 1) {
            rows.push(("Quantity".to_string(), quantity.to_string()));
        }
        if let Some(class_name) = self.class_name {
            rows.push(("Class".to_string(), class_name.to_string()));
        }

        let sentence = status_sentence(self.status, self.resource_name);

        let mut text = format!("Hi {},\n\n{}\n\n", self.recipient_name, sentence);
        for (label, value) in &rows {
            text.push_str(&format!("{label}: {value}\n"));
        }

        let color = status_color(self.status);
        let table: String = rows
            .iter()
            .map(|(label, value)| {
                format!(
                    "<tr><td style=\"padding:8px 0;color:#6b7280;\">{}:</td>\
                     <td style=\"padding:8px 0;color:#111827;font-weight:500;\">{}</td></tr>",
                    escape(label),
                    escape(value)
                )
            })
            .collect();
        let html = format!(
            "<!DOCTYPE html><html><body style=\"font-family:Arial,sans-serif;\">\
             <h1>SquadSync</h1>\
             <p><span style=\"color:{color};font-weight:600;\">{status}</span></p>\
             <p>Hi {name},</p><p>{sentence}</p>\
             <table style=\"width:100%;border-collapse:collapse;\">{table}</table>\
             </body></html>",
            status = self.status.label(),
            name = escape(self.recipient_name),
            sentence = escape(&sentence),
        );

        EmailMessage {
            subject,
            html,
            text,
        }
    }
}

/// Welcome e-mail carrying a newly issued class code.
pub fn class_code_email(recipient_name: &str, class_name: &str, class_code: &str) -> EmailMessage {
    let text = format!(
        "Hi {recipient_name},\n\nYour class {class_name} is registered on SquadSync.\n\
         Class code: {class_code}\n\nSign in with your e-mail, password and this code.\n"
    );
    let html = format!(
        "<!DOCTYPE html><html><body style=\"font-family:Arial,sans-serif;\">\
         <h1>SquadSync</h1><p>Hi {},</p>\
         <p>Your class <strong>{}</strong> is registered.</p>\
         <p style=\"font-size:24px;letter-spacing:4px;font-weight:700;\">{}</p>\
         <p>Sign in with your e-mail, password and this code.</p></body></html>",
        escape(recipient_name),
        escape(class_name),
        escape(class_code)
    );
    EmailMessage {
        subject: "Your SquadSync class code".to_string(),
        html,
        text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(status: BookingStatus, quantity: Option<u32>) -> BookingEmail<'static> {
        BookingEmail {
            recipient_name: "Asha <Rep>",
            status,
            resource_kind: "Equipment",
            resource_name: "Cricket Kit",
            date: "Thursday, January 15, 2026".to_string(),
            time_range: "9:00 AM - 11:00 AM".to_string(),
            quantity,
            class_name: Some("CSE 3A"),
        }
    }

    #[test]
    fn test_booking_email_render() {
        let message = sample(BookingStatus::Approved, Some(3)).render();
        assert_eq!(message.subject, "Your booking has been approved");
        assert!(message.text.contains("Quantity: 3"));
        assert!(message.text.contains("Class: CSE 3A"));
        assert!(message.text.contains("Time: 9:00 AM - 11:00 AM"));
        assert!(message.html.contains("Asha &lt;Rep&gt;"));
        assert!(!message.html.contains("<Rep>"));
        assert!(message.html.contains("#22c55e"));
    }

    #[test]
    fn test_single_quantity_omitted() {
        let message = sample(BookingStatus::Rejected, Some(1)).render();
        assert_eq!(message.subject, "Your booking has been rejected");
        assert!(!message.text.contains("Quantity"));
    }

    #[test]
    fn test_class_code_email() {
        let message = class_code_email("Asha", "CSE 3A", "K7M2PQ9X");
        assert!(message.text.contains("K7M2PQ9X"));
        assert!(message.html.contains("K7M2PQ9X"));
    }

    #[tokio::test]
    async fn test_disabled_client_skips() {
        let client = EmailClient::new(None, "SquadSync <noreply@example.com>".to_string()).unwrap();
        assert!(!client.is_enabled());
        let sent = client
            .send("rep@college.edu", &class_code_email("A", "B", "C"))
            .await
            .unwrap();
        assert!(!sent);
    }

    #[tokio::test]
    async fn test_stalled_api_times_out() {
        // Accepts the connection and never answers.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let _server = tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                held.push(socket);
            }
        });

        let client = EmailClient::with_endpoint(
            format!("http://{addr}/emails"),
            Duration::from_millis(200),
            Some("re_test".to_string()),
            "SquadSync <noreply@example.com>".to_string(),
        )
        .unwrap();

        let started = std::time::Instant::now();
        let result = client
            .send("rep@college.edu", &class_code_email("A", "B", "C"))
            .await;
        assert!(matches!(result, Err(AppError::Email(_))));
        assert!(started.elapsed() < Duration::from_secs(5));
    }
}
