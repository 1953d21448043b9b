//! Application configuration loaded from environment variables.
//!
//! Secrets are injected as environment variables by the deployment and read
//! once at startup.

use crate::services::availability::SlotSchedule;
use std::env;
use std::str::FromStr;

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    // --- Environment Variables (non-sensitive) ---
    /// Frontend URL (CORS origin and links in e-mails)
    pub frontend_url: String,
    /// GCP project ID (Firestore)
    pub gcp_project_id: String,
    /// Server port
    pub port: u16,
    /// Sender address for outbound e-mail
    pub email_from: String,

    // --- Booking policy ---
    /// Daily slot grid used for availability and booking windows
    pub schedule: SlotSchedule,
    /// Longest single booking, in hours
    pub max_booking_hours: i64,
    /// Fee charged per started hour of late equipment return
    pub late_fee_per_hour: f64,
    /// Equipment with fewer items on the shelf counts as low stock
    pub low_stock_threshold: u32,

    // --- Secrets ---
    /// JWT signing key for session tokens (raw bytes)
    pub jwt_signing_key: Vec<u8>,
    /// HMAC key for booking pass signatures
    pub pass_signing_key: Vec<u8>,
    /// Resend API key; e-mail is disabled when absent
    pub resend_api_key: Option<String>,
    /// Bootstrap administrator credentials
    pub admin_email: Option<String>,
    pub admin_password: Option<String>,
}

impl Config {
    /// Config for tests: no e-mail, default schedule, fixed keys.
    pub fn test_default() -> Self {
        Self {
            frontend_url: "http://localhost:5173".to_string(),
            gcp_project_id: "test-project".to_string(),
            port: 8080,
            email_from: "SquadSync <onboarding@resend.dev>".to_string(),
            schedule: SlotSchedule::default(),
            max_booking_hours: 4,
            late_fee_per_hour: 10.0,
            low_stock_threshold: 3,
            jwt_signing_key: b"test_jwt_key_32_bytes_minimum!!".to_vec(),
            pass_signing_key: b"test_pass_key_32_bytes_minimum!".to_vec(),
            resend_api_key: None,
            admin_email: None,
            admin_password: None,
        }
    }

    /// Load configuration from environment variables.
    ///
    /// A `.env` file is honored for local development.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let schedule = SlotSchedule {
            open_hour: parse_or("SLOT_OPEN_HOUR", 6)?,
            close_hour: parse_or("SLOT_CLOSE_HOUR", 21)?,
            slot_minutes: parse_or("SLOT_MINUTES", 60)?,
        };
        schedule
            .validate()
            .map_err(|reason| ConfigError::Invalid("SLOT_*", reason))?;

        Ok(Self {
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:5173".to_string()),
            gcp_project_id: env::var("GCP_PROJECT_ID").unwrap_or_else(|_| "local-dev".to_string()),
            port: parse_or("PORT", 8080)?,
            email_from: env::var("EMAIL_FROM")
                .unwrap_or_else(|_| "SquadSync <onboarding@resend.dev>".to_string()),

            schedule,
            max_booking_hours: booking_hours(parse_or("MAX_BOOKING_HOURS", 4)?)?,
            late_fee_per_hour: parse_or("LATE_FEE_PER_HOUR", 10.0)?,
            low_stock_threshold: parse_or("LOW_STOCK_THRESHOLD", 3)?,

            jwt_signing_key: required("JWT_SIGNING_KEY")?.into_bytes(),
            pass_signing_key: required("PASS_SIGNING_KEY")?.into_bytes(),
            resend_api_key: optional("RESEND_API_KEY"),
            admin_email: optional("ADMIN_EMAIL"),
            admin_password: optional("ADMIN_PASSWORD"),
        })
    }
}

fn required(name: &'static str) -> Result<String, ConfigError> {
    env::var(name)
        .map(|v| v.trim().to_string())
        .map_err(|_| ConfigError::Missing(name))
}

fn optional(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_or<T: FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid(name, format!("cannot parse {:?}", raw))),
        Err(_) => Ok(default),
    }
}

/// A booking may span at most one day.
fn booking_hours(hours: i64) -> Result<i64, ConfigError> {
    if (1..=24).contains(&hours) {
        Ok(hours)
    } else {
        Err(ConfigError::Invalid(
            "MAX_BOOKING_HOURS",
            format!("{hours} is outside 1..=24"),
        ))
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {0}: {1}")]
    Invalid(&'static str, String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_from_env() {
        // Set required env vars for test
        env::set_var("JWT_SIGNING_KEY", "test_jwt_key_32_bytes_minimum!!");
        env::set_var("PASS_SIGNING_KEY", " test_pass_key \n");
        env::set_var("SLOT_MINUTES", "30");

        let config = Config::from_env().expect("Config should load");

        assert_eq!(config.pass_signing_key, b"test_pass_key".to_vec());
        assert_eq!(config.schedule.slot_minutes, 30);
        assert_eq!(config.schedule.open_hour, 6);
        assert_eq!(config.max_booking_hours, 4);

        env::remove_var("SLOT_MINUTES");
    }

    #[test]
    fn test_parse_or_rejects_garbage() {
        env::set_var("SQUADSYNC_TEST_GARBAGE", "not-a-number");
        let err = parse_or::<u32>("SQUADSYNC_TEST_GARBAGE", 1).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid("SQUADSYNC_TEST_GARBAGE", _)));
    }

    #[test]
    fn test_booking_hours_bounded() {
        assert_eq!(booking_hours(1).unwrap(), 1);
        assert_eq!(booking_hours(24).unwrap(), 24);
        for bad in [0, -3, 25, i64::MAX] {
            assert!(matches!(
                booking_hours(bad),
                Err(ConfigError::Invalid("MAX_BOOKING_HOURS", _))
            ));
        }
    }
}
