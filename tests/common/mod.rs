// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use chrono::{DateTime, Utc};
use squadsync::config::Config;
use squadsync::db::FirestoreDb;
use squadsync::middleware::auth::create_jwt;
use squadsync::models::{AccountStatus, Profile, Role};
use squadsync::routes::create_router;
use squadsync::AppState;
use std::sync::Arc;

/// Check if emulator is available via environment variable.
#[allow(dead_code)]
pub fn emulator_available() -> bool {
    std::env::var("FIRESTORE_EMULATOR_HOST").is_ok()
}

/// Skip test with message if emulator not available.
#[macro_export]
macro_rules! require_emulator {
    () => {
        if !crate::common::emulator_available() {
            eprintln!("⚠️  Skipping: FIRESTORE_EMULATOR_HOST not set");
            return;
        }
    };
}

/// Create a test database connection.
#[allow(dead_code)]
pub async fn test_db() -> FirestoreDb {
    FirestoreDb::new("test-project")
        .await
        .expect("Failed to connect to Firestore emulator")
}

/// Create a mock database connection (offline).
#[allow(dead_code)]
pub fn test_db_offline() -> FirestoreDb {
    FirestoreDb::new_mock()
}

/// Create a test app with offline mock dependencies.
/// Returns the router and the shared state.
#[allow(dead_code)]
pub fn create_test_app() -> (axum::Router, Arc<AppState>) {
    create_test_app_with_config(Config::test_default())
}

#[allow(dead_code)]
pub fn create_test_app_with_frontend_url(frontend_url: &str) -> (axum::Router, Arc<AppState>) {
    let mut config = Config::test_default();
    config.frontend_url = frontend_url.to_string();
    create_test_app_with_config(config)
}

fn create_test_app_with_config(config: Config) -> (axum::Router, Arc<AppState>) {
    let state = Arc::new(AppState::new(config, test_db_offline()).expect("Failed to build app state"));
    (create_router(state.clone()), state)
}

/// Session token for a user with the given role.
#[allow(dead_code)]
pub fn create_test_jwt(user_id: &str, role: Role, signing_key: &[u8]) -> String {
    create_jwt(user_id, role, signing_key).expect("Failed to create JWT")
}

/// Cache an account's profile the way a successful login does.
#[allow(dead_code)]
pub fn remember_account(state: &AppState, user_id: &str, role: Role, status: AccountStatus) {
    let now = Utc::now();
    state.sessions.remember(
        &Profile {
            user_id: user_id.to_string(),
            email: format!("{}@college.edu", user_id),
            full_name: "Test User".to_string(),
            phone: None,
            student_id: None,
            class_id: None,
            is_representative: false,
            role,
            status,
            created_at: now,
            updated_at: now,
        },
        now,
    );
}

/// Token for an active account with `role`, as issued at login.
#[allow(dead_code)]
pub fn sign_in(state: &AppState, user_id: &str, role: Role) -> String {
    remember_account(state, user_id, role, AccountStatus::Active);
    create_test_jwt(user_id, role, &state.config.jwt_signing_key)
}

/// Parse an RFC3339 timestamp in test fixtures.
#[allow(dead_code)]
pub fn parse_time(raw: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(raw)
        .expect("invalid test timestamp")
        .with_timezone(&Utc)
}
