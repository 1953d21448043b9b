// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! SquadSync API Server
//!
//! Campus sports facility booking: class representatives request courts
//! and equipment, staff approve them, admins run the inventory.

use squadsync::{config::Config, db::FirestoreDb, AppState};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging for GCP
    init_logging()?;

    // Load configuration from environment
    let config = Config::from_env()?;
    tracing::info!(
        port = config.port,
        open_hour = config.schedule.open_hour,
        close_hour = config.schedule.close_hour,
        email_enabled = config.resend_api_key.is_some(),
        "Starting SquadSync API"
    );

    // Initialize Firestore database
    let db = FirestoreDb::new(&config.gcp_project_id).await?;

    let state = Arc::new(AppState::new(config.clone(), db)?);

    // Ensure the bootstrap admin account exists
    match (&config.admin_email, &config.admin_password) {
        (Some(email), Some(password)) => {
            if let Err(e) = state.accounts.bootstrap_admin(email, password).await {
                tracing::error!(error = %e, "Failed to bootstrap admin account");
            }
        }
        (Some(_), None) | (None, Some(_)) => {
            tracing::warn!("ADMIN_EMAIL and ADMIN_PASSWORD must both be set to bootstrap an admin");
        }
        (None, None) => {}
    }

    // Build router
    let app = squadsync::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging (GCP-compliant).
fn init_logging() -> Result<(), Box<dyn std::error::Error>> {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("squadsync=debug".parse()?)
                .add_directive("info".parse()?),
        )
        .with(format)
        .init();
    Ok(())
}
