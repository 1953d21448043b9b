// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore client wrapper with typed operations.
//!
//! Provides high-level operations for:
//! - Profiles and credentials (accounts)
//! - Classes, courts and equipment (resources)
//! - Bookings and their status history
//! - Notifications, time blocks and equipment issues
//!
//! Timestamps are stored as whole-second RFC 3339 strings, so range
//! filters compare them as strings.

use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Serialize};

use crate::db::collections;
use crate::error::AppError;
use crate::models::{
    BlockScope, Booking, BookingStatus, Class, Court, Credentials, Equipment, EquipmentIssue,
    Notification, Profile, ResourceType, StatusChange, TimeBlock,
};
use crate::time_utils::format_utc_rfc3339;

// Firestore limits batch/transaction writes to 500 operations.
// We use a safe limit of 400 to allow headroom.
const BATCH_SIZE: usize = 400;

/// Filters for the staff booking listing.
#[derive(Debug, Clone, Default)]
pub struct BookingFilter {
    pub status: Option<BookingStatus>,
    pub resource_type: Option<ResourceType>,
    pub user_id: Option<String>,
}

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreDb {
    client: Option<firestore::FirestoreDb>,
}

impl FirestoreDb {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self, AppError> {
        // The emulator needs an unauthenticated connection; skip local credentials.
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self, AppError> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            AppError::Database(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a mock Firestore client for testing (offline mode).
    ///
    /// All database operations will return an error if called.
    pub fn new_mock() -> Self {
        Self { client: None }
    }

    /// Helper to get the client or return an error if offline.
    fn get_client(&self) -> Result<&firestore::FirestoreDb, AppError> {
        self.client
            .as_ref()
            .ok_or_else(|| AppError::Database("Database not connected (offline mode)".to_string()))
    }

    // ─── Generic Document Helpers ────────────────────────────────

    async fn get_doc<T>(&self, collection: &str, id: &str) -> Result<Option<T>, AppError>
    where
        T: DeserializeOwned + Send,
    {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collection)
            .obj()
            .one(id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn set_doc<T>(&self, collection: &str, id: &str, doc: &T) -> Result<(), AppError>
    where
        T: Serialize + DeserializeOwned + Sync + Send,
    {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collection)
            .document_id(id)
            .object(doc)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    async fn delete_doc(&self, collection: &str, id: &str) -> Result<(), AppError> {
        self.get_client()?
            .fluent()
            .delete()
            .from(collection)
            .document_id(id)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    // ─── Profile & Credential Operations ─────────────────────────

    pub async fn get_profile(&self, user_id: &str) -> Result<Option<Profile>, AppError> {
        self.get_doc(collections::PROFILES, user_id).await
    }

    pub async fn upsert_profile(&self, profile: &Profile) -> Result<(), AppError> {
        self.set_doc(collections::PROFILES, &profile.user_id, profile)
            .await
    }

    /// All profiles, ordered by name.
    pub async fn list_profiles(&self) -> Result<Vec<Profile>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .from(collections::PROFILES)
            .order_by([("full_name", firestore::FirestoreQueryDirection::Ascending)])
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Look up credentials by (normalized) e-mail.
    pub async fn get_credentials(&self, email: &str) -> Result<Option<Credentials>, AppError> {
        self.get_doc(collections::CREDENTIALS, &credential_doc_id(email))
            .await
    }

    pub async fn set_credentials(&self, credentials: &Credentials) -> Result<(), AppError> {
        self.set_doc(
            collections::CREDENTIALS,
            &credential_doc_id(&credentials.email),
            credentials,
        )
        .await
    }

    // ─── Class Operations ────────────────────────────────────────

    pub async fn get_class(&self, id: &str) -> Result<Option<Class>, AppError> {
        self.get_doc(collections::CLASSES, id).await
    }

    /// Find a class by its (upper-case) login code.
    pub async fn get_class_by_code(&self, code: &str) -> Result<Option<Class>, AppError> {
        let classes: Vec<Class> = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::CLASSES)
            .filter(|q| q.for_all([q.field("class_code").eq(code)]))
            .limit(1)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(classes.into_iter().next())
    }

    pub async fn upsert_class(&self, class: &Class) -> Result<(), AppError> {
        self.set_doc(collections::CLASSES, &class.id, class).await
    }

    pub async fn list_classes(&self) -> Result<Vec<Class>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .from(collections::CLASSES)
            .order_by([("name", firestore::FirestoreQueryDirection::Ascending)])
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a representative's profile, credentials and class together.
    pub async fn register_class_atomic(
        &self,
        profile: &Profile,
        credentials: &Credentials,
        class: &Class,
    ) -> Result<(), AppError> {
        let client = self.get_client()?;
        let mut transaction = client
            .begin_transaction()
            .await
            .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;

        client
            .fluent()
            .update()
            .in_col(collections::CLASSES)
            .document_id(&class.id)
            .object(class)
            .add_to_transaction(&mut transaction)
            .map_err(|e| AppError::Database(format!("Failed to add class to transaction: {}", e)))?;

        client
            .fluent()
            .update()
            .in_col(collections::PROFILES)
            .document_id(&profile.user_id)
            .object(profile)
            .add_to_transaction(&mut transaction)
            .map_err(|e| {
                AppError::Database(format!("Failed to add profile to transaction: {}", e))
            })?;

        client
            .fluent()
            .update()
            .in_col(collections::CREDENTIALS)
            .document_id(credential_doc_id(&credentials.email))
            .object(credentials)
            .add_to_transaction(&mut transaction)
            .map_err(|e| {
                AppError::Database(format!("Failed to add credentials to transaction: {}", e))
            })?;

        transaction
            .commit()
            .await
            .map_err(|e| AppError::Database(format!("Transaction commit failed: {}", e)))?;

        tracing::info!(
            class_id = %class.id,
            user_id = %profile.user_id,
            "Class registered atomically"
        );
        Ok(())
    }

    // ─── Court Operations ────────────────────────────────────────

    pub async fn get_court(&self, id: &str) -> Result<Option<Court>, AppError> {
        self.get_doc(collections::COURTS, id).await
    }

    pub async fn list_courts(&self) -> Result<Vec<Court>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .from(collections::COURTS)
            .order_by([("name", firestore::FirestoreQueryDirection::Ascending)])
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    pub async fn upsert_court(&self, court: &Court) -> Result<(), AppError> {
        self.set_doc(collections::COURTS, &court.id, court).await
    }

    pub async fn delete_court(&self, id: &str) -> Result<(), AppError> {
        self.delete_doc(collections::COURTS, id).await
    }

    // ─── Equipment Operations ────────────────────────────────────

    pub async fn get_equipment(&self, id: &str) -> Result<Option<Equipment>, AppError> {
        self.get_doc(collections::EQUIPMENT, id).await
    }

    pub async fn list_equipment(&self) -> Result<Vec<Equipment>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .from(collections::EQUIPMENT)
            .order_by([("name", firestore::FirestoreQueryDirection::Ascending)])
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    pub async fn upsert_equipment(&self, equipment: &Equipment) -> Result<(), AppError> {
        self.set_doc(collections::EQUIPMENT, &equipment.id, equipment)
            .await
    }

    // ─── Booking Operations ──────────────────────────────────────

    pub async fn get_booking(&self, id: &str) -> Result<Option<Booking>, AppError> {
        self.get_doc(collections::BOOKINGS, id).await
    }

    /// A user's bookings, earliest start first.
    pub async fn list_bookings_for_user(&self, user_id: &str) -> Result<Vec<Booking>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .from(collections::BOOKINGS)
            .filter(|q| q.for_all([q.field("user_id").eq(user_id)]))
            .order_by([("start_time", firestore::FirestoreQueryDirection::Ascending)])
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Bookings of one court or equipment item that may overlap `[from, to)`.
    ///
    /// Firestore allows a range filter on one field only, so the end bound
    /// is applied here after the query.
    pub async fn list_bookings_for_resource(
        &self,
        resource_type: ResourceType,
        resource_id: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Booking>, AppError> {
        let field = match resource_type {
            ResourceType::Court => "court_id",
            ResourceType::Equipment => "equipment_id",
        };
        let to_str = format_utc_rfc3339(to);

        let bookings: Vec<Booking> = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::BOOKINGS)
            .filter(|q| {
                q.for_all([
                    q.field(field).eq(resource_id),
                    q.field("start_time").less_than(to_str.as_str()),
                ])
            })
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(bookings.into_iter().filter(|b| b.end_time > from).collect())
    }

    /// Bookings starting in `[from, to)`.
    pub async fn list_bookings_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Booking>, AppError> {
        let from_str = format_utc_rfc3339(from);
        let to_str = format_utc_rfc3339(to);
        self.get_client()?
            .fluent()
            .select()
            .from(collections::BOOKINGS)
            .filter(|q| {
                q.for_all([
                    q.field("start_time").greater_than_or_equal(from_str.as_str()),
                    q.field("start_time").less_than(to_str.as_str()),
                ])
            })
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Every booking (dashboard counters).
    pub async fn list_all_bookings(&self) -> Result<Vec<Booking>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .from(collections::BOOKINGS)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Staff listing, newest first.
    pub async fn list_bookings(
        &self,
        filter: &BookingFilter,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<Booking>, AppError> {
        let status = filter.status.map(BookingStatus::as_str);
        let resource_type = filter.resource_type.map(ResourceType::as_str);
        let user_id = filter.user_id.as_deref();

        self.get_client()?
            .fluent()
            .select()
            .from(collections::BOOKINGS)
            .filter(|q| {
                q.for_all([
                    status.and_then(|s| q.field("status").eq(s)),
                    resource_type.and_then(|r| q.field("resource_type").eq(r)),
                    user_id.and_then(|u| q.field("user_id").eq(u)),
                ])
            })
            .order_by([("created_at", firestore::FirestoreQueryDirection::Descending)])
            .limit(limit)
            .offset(offset)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Bookings whose ID starts with `prefix` (pass codes).
    pub async fn find_bookings_by_id_prefix(&self, prefix: &str) -> Result<Vec<Booking>, AppError> {
        let upper = format!("{}\u{f8ff}", prefix);
        self.get_client()?
            .fluent()
            .select()
            .from(collections::BOOKINGS)
            .filter(|q| {
                q.for_all([
                    q.field("id").greater_than_or_equal(prefix),
                    q.field("id").less_than(upper.as_str()),
                ])
            })
            .limit(2)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Write a booking and one status-history row atomically.
    ///
    /// Used for creation (history row with no old status) and for every
    /// status transition.
    pub async fn save_booking_with_history(
        &self,
        booking: &Booking,
        change: &StatusChange,
    ) -> Result<(), AppError> {
        let client = self.get_client()?;
        let mut transaction = client
            .begin_transaction()
            .await
            .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;

        client
            .fluent()
            .update()
            .in_col(collections::BOOKINGS)
            .document_id(&booking.id)
            .object(booking)
            .add_to_transaction(&mut transaction)
            .map_err(|e| {
                AppError::Database(format!("Failed to add booking to transaction: {}", e))
            })?;

        client
            .fluent()
            .update()
            .in_col(collections::BOOKING_STATUS_HISTORY)
            .document_id(&change.id)
            .object(change)
            .add_to_transaction(&mut transaction)
            .map_err(|e| {
                AppError::Database(format!("Failed to add history to transaction: {}", e))
            })?;

        transaction
            .commit()
            .await
            .map_err(|e| AppError::Database(format!("Transaction commit failed: {}", e)))?;

        tracing::debug!(
            booking_id = %booking.id,
            status = %booking.status,
            "Booking and history written atomically"
        );
        Ok(())
    }

    /// Status history of a booking, oldest first.
    pub async fn list_status_history(
        &self,
        booking_id: &str,
    ) -> Result<Vec<StatusChange>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .from(collections::BOOKING_STATUS_HISTORY)
            .filter(|q| q.for_all([q.field("booking_id").eq(booking_id)]))
            .order_by([("changed_at", firestore::FirestoreQueryDirection::Ascending)])
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    // ─── Notification Operations ─────────────────────────────────

    pub async fn get_notification(&self, id: &str) -> Result<Option<Notification>, AppError> {
        self.get_doc(collections::NOTIFICATIONS, id).await
    }

    pub async fn upsert_notification(&self, notification: &Notification) -> Result<(), AppError> {
        self.set_doc(collections::NOTIFICATIONS, &notification.id, notification)
            .await
    }

    /// A user's notifications, newest first.
    pub async fn list_notifications(
        &self,
        user_id: &str,
        unread_only: bool,
        limit: u32,
    ) -> Result<Vec<Notification>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .from(collections::NOTIFICATIONS)
            .filter(|q| {
                q.for_all([
                    q.field("user_id").eq(user_id),
                    unread_only.then(|| q.field("is_read").eq(false)).flatten(),
                ])
            })
            .order_by([("created_at", firestore::FirestoreQueryDirection::Descending)])
            .limit(limit)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Mark every unread notification of a user as read.
    ///
    /// Returns the number of notifications updated.
    pub async fn mark_all_notifications_read(&self, user_id: &str) -> Result<usize, AppError> {
        let unread: Vec<Notification> = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::NOTIFICATIONS)
            .filter(|q| {
                q.for_all([
                    q.field("user_id").eq(user_id),
                    q.field("is_read").eq(false),
                ])
            })
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let updated: Vec<Notification> = unread
            .into_iter()
            .map(|mut n| {
                n.is_read = true;
                n
            })
            .collect();

        self.batch_upsert(&updated, collections::NOTIFICATIONS, |n: &Notification| {
            n.id.clone()
        })
        .await?;

        Ok(updated.len())
    }

    // ─── Time Block Operations ───────────────────────────────────

    pub async fn get_time_block(&self, id: &str) -> Result<Option<TimeBlock>, AppError> {
        self.get_doc(collections::TIME_BLOCKS, id).await
    }

    pub async fn upsert_time_block(&self, block: &TimeBlock) -> Result<(), AppError> {
        self.set_doc(collections::TIME_BLOCKS, &block.id, block).await
    }

    pub async fn delete_time_block(&self, id: &str) -> Result<(), AppError> {
        self.delete_doc(collections::TIME_BLOCKS, id).await
    }

    /// Time blocks, optionally of one scope, by start time.
    pub async fn list_time_blocks(
        &self,
        scope: Option<BlockScope>,
    ) -> Result<Vec<TimeBlock>, AppError> {
        let scope = scope.map(BlockScope::as_str);
        self.get_client()?
            .fluent()
            .select()
            .from(collections::TIME_BLOCKS)
            .filter(|q| q.for_all([scope.and_then(|s| q.field("scope").eq(s))]))
            .order_by([("start_time", firestore::FirestoreQueryDirection::Ascending)])
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Blocks (of any scope) that may overlap `[from, to)`.
    pub async fn list_time_blocks_overlapping(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<TimeBlock>, AppError> {
        let to_str = format_utc_rfc3339(to);
        let blocks: Vec<TimeBlock> = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::TIME_BLOCKS)
            .filter(|q| q.for_all([q.field("start_time").less_than(to_str.as_str())]))
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(blocks.into_iter().filter(|b| b.end_time > from).collect())
    }

    // ─── Equipment Issue Operations ──────────────────────────────

    pub async fn get_issue(&self, id: &str) -> Result<Option<EquipmentIssue>, AppError> {
        self.get_doc(collections::EQUIPMENT_ISSUES, id).await
    }

    /// The issue record for a booking, if items were handed out.
    pub async fn get_issue_for_booking(
        &self,
        booking_id: &str,
    ) -> Result<Option<EquipmentIssue>, AppError> {
        let issues: Vec<EquipmentIssue> = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::EQUIPMENT_ISSUES)
            .filter(|q| q.for_all([q.field("booking_id").eq(booking_id)]))
            .limit(1)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(issues.into_iter().next())
    }

    pub async fn list_issues_for_user(
        &self,
        user_id: &str,
    ) -> Result<Vec<EquipmentIssue>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .from(collections::EQUIPMENT_ISSUES)
            .filter(|q| q.for_all([q.field("user_id").eq(user_id)]))
            .order_by([("issued_at", firestore::FirestoreQueryDirection::Descending)])
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Issue records not yet returned, newest first.
    pub async fn list_outstanding_issues(&self) -> Result<Vec<EquipmentIssue>, AppError> {
        let issues: Vec<EquipmentIssue> = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::EQUIPMENT_ISSUES)
            .order_by([("issued_at", firestore::FirestoreQueryDirection::Descending)])
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(issues.into_iter().filter(EquipmentIssue::is_outstanding).collect())
    }

    /// Record a hand-out and the stock decrement together.
    pub async fn issue_equipment_atomic(
        &self,
        issue: &EquipmentIssue,
        equipment: &Equipment,
    ) -> Result<(), AppError> {
        let client = self.get_client()?;
        let mut transaction = client
            .begin_transaction()
            .await
            .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;

        client
            .fluent()
            .update()
            .in_col(collections::EQUIPMENT_ISSUES)
            .document_id(&issue.id)
            .object(issue)
            .add_to_transaction(&mut transaction)
            .map_err(|e| AppError::Database(format!("Failed to add issue to transaction: {}", e)))?;

        client
            .fluent()
            .update()
            .in_col(collections::EQUIPMENT)
            .document_id(&equipment.id)
            .object(equipment)
            .add_to_transaction(&mut transaction)
            .map_err(|e| {
                AppError::Database(format!("Failed to add equipment to transaction: {}", e))
            })?;

        transaction
            .commit()
            .await
            .map_err(|e| AppError::Database(format!("Transaction commit failed: {}", e)))?;

        Ok(())
    }

    /// Record a return: issue, stock, completed booking and its history row.
    pub async fn return_equipment_atomic(
        &self,
        issue: &EquipmentIssue,
        equipment: &Equipment,
        booking: &Booking,
        change: &StatusChange,
    ) -> Result<(), AppError> {
        let client = self.get_client()?;
        let mut transaction = client
            .begin_transaction()
            .await
            .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;

        client
            .fluent()
            .update()
            .in_col(collections::EQUIPMENT_ISSUES)
            .document_id(&issue.id)
            .object(issue)
            .add_to_transaction(&mut transaction)
            .map_err(|e| AppError::Database(format!("Failed to add issue to transaction: {}", e)))?;

        client
            .fluent()
            .update()
            .in_col(collections::EQUIPMENT)
            .document_id(&equipment.id)
            .object(equipment)
            .add_to_transaction(&mut transaction)
            .map_err(|e| {
                AppError::Database(format!("Failed to add equipment to transaction: {}", e))
            })?;

        client
            .fluent()
            .update()
            .in_col(collections::BOOKINGS)
            .document_id(&booking.id)
            .object(booking)
            .add_to_transaction(&mut transaction)
            .map_err(|e| {
                AppError::Database(format!("Failed to add booking to transaction: {}", e))
            })?;

        client
            .fluent()
            .update()
            .in_col(collections::BOOKING_STATUS_HISTORY)
            .document_id(&change.id)
            .object(change)
            .add_to_transaction(&mut transaction)
            .map_err(|e| {
                AppError::Database(format!("Failed to add history to transaction: {}", e))
            })?;

        transaction
            .commit()
            .await
            .map_err(|e| AppError::Database(format!("Transaction commit failed: {}", e)))?;

        Ok(())
    }

    // ─── Helper Methods ────────────────────────────────────────────

    /// Helper to batch upsert documents using transactions.
    async fn batch_upsert<T, F>(
        &self,
        items: &[T],
        collection: &str,
        id_extractor: F,
    ) -> Result<(), AppError>
    where
        T: Serialize + DeserializeOwned + Sync + Send,
        F: Fn(&T) -> String,
    {
        let client = self.get_client()?;

        for chunk in items.chunks(BATCH_SIZE) {
            let mut transaction = client
                .begin_transaction()
                .await
                .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;

            for item in chunk {
                let doc_id = id_extractor(item);
                client
                    .fluent()
                    .update()
                    .in_col(collection)
                    .document_id(&doc_id)
                    .object(item)
                    .add_to_transaction(&mut transaction)
                    .map_err(|e| {
                        AppError::Database(format!(
                            "Failed to add update to transaction for {}: {}",
                            collection, e
                        ))
                    })?;
            }

            transaction.commit().await.map_err(|e| {
                AppError::Database(format!("Failed to commit batch update: {}", e))
            })?;
        }

        Ok(())
    }
}

/// Document ID for a credentials record.
fn credential_doc_id(email: &str) -> String {
    urlencoding::encode(&crate::models::user::normalize_email(email)).into_owned()
}
