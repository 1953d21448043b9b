// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Equipment hand-out, return and stock summary.

use serde::Serialize;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use crate::db::FirestoreDb;
use crate::error::{AppError, Result};
use crate::models::equipment::late_fee;
use crate::models::{
    BookingStatus, Equipment, EquipmentCondition, EquipmentIssue, ResourceType, ReturnCondition,
};
use crate::services::booking::{check_transition, history_row};
use crate::services::notification::Notifier;
use crate::time_utils::now;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct InventorySummary {
    pub total_items: u32,
    pub available_items: u32,
    pub issued_items: u32,
    /// Kinds of equipment needing attention or in maintenance
    pub needs_attention: u32,
    /// Kinds of equipment below the low-stock threshold
    pub low_stock: u32,
}

impl InventorySummary {
    pub fn compute(equipment: &[Equipment], low_stock_threshold: u32) -> Self {
        Self {
            total_items: equipment.iter().map(|e| e.total_quantity).sum(),
            available_items: equipment.iter().map(|e| e.available_quantity).sum(),
            issued_items: equipment.iter().map(Equipment::issued_quantity).sum(),
            needs_attention: equipment
                .iter()
                .filter(|e| {
                    matches!(
                        e.condition,
                        EquipmentCondition::NeedsAttention | EquipmentCondition::Maintenance
                    )
                })
                .count() as u32,
            low_stock: equipment
                .iter()
                .filter(|e| e.available_quantity < low_stock_threshold)
                .count() as u32,
        }
    }
}

/// Desk operations on physical equipment.
#[derive(Clone)]
pub struct InventoryService {
    db: FirestoreDb,
    notifier: Notifier,
    late_fee_per_hour: f64,
}

impl InventoryService {
    pub fn new(db: FirestoreDb, notifier: Notifier, late_fee_per_hour: f64) -> Self {
        Self {
            db,
            notifier,
            late_fee_per_hour,
        }
    }

    /// Hand out the items of an approved equipment booking.
    pub async fn issue(&self, booking_id: &str, notes: Option<String>) -> Result<EquipmentIssue> {
        let booking = self
            .db
            .get_booking(booking_id)
            .await?
            .ok_or_else(|| AppError::NotFound("booking".to_string()))?;

        if booking.resource_type != ResourceType::Equipment {
            return Err(AppError::BadRequest(
                "only equipment bookings can be issued".to_string(),
            ));
        }
        if booking.status != BookingStatus::Approved {
            return Err(AppError::Conflict(
                "only approved bookings can be issued".to_string(),
            ));
        }
        if self.db.get_issue_for_booking(booking_id).await?.is_some() {
            return Err(AppError::Conflict(
                "equipment already issued for this booking".to_string(),
            ));
        }

        let equipment_id = booking
            .equipment_id
            .as_deref()
            .ok_or_else(|| AppError::BadRequest("booking has no equipment".to_string()))?;
        let mut equipment = self
            .db
            .get_equipment(equipment_id)
            .await?
            .ok_or_else(|| AppError::NotFound("equipment".to_string()))?;

        let quantity = booking.quantity.unwrap_or(1);
        if quantity > equipment.available_quantity {
            return Err(AppError::Conflict(format!(
                "only {} on the shelf",
                equipment.available_quantity
            )));
        }

        let at = now();
        equipment.available_quantity -= quantity;
        equipment.updated_at = at;

        let issue = EquipmentIssue {
            id: uuid::Uuid::new_v4().to_string(),
            booking_id: booking.id.clone(),
            equipment_id: equipment.id.clone(),
            user_id: booking.user_id.clone(),
            quantity,
            issued_at: at,
            due_at: booking.end_time,
            returned_at: None,
            return_condition: None,
            delay_fee: None,
            notes,
        };
        self.db.issue_equipment_atomic(&issue, &equipment).await?;

        tracing::info!(
            booking_id = %booking.id,
            equipment_id = %equipment.id,
            quantity,
            "Equipment issued"
        );
        Ok(issue)
    }

    /// Take items back, charge any late fee and complete the booking.
    pub async fn return_items(
        &self,
        actor_id: &str,
        issue_id: &str,
        condition: ReturnCondition,
        notes: Option<String>,
    ) -> Result<EquipmentIssue> {
        let mut issue = self
            .db
            .get_issue(issue_id)
            .await?
            .ok_or_else(|| AppError::NotFound("issue".to_string()))?;
        if !issue.is_outstanding() {
            return Err(AppError::Conflict("items already returned".to_string()));
        }

        let mut booking = self
            .db
            .get_booking(&issue.booking_id)
            .await?
            .ok_or_else(|| AppError::NotFound("booking".to_string()))?;
        check_transition(booking.status, BookingStatus::Completed)?;

        let mut equipment = self
            .db
            .get_equipment(&issue.equipment_id)
            .await?
            .ok_or_else(|| AppError::NotFound("equipment".to_string()))?;

        let at = now();
        let fee = late_fee(issue.due_at, at, self.late_fee_per_hour);
        issue.returned_at = Some(at);
        issue.return_condition = Some(condition);
        issue.delay_fee = (fee > 0.0).then_some(fee);
        if notes.is_some() {
            issue.notes = notes.clone();
        }

        if condition.restores_stock() {
            equipment.available_quantity =
                (equipment.available_quantity + issue.quantity).min(equipment.total_quantity);
        } else {
            // Damaged or lost items leave the inventory.
            equipment.total_quantity = equipment.total_quantity.saturating_sub(issue.quantity);
            equipment.available_quantity =
                equipment.available_quantity.min(equipment.total_quantity);
            if condition == ReturnCondition::Damaged {
                equipment.condition = EquipmentCondition::NeedsAttention;
            }
        }
        equipment.updated_at = at;

        let old = booking.status;
        booking.status = BookingStatus::Completed;
        booking.updated_at = at;
        let change = history_row(
            &booking.id,
            Some(old),
            BookingStatus::Completed,
            Some(actor_id),
            notes,
            at,
        );

        self.db
            .return_equipment_atomic(&issue, &equipment, &booking, &change)
            .await?;

        tracing::info!(
            issue_id = %issue.id,
            booking_id = %booking.id,
            condition = ?condition,
            fee,
            "Equipment returned"
        );
        self.notifier.booking_status_changed(&booking, old).await;
        Ok(issue)
    }

    pub async fn outstanding(&self) -> Result<Vec<EquipmentIssue>> {
        self.db.list_outstanding_issues().await
    }
}
