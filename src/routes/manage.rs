// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Admin-only management routes: facilities, inventory, time blocks and users.

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::{
    AccountStatus, BlockScope, Class, Court, Equipment, EquipmentCondition, EquipmentIssue,
    Profile, ResourceType, ReturnCondition, Role, TimeBlock,
};
use crate::services::accounts::{UserQuery, UserSummary};
use crate::services::inventory::InventorySummary;
use crate::time_utils::{now, truncate_to_seconds};
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get, post, put},
    Extension, Json, Router,
};
use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use validator::Validate;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/admin/courts", post(create_court))
        .route(
            "/api/admin/courts/{id}",
            put(update_court).delete(delete_court),
        )
        .route("/api/admin/courts/{id}/toggle", post(toggle_court))
        .route("/api/admin/equipment", post(create_equipment))
        .route("/api/admin/equipment/{id}", put(update_equipment))
        .route("/api/admin/equipment/{id}/restock", post(restock))
        .route("/api/admin/inventory", get(inventory_summary))
        .route("/api/admin/issues", get(outstanding_issues).post(issue))
        .route("/api/admin/issues/{id}/return", post(return_items))
        .route(
            "/api/admin/time-blocks",
            get(list_time_blocks).post(create_time_block),
        )
        .route("/api/admin/time-blocks/{id}", delete(delete_time_block))
        .route("/api/admin/users", get(list_users))
        .route("/api/admin/users/{id}/role", put(set_role))
        .route("/api/admin/users/{id}/status", put(set_status))
        .route("/api/admin/classes", get(list_classes))
}

// ─── Courts ──────────────────────────────────────────────────

#[derive(Debug, Deserialize, Validate)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct CourtRequest {
    #[validate(length(min = 2, max = 100))]
    pub name: String,
    #[validate(length(min = 2, max = 50))]
    pub sport: String,
    #[validate(length(min = 2, max = 200))]
    pub location: String,
    #[validate(range(min = 1, max = 500))]
    pub capacity: u32,
    #[validate(url)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub amenities: Vec<String>,
    #[serde(default = "default_true")]
    pub is_available: bool,
}

fn default_true() -> bool {
    true
}

impl CourtRequest {
    fn apply(self, court: &mut Court) {
        court.name = self.name.trim().to_string();
        court.sport = self.sport.trim().to_string();
        court.location = self.location.trim().to_string();
        court.capacity = self.capacity;
        court.image_url = self.image_url;
        court.amenities = self
            .amenities
            .into_iter()
            .map(|a| a.trim().to_string())
            .filter(|a| !a.is_empty())
            .collect();
        court.is_available = self.is_available;
    }
}

async fn load_court(state: &AppState, id: &str) -> Result<Court> {
    state
        .db
        .get_court(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("court {}", id)))
}

async fn create_court(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CourtRequest>,
) -> Result<(StatusCode, Json<Court>)> {
    req.validate()?;
    let at = now();
    let mut court = Court {
        id: uuid::Uuid::new_v4().to_string(),
        name: String::new(),
        sport: String::new(),
        location: String::new(),
        capacity: 0,
        image_url: None,
        amenities: Vec::new(),
        is_available: true,
        created_at: at,
        updated_at: at,
    };
    req.apply(&mut court);
    state.db.upsert_court(&court).await?;
    tracing::info!(court_id = %court.id, name = %court.name, "Court created");
    Ok((StatusCode::CREATED, Json(court)))
}

async fn update_court(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<CourtRequest>,
) -> Result<Json<Court>> {
    req.validate()?;
    let mut court = load_court(&state, &id).await?;
    req.apply(&mut court);
    court.updated_at = now();
    state.db.upsert_court(&court).await?;
    Ok(Json(court))
}

/// Open or close a court for new bookings.
async fn toggle_court(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Court>> {
    let mut court = load_court(&state, &id).await?;
    court.is_available = !court.is_available;
    court.updated_at = now();
    state.db.upsert_court(&court).await?;
    tracing::info!(court_id = %court.id, is_available = court.is_available, "Court toggled");
    Ok(Json(court))
}

/// Horizon checked for active bookings before a court may be deleted.
const DELETE_LOOKAHEAD_DAYS: i64 = 366;

async fn delete_court(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    let court = load_court(&state, &id).await?;
    let at = now();
    let upcoming = state
        .db
        .list_bookings_for_resource(
            ResourceType::Court,
            &court.id,
            at,
            at + Duration::days(DELETE_LOOKAHEAD_DAYS),
        )
        .await?;
    if upcoming.iter().any(|b| b.status.is_active()) {
        return Err(AppError::Conflict(
            "court has active bookings; close it instead".to_string(),
        ));
    }
    state.db.delete_court(&court.id).await?;
    tracing::info!(court_id = %court.id, "Court deleted");
    Ok(StatusCode::NO_CONTENT)
}

// ─── Equipment ───────────────────────────────────────────────

#[derive(Debug, Deserialize, Validate)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct EquipmentRequest {
    #[validate(length(min = 2, max = 100))]
    pub name: String,
    #[validate(length(min = 2, max = 50))]
    pub category: String,
    #[validate(range(max = 10000))]
    pub total_quantity: u32,
    pub condition: Option<EquipmentCondition>,
    #[validate(url)]
    pub image_url: Option<String>,
}

/// New available count after changing the total, keeping issued items out.
fn resize_stock(equipment: &Equipment, new_total: u32) -> Result<u32> {
    let issued = equipment.issued_quantity();
    if new_total < issued {
        return Err(AppError::Conflict(format!(
            "{} items are issued; total cannot drop below that",
            issued
        )));
    }
    Ok(new_total - issued)
}

async fn create_equipment(
    State(state): State<Arc<AppState>>,
    Json(req): Json<EquipmentRequest>,
) -> Result<(StatusCode, Json<Equipment>)> {
    req.validate()?;
    let at = now();
    let equipment = Equipment {
        id: uuid::Uuid::new_v4().to_string(),
        name: req.name.trim().to_string(),
        category: req.category.trim().to_string(),
        total_quantity: req.total_quantity,
        available_quantity: req.total_quantity,
        condition: req.condition.unwrap_or(EquipmentCondition::Good),
        image_url: req.image_url,
        last_restocked: None,
        created_at: at,
        updated_at: at,
    };
    state.db.upsert_equipment(&equipment).await?;
    tracing::info!(equipment_id = %equipment.id, name = %equipment.name, "Equipment created");
    Ok((StatusCode::CREATED, Json(equipment)))
}

async fn update_equipment(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<EquipmentRequest>,
) -> Result<Json<Equipment>> {
    req.validate()?;
    let mut equipment = state
        .db
        .get_equipment(&id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("equipment {}", id)))?;

    equipment.available_quantity = resize_stock(&equipment, req.total_quantity)?;
    equipment.total_quantity = req.total_quantity;
    equipment.name = req.name.trim().to_string();
    equipment.category = req.category.trim().to_string();
    if let Some(condition) = req.condition {
        equipment.condition = condition;
    }
    equipment.image_url = req.image_url;
    equipment.updated_at = now();

    state.db.upsert_equipment(&equipment).await?;
    Ok(Json(equipment))
}

#[derive(Debug, Deserialize, Validate)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct RestockRequest {
    #[validate(range(min = 1, max = 1000))]
    pub amount: u32,
}

async fn restock(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<RestockRequest>,
) -> Result<Json<Equipment>> {
    req.validate()?;
    let mut equipment = state
        .db
        .get_equipment(&id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("equipment {}", id)))?;
    equipment.restock(req.amount, now());
    state.db.upsert_equipment(&equipment).await?;
    tracing::info!(
        equipment_id = %equipment.id,
        amount = req.amount,
        total = equipment.total_quantity,
        "Equipment restocked"
    );
    Ok(Json(equipment))
}

async fn inventory_summary(State(state): State<Arc<AppState>>) -> Result<Json<InventorySummary>> {
    let equipment = state.db.list_equipment().await?;
    Ok(Json(InventorySummary::compute(
        &equipment,
        state.config.low_stock_threshold,
    )))
}

// ─── Issue & Return ──────────────────────────────────────────

async fn outstanding_issues(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<EquipmentIssue>>> {
    Ok(Json(state.inventory.outstanding().await?))
}

#[derive(Debug, Deserialize, Validate)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct IssueRequest {
    #[validate(length(min = 1))]
    pub booking_id: String,
    #[validate(length(max = 500))]
    pub notes: Option<String>,
}

async fn issue(
    State(state): State<Arc<AppState>>,
    Json(req): Json<IssueRequest>,
) -> Result<(StatusCode, Json<EquipmentIssue>)> {
    req.validate()?;
    let issue = state.inventory.issue(&req.booking_id, req.notes).await?;
    Ok((StatusCode::CREATED, Json(issue)))
}

#[derive(Debug, Deserialize, Validate)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ReturnRequest {
    pub condition: ReturnCondition,
    #[validate(length(max = 500))]
    pub notes: Option<String>,
}

async fn return_items(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
    Json(req): Json<ReturnRequest>,
) -> Result<Json<EquipmentIssue>> {
    req.validate()?;
    let issue = state
        .inventory
        .return_items(&user.user_id, &id, req.condition, req.notes)
        .await?;
    Ok(Json(issue))
}

// ─── Time Blocks ─────────────────────────────────────────────

#[derive(Deserialize)]
struct TimeBlocksQuery {
    scope: Option<BlockScope>,
}

async fn list_time_blocks(
    State(state): State<Arc<AppState>>,
    Query(params): Query<TimeBlocksQuery>,
) -> Result<Json<Vec<TimeBlock>>> {
    Ok(Json(state.db.list_time_blocks(params.scope).await?))
}

#[derive(Debug, Deserialize, Validate)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct TimeBlockRequest {
    pub scope: BlockScope,
    pub court_id: Option<String>,
    #[validate(length(min = 2, max = 200))]
    pub reason: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}

/// Shape checks for a block; returns the court ID for court-scoped blocks.
fn check_block(req: &TimeBlockRequest) -> Result<Option<String>> {
    if req.end_time <= req.start_time {
        return Err(AppError::BadRequest(
            "end time must be after start time".to_string(),
        ));
    }
    let court_id = req
        .court_id
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty());
    match (req.scope, court_id) {
        (BlockScope::Court, Some(id)) => Ok(Some(id.to_string())),
        (BlockScope::Court, None) => Err(AppError::BadRequest(
            "court blocks require court_id".to_string(),
        )),
        (BlockScope::Global, Some(_)) => Err(AppError::BadRequest(
            "global blocks cannot name a court".to_string(),
        )),
        (BlockScope::Global, None) => Ok(None),
    }
}

async fn create_time_block(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(req): Json<TimeBlockRequest>,
) -> Result<(StatusCode, Json<TimeBlock>)> {
    req.validate()?;
    let court_id = check_block(&req)?;
    if let Some(id) = court_id.as_deref() {
        load_court(&state, id).await?;
    }

    let block = TimeBlock {
        id: uuid::Uuid::new_v4().to_string(),
        scope: req.scope,
        court_id,
        reason: req.reason.trim().to_string(),
        start_time: truncate_to_seconds(req.start_time),
        end_time: truncate_to_seconds(req.end_time),
        created_by: user.user_id.clone(),
        created_at: now(),
    };
    state.db.upsert_time_block(&block).await?;
    tracing::info!(
        block_id = %block.id,
        scope = block.scope.as_str(),
        court_id = ?block.court_id,
        "Time block created"
    );
    Ok((StatusCode::CREATED, Json(block)))
}

async fn delete_time_block(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    if state.db.get_time_block(&id).await?.is_none() {
        return Err(AppError::NotFound(format!("time block {}", id)));
    }
    state.db.delete_time_block(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ─── Users & Classes ─────────────────────────────────────────

#[derive(Deserialize)]
struct UsersQuery {
    search: Option<String>,
    role: Option<String>,
    status: Option<String>,
}

fn user_query(params: UsersQuery) -> Result<UserQuery> {
    let role = params
        .role
        .as_deref()
        .map(|r| Role::parse(r).ok_or_else(|| AppError::BadRequest(format!("unknown role {:?}", r))))
        .transpose()?;
    let status = params
        .status
        .as_deref()
        .map(|s| {
            AccountStatus::parse(s)
                .ok_or_else(|| AppError::BadRequest(format!("unknown status {:?}", s)))
        })
        .transpose()?;
    Ok(UserQuery {
        search: params.search,
        role,
        status,
    })
}

async fn list_users(
    State(state): State<Arc<AppState>>,
    Query(params): Query<UsersQuery>,
) -> Result<Json<Vec<UserSummary>>> {
    let query = user_query(params)?;
    Ok(Json(state.accounts.list_users(&query).await?))
}

#[derive(Debug, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct RoleRequest {
    pub role: Role,
}

async fn set_role(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
    Json(req): Json<RoleRequest>,
) -> Result<Json<Profile>> {
    Ok(Json(
        state.accounts.set_role(&user.user_id, &id, req.role).await?,
    ))
}

#[derive(Debug, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct StatusRequest {
    pub status: AccountStatus,
}

async fn set_status(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
    Json(req): Json<StatusRequest>,
) -> Result<Json<Profile>> {
    Ok(Json(
        state
            .accounts
            .set_status(&user.user_id, &id, req.status)
            .await?,
    ))
}

async fn list_classes(State(state): State<Arc<AppState>>) -> Result<Json<Vec<Class>>> {
    Ok(Json(state.db.list_classes().await?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn block(scope: BlockScope, court_id: Option<&str>, hours: i64) -> TimeBlockRequest {
        let start = Utc.with_ymd_and_hms(2026, 3, 1, 6, 0, 0).unwrap();
        TimeBlockRequest {
            scope,
            court_id: court_id.map(str::to_string),
            reason: "Resurfacing".to_string(),
            start_time: start,
            end_time: start + Duration::hours(hours),
        }
    }

    #[test]
    fn test_check_block() {
        assert_eq!(
            check_block(&block(BlockScope::Court, Some("c1"), 4)).unwrap(),
            Some("c1".to_string())
        );
        assert_eq!(check_block(&block(BlockScope::Global, None, 4)).unwrap(), None);
        assert!(check_block(&block(BlockScope::Court, None, 4)).is_err());
        assert!(check_block(&block(BlockScope::Court, Some(" "), 4)).is_err());
        assert!(check_block(&block(BlockScope::Global, Some("c1"), 4)).is_err());
        assert!(check_block(&block(BlockScope::Global, None, 0)).is_err());
    }

    #[test]
    fn test_resize_stock_keeps_issued_items() {
        let at = Utc::now();
        let equipment = Equipment {
            id: "e1".to_string(),
            name: "Football".to_string(),
            category: "Football".to_string(),
            total_quantity: 10,
            available_quantity: 6,
            condition: EquipmentCondition::Good,
            image_url: None,
            last_restocked: None,
            created_at: at,
            updated_at: at,
        };
        assert_eq!(resize_stock(&equipment, 12).unwrap(), 8);
        assert_eq!(resize_stock(&equipment, 4).unwrap(), 0);
        assert!(matches!(
            resize_stock(&equipment, 3),
            Err(AppError::Conflict(_))
        ));
    }

    #[test]
    fn test_user_query_rejects_unknown_role() {
        let query = user_query(UsersQuery {
            search: Some("asha".to_string()),
            role: Some("faculty".to_string()),
            status: None,
        })
        .unwrap();
        assert_eq!(query.role, Some(Role::Faculty));

        assert!(user_query(UsersQuery {
            search: None,
            role: Some("janitor".to_string()),
            status: None,
        })
        .is_err());
    }
}
