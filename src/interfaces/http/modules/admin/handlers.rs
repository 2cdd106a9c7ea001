//! Admin fault overview, station status and account switches

use axum::extract::{Path, State};
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};
use tracing::info;
use utoipa::ToSchema;
use validator::Validate;

use crate::domain::{DomainError, Identity, StationStatus, UserRole};
use crate::interfaces::http::common::{ApiError, ApiResponse, ValidatedJson};
use crate::interfaces::http::middleware::require_role;
use crate::interfaces::http::state::AppState;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CriticalFaultDto {
    pub station_id: i64,
    pub owner_id: i64,
    pub name: String,
    pub health_score: u8,
    pub anomalies_detected: u32,
}

#[utoipa::path(
    get,
    path = "/api/v1/admin/faults/critical",
    tag = "Admin",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Active stations currently at HIGH risk", body = ApiResponse<Vec<CriticalFaultDto>>),
        (status = 403, description = "Caller is not an admin")
    )
)]
pub async fn list_critical_faults(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
) -> Result<Json<ApiResponse<Vec<CriticalFaultDto>>>, ApiError> {
    require_role(&identity, &[UserRole::Admin])?;

    let mut faults = Vec::new();
    for station in state.repos.stations().find_active().await? {
        let assessment = state.health.analyze(station.id).await?;
        if assessment.is_alert() {
            faults.push(CriticalFaultDto {
                station_id: station.id,
                owner_id: station.owner_id,
                name: station.name,
                health_score: assessment.health_score,
                anomalies_detected: assessment.anomalies_detected,
            });
        }
    }

    Ok(Json(ApiResponse::success(faults)))
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateStationStatusRequest {
    pub status: StationStatus,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct StationStatusDto {
    pub station_id: i64,
    pub status: StationStatus,
}

#[utoipa::path(
    patch,
    path = "/api/v1/admin/stations/{id}/status",
    tag = "Admin",
    security(("bearer_auth" = [])),
    params(("id" = i64, Path, description = "Station ID")),
    request_body = UpdateStationStatusRequest,
    responses(
        (status = 200, description = "Status changed", body = ApiResponse<StationStatusDto>),
        (status = 403, description = "Caller is not an admin"),
        (status = 404, description = "Station not found")
    )
)]
pub async fn update_station_status(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<i64>,
    ValidatedJson(req): ValidatedJson<UpdateStationStatusRequest>,
) -> Result<Json<ApiResponse<StationStatusDto>>, ApiError> {
    require_role(&identity, &[UserRole::Admin])?;

    state.repos.stations().update_status(id, req.status).await?;
    info!(
        station_id = id,
        status = req.status.as_str(),
        admin_id = identity.user_id,
        "Station status changed"
    );

    Ok(Json(ApiResponse::success(StationStatusDto {
        station_id: id,
        status: req.status,
    })))
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UserStatusDto {
    pub user_id: i64,
    pub is_active: bool,
}

async fn set_user_active(
    state: &AppState,
    identity: &Identity,
    user_id: i64,
    is_active: bool,
) -> Result<Json<ApiResponse<UserStatusDto>>, ApiError> {
    require_role(identity, &[UserRole::Admin])?;
    if user_id == identity.user_id && !is_active {
        return Err(DomainError::Validation("admins cannot disable their own account".into()).into());
    }

    state.repos.users().set_active(user_id, is_active).await?;
    info!(user_id, is_active, admin_id = identity.user_id, "User account switched");

    Ok(Json(ApiResponse::success(UserStatusDto { user_id, is_active })))
}

#[utoipa::path(
    patch,
    path = "/api/v1/admin/users/{id}/enable",
    tag = "Admin",
    security(("bearer_auth" = [])),
    params(("id" = i64, Path, description = "User ID")),
    responses(
        (status = 200, description = "Account enabled", body = ApiResponse<UserStatusDto>),
        (status = 403, description = "Caller is not an admin"),
        (status = 404, description = "User not found")
    )
)]
pub async fn enable_user(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<UserStatusDto>>, ApiError> {
    set_user_active(&state, &identity, id, true).await
}

/// Existing tokens for the account stop resolving immediately.
#[utoipa::path(
    patch,
    path = "/api/v1/admin/users/{id}/disable",
    tag = "Admin",
    security(("bearer_auth" = [])),
    params(("id" = i64, Path, description = "User ID")),
    responses(
        (status = 200, description = "Account disabled", body = ApiResponse<UserStatusDto>),
        (status = 422, description = "Admin tried to disable their own account"),
        (status = 403, description = "Caller is not an admin"),
        (status = 404, description = "User not found")
    )
)]
pub async fn disable_user(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<UserStatusDto>>, ApiError> {
    set_user_active(&state, &identity, id, false).await
}
