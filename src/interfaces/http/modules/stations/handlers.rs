//! Station HTTP handlers: availability, health and raw telemetry

use axum::extract::{Path, Query, State};
use axum::{Extension, Json};

use super::dto::{AvailabilityQuery, StationHealthDto};
use crate::application::StationAvailability;
use crate::domain::{DomainError, Identity, Station, TelemetrySample};
use crate::interfaces::http::common::{ApiError, ApiResponse};
use crate::interfaces::http::state::AppState;

/// Samples returned by the telemetry endpoint
pub const TELEMETRY_PAGE: u64 = 100;

#[utoipa::path(
    get,
    path = "/api/v1/stations/{id}/availability",
    tag = "Stations",
    params(("id" = i64, Path, description = "Station ID"), AvailabilityQuery),
    responses(
        (status = 200, description = "Availability over the look-ahead window", body = ApiResponse<StationAvailability>),
        (status = 404, description = "Station not found")
    )
)]
pub async fn get_availability(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Query(query): Query<AvailabilityQuery>,
) -> Result<Json<ApiResponse<StationAvailability>>, ApiError> {
    let availability = match query.as_of {
        Some(as_of) => state.bookings.get_availability(id, as_of).await?,
        None => state.bookings.availability_now(id).await?,
    };
    Ok(Json(ApiResponse::success(availability)))
}

/// Load the station and check the caller owns it (admins pass too)
async fn owned_station(state: &AppState, id: i64, identity: &Identity) -> Result<Station, ApiError> {
    let station = state
        .repos
        .stations()
        .find_by_id(id)
        .await?
        .ok_or_else(|| DomainError::not_found("Station", id))?;

    if !station.is_owned_by(identity.user_id) && !identity.is_admin() {
        return Err(ApiError::forbidden("You do not own this station"));
    }
    Ok(station)
}

#[utoipa::path(
    get,
    path = "/api/v1/stations/{id}/health",
    tag = "Stations",
    security(("bearer_auth" = [])),
    params(("id" = i64, Path, description = "Station ID")),
    responses(
        (status = 200, description = "Current health assessment", body = ApiResponse<StationHealthDto>),
        (status = 403, description = "Caller does not own the station"),
        (status = 404, description = "Station not found")
    )
)]
pub async fn get_station_health(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<StationHealthDto>>, ApiError> {
    let station = owned_station(&state, id, &identity).await?;
    let assessment = state.health.analyze(station.id).await?;
    Ok(Json(ApiResponse::success(StationHealthDto::new(station.id, assessment))))
}

#[utoipa::path(
    get,
    path = "/api/v1/stations/{id}/telemetry",
    tag = "Stations",
    security(("bearer_auth" = [])),
    params(("id" = i64, Path, description = "Station ID")),
    responses(
        (status = 200, description = "Latest samples, newest first", body = ApiResponse<Vec<TelemetrySample>>),
        (status = 403, description = "Caller does not own the station"),
        (status = 404, description = "Station not found")
    )
)]
pub async fn get_station_telemetry(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<Vec<TelemetrySample>>>, ApiError> {
    let station = owned_station(&state, id, &identity).await?;
    let samples = state
        .repos
        .telemetry()
        .recent_for_station(station.id, TELEMETRY_PAGE)
        .await?;
    Ok(Json(ApiResponse::success(samples)))
}
