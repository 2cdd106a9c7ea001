//! Driver-facing station map

use axum::extract::State;
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};
use tracing::warn;
use utoipa::ToSchema;

use crate::application::Availability;
use crate::domain::{Identity, RiskLevel, StationStatus, UserRole};
use crate::interfaces::http::common::{ApiError, ApiResponse};
use crate::interfaces::http::middleware::require_role;
use crate::interfaces::http::state::AppState;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MapStationDto {
    pub station_id: i64,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub status: StationStatus,
    pub price_per_hour: f64,
    pub availability: Availability,
    /// Absent when the assessment could not be computed
    pub health_score: Option<u8>,
    pub risk_level: Option<RiskLevel>,
}

#[utoipa::path(
    get,
    path = "/api/v1/driver/stations/map",
    tag = "Driver",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Every station with availability and health", body = ApiResponse<Vec<MapStationDto>>),
        (status = 403, description = "Caller is not a driver")
    )
)]
pub async fn get_station_map(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
) -> Result<Json<ApiResponse<Vec<MapStationDto>>>, ApiError> {
    require_role(&identity, &[UserRole::Driver])?;

    let stations = state.repos.stations().find_all().await?;
    let mut map = Vec::with_capacity(stations.len());

    for station in stations {
        let availability = state.bookings.availability_now(station.id).await?.availability;
        let health = match state.health.analyze(station.id).await {
            Ok(a) => Some(a),
            Err(e) => {
                warn!(station_id = station.id, error = %e, "Health unavailable for map entry");
                None
            }
        };

        map.push(MapStationDto {
            station_id: station.id,
            name: station.name,
            latitude: station.latitude,
            longitude: station.longitude,
            status: station.status,
            price_per_hour: station.price_per_hour,
            availability,
            health_score: health.map(|h| h.health_score),
            risk_level: health.map(|h| h.risk_level),
        });
    }

    Ok(Json(ApiResponse::success(map)))
}
