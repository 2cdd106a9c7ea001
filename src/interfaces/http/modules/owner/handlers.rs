//! Owner revenue and usage over the caller's own stations

use axum::extract::State;
use axum::{Extension, Json};

use crate::application::booking::{DailyRevenue, OwnerAnalytics, RevenueSummary};
use crate::domain::{Identity, UserRole};
use crate::interfaces::http::common::{ApiError, ApiResponse};
use crate::interfaces::http::middleware::require_role;
use crate::interfaces::http::state::AppState;

#[utoipa::path(
    get,
    path = "/api/v1/owner/revenue",
    tag = "Owner",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "All-time revenue with a per-station usage breakdown", body = ApiResponse<RevenueSummary>),
        (status = 403, description = "Caller is not a station owner")
    )
)]
pub async fn get_revenue(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
) -> Result<Json<ApiResponse<RevenueSummary>>, ApiError> {
    require_role(&identity, &[UserRole::StationOwner])?;
    let summary = OwnerAnalytics::new(state.repos.clone())
        .revenue_summary(identity.user_id)
        .await?;
    Ok(Json(ApiResponse::success(summary)))
}

#[utoipa::path(
    get,
    path = "/api/v1/owner/revenue/breakdown",
    tag = "Owner",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Completed-booking revenue per day, oldest first", body = ApiResponse<Vec<DailyRevenue>>),
        (status = 403, description = "Caller is not a station owner")
    )
)]
pub async fn get_revenue_breakdown(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
) -> Result<Json<ApiResponse<Vec<DailyRevenue>>>, ApiError> {
    require_role(&identity, &[UserRole::StationOwner])?;
    let days = OwnerAnalytics::new(state.repos.clone())
        .daily_revenue(identity.user_id)
        .await?;
    Ok(Json(ApiResponse::success(days)))
}
