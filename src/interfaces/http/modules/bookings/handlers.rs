//! Booking HTTP handlers

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::{Extension, Json};

use super::dto::{BookingDto, CreateBookingRequest};
use crate::domain::Identity;
use crate::interfaces::http::common::{ApiError, ApiResponse, ValidatedJson};
use crate::interfaces::http::state::AppState;

#[utoipa::path(
    post,
    path = "/api/v1/bookings",
    tag = "Bookings",
    security(("bearer_auth" = [])),
    request_body = CreateBookingRequest,
    responses(
        (status = 201, description = "Booking confirmed", body = ApiResponse<BookingDto>),
        (status = 400, description = "End time is not after start time"),
        (status = 404, description = "Station not found"),
        (status = 409, description = "Slot already taken or booked concurrently"),
        (status = 422, description = "Invalid request body")
    )
)]
pub async fn create_booking(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    ValidatedJson(req): ValidatedJson<CreateBookingRequest>,
) -> Result<(StatusCode, Json<ApiResponse<BookingDto>>), ApiError> {
    let booking = state
        .bookings
        .reserve(req.station_id, req.start_time, req.end_time, &identity)
        .await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(booking.into()))))
}

#[utoipa::path(
    get,
    path = "/api/v1/bookings/my",
    tag = "Bookings",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Caller's bookings, most recent start first", body = ApiResponse<Vec<BookingDto>>)
    )
)]
pub async fn list_my_bookings(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
) -> Result<Json<ApiResponse<Vec<BookingDto>>>, ApiError> {
    let bookings = state.bookings.list_for_user(&identity).await?;
    Ok(Json(ApiResponse::success(
        bookings.into_iter().map(BookingDto::from).collect(),
    )))
}

#[utoipa::path(
    get,
    path = "/api/v1/bookings/{id}",
    tag = "Bookings",
    security(("bearer_auth" = [])),
    params(("id" = i64, Path, description = "Booking ID")),
    responses(
        (status = 200, description = "Booking", body = ApiResponse<BookingDto>),
        (status = 404, description = "No such booking for this user")
    )
)]
pub async fn get_booking(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<BookingDto>>, ApiError> {
    let booking = state.bookings.get_for_user(id, &identity).await?;
    Ok(Json(ApiResponse::success(booking.into())))
}

#[utoipa::path(
    patch,
    path = "/api/v1/bookings/{id}/cancel",
    tag = "Bookings",
    security(("bearer_auth" = [])),
    params(("id" = i64, Path, description = "Booking ID")),
    responses(
        (status = 200, description = "Booking cancelled", body = ApiResponse<BookingDto>),
        (status = 403, description = "Booking belongs to another user"),
        (status = 404, description = "Booking not found"),
        (status = 409, description = "Booking is no longer confirmed")
    )
)]
pub async fn cancel_booking(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<BookingDto>>, ApiError> {
    let booking = state.bookings.cancel(id, &identity).await?;
    Ok(Json(ApiResponse::success(booking.into())))
}
