//! Booking DTOs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::domain::{Booking, BookingStatus};

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateBookingRequest {
    #[validate(range(min = 1, message = "must be a positive station id"))]
    pub station_id: i64,
    /// RFC 3339; the window is `[start_time, end_time)`
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct BookingDto {
    pub id: i64,
    pub user_id: i64,
    pub station_id: i64,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub status: BookingStatus,
    pub total_cost: f64,
    pub version: i32,
    pub created_at: DateTime<Utc>,
}

impl From<Booking> for BookingDto {
    fn from(b: Booking) -> Self {
        Self {
            id: b.id,
            user_id: b.user_id,
            station_id: b.station_id,
            start_time: b.start_time,
            end_time: b.end_time,
            status: b.status,
            total_cost: b.total_cost,
            version: b.version,
            created_at: b.created_at,
        }
    }
}
