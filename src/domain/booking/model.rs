//! Booking domain entity

use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{DomainError, DomainResult};

/// Booking lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    /// Holds the slot; the only status that participates in overlap checks
    Confirmed,
    /// Cancelled by the booking's user while still confirmed
    Cancelled,
    /// Set by the completion job once `end_time` has passed
    Completed,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Confirmed => "confirmed",
            Self::Cancelled => "cancelled",
            Self::Completed => "completed",
        }
    }

    pub fn can_transition_to(&self, next: BookingStatus) -> bool {
        matches!(
            (self, next),
            (Self::Confirmed, Self::Cancelled) | (Self::Confirmed, Self::Completed)
        )
    }
}

impl FromStr for BookingStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "confirmed" => Ok(Self::Confirmed),
            "cancelled" => Ok(Self::Cancelled),
            "completed" => Ok(Self::Completed),
            other => Err(format!("unknown booking status '{}'", other)),
        }
    }
}

impl std::fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Half-open interval `[start, end)` with `end > start`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl TimeWindow {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> DomainResult<Self> {
        if end <= start {
            return Err(DomainError::InvalidWindow { start, end });
        }
        Ok(Self { start, end })
    }

    /// `[as_of, as_of + length)`
    pub fn starting_at(as_of: DateTime<Utc>, length: Duration) -> DomainResult<Self> {
        Self::new(as_of, as_of + length)
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    /// Touching endpoints do not overlap.
    pub fn overlaps(&self, other: &TimeWindow) -> bool {
        self.start < other.end && self.end > other.start
    }

    pub fn duration(&self) -> Duration {
        self.end - self.start
    }
}

/// Reservation of a station for a time window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Booking {
    pub id: i64,
    pub user_id: i64,
    pub station_id: i64,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub status: BookingStatus,
    /// Fixed at creation
    pub total_cost: f64,
    /// Set to 1 at creation and not advanced afterwards
    pub version: i32,
    pub created_at: DateTime<Utc>,
}

impl Booking {
    pub const INITIAL_VERSION: i32 = 1;

    pub fn window(&self) -> TimeWindow {
        TimeWindow {
            start: self.start_time,
            end: self.end_time,
        }
    }

    pub fn is_confirmed(&self) -> bool {
        self.status == BookingStatus::Confirmed
    }

    pub fn is_owned_by(&self, user_id: i64) -> bool {
        self.user_id == user_id
    }

    /// Whether this booking blocks `window` on its station
    pub fn blocks(&self, window: &TimeWindow) -> bool {
        self.is_confirmed() && self.window().overlaps(window)
    }

    pub fn transition_to(&mut self, next: BookingStatus) -> DomainResult<()> {
        if !self.status.can_transition_to(next) {
            return Err(DomainError::InvalidStateTransition {
                entity: "Booking",
                from: self.status.to_string(),
                to: next.to_string(),
            });
        }
        self.status = next;
        Ok(())
    }

    pub fn cancel(&mut self) -> DomainResult<()> {
        self.transition_to(BookingStatus::Cancelled)
    }
}

/// Insert payload produced by the booking engine once the version CAS is won
#[derive(Debug, Clone, PartialEq)]
pub struct NewBooking {
    pub user_id: i64,
    pub station_id: i64,
    pub window: TimeWindow,
    pub total_cost: f64,
    pub created_at: DateTime<Utc>,
}

impl NewBooking {
    pub fn into_booking(self, id: i64) -> Booking {
        Booking {
            id,
            user_id: self.user_id,
            station_id: self.station_id,
            start_time: self.window.start,
            end_time: self.window.end,
            status: BookingStatus::Confirmed,
            total_cost: self.total_cost,
            version: Booking::INITIAL_VERSION,
            created_at: self.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 5, 4, h, m, 0).unwrap()
    }

    fn window(a: (u32, u32), b: (u32, u32)) -> TimeWindow {
        TimeWindow::new(at(a.0, a.1), at(b.0, b.1)).unwrap()
    }

    fn confirmed(w: TimeWindow) -> Booking {
        NewBooking {
            user_id: 1,
            station_id: 1,
            window: w,
            total_cost: 10.0,
            created_at: at(8, 0),
        }
        .into_booking(1)
    }

    #[test]
    fn rejects_empty_and_inverted_windows() {
        assert!(matches!(
            TimeWindow::new(at(10, 0), at(10, 0)),
            Err(DomainError::InvalidWindow { .. })
        ));
        assert!(matches!(
            TimeWindow::new(at(11, 0), at(10, 0)),
            Err(DomainError::InvalidWindow { .. })
        ));
    }

    #[test]
    fn touching_windows_do_not_overlap() {
        let a = window((10, 0), (11, 0));
        let b = window((11, 0), (12, 0));
        assert!(!a.overlaps(&b));
        assert!(!b.overlaps(&a));
    }

    #[test]
    fn straddling_window_overlaps() {
        let a = window((10, 0), (11, 0));
        let c = window((10, 59), (11, 1));
        assert!(a.overlaps(&c));
        assert!(c.overlaps(&a));
    }

    #[test]
    fn contained_window_overlaps() {
        let outer = window((9, 0), (13, 0));
        let inner = window((10, 0), (10, 30));
        assert!(outer.overlaps(&inner));
        assert!(inner.overlaps(&outer));
    }

    #[test]
    fn only_confirmed_bookings_block() {
        let mut booking = confirmed(window((10, 0), (11, 0)));
        let probe = window((10, 30), (10, 45));
        assert!(booking.blocks(&probe));

        booking.cancel().unwrap();
        assert!(!booking.blocks(&probe));
    }

    #[test]
    fn new_booking_is_confirmed_at_version_one() {
        let booking = confirmed(window((10, 0), (12, 0)));
        assert_eq!(booking.status, BookingStatus::Confirmed);
        assert_eq!(booking.version, 1);
        assert_eq!(booking.window().duration(), Duration::hours(2));
    }

    #[test]
    fn cancel_twice_is_invalid_transition() {
        let mut booking = confirmed(window((10, 0), (11, 0)));
        booking.cancel().unwrap();
        let err = booking.cancel().unwrap_err();
        assert!(matches!(err, DomainError::InvalidStateTransition { .. }));
        assert_eq!(booking.status, BookingStatus::Cancelled);
    }

    #[test]
    fn completed_booking_cannot_be_cancelled() {
        let mut booking = confirmed(window((10, 0), (11, 0)));
        booking.transition_to(BookingStatus::Completed).unwrap();
        assert!(booking.cancel().is_err());
    }

    #[test]
    fn status_names_roundtrip() {
        for status in [
            BookingStatus::Confirmed,
            BookingStatus::Cancelled,
            BookingStatus::Completed,
        ] {
            assert_eq!(status.as_str().parse::<BookingStatus>(), Ok(status));
        }
        assert!("pending".parse::<BookingStatus>().is_err());
    }
}
