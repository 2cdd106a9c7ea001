//! Optimistic booking protocol
//!
//! `reserve` reads the station `version`, runs an overlap scan, then commits a
//! compare-and-swap on that version together with the booking insert. The
//! CAS is the gate: of any set of concurrent reservations that read the same
//! version, at most one commits. A booking committed between the version read
//! and the scan moves the version, so the stale request fails its CAS. There
//! is no retry; a lost CAS is reported as a slot conflict.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use utoipa::ToSchema;

use super::pricing::booking_cost;
use crate::domain::{
    Booking, BookingStatus, DomainError, DomainResult, Identity, NewBooking, RepositoryProvider,
    StationStatus, TimeWindow,
};
use crate::support::clock::SharedClock;

const DEFAULT_AVAILABILITY_WINDOW_MINUTES: i64 = 15;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum Availability {
    Available,
    Occupied,
    Unavailable,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct StationAvailability {
    pub station_id: i64,
    pub availability: Availability,
    /// Station status when `UNAVAILABLE`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<StationStatus>,
    /// End of the blocking booking when `OCCUPIED`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub occupied_until: Option<DateTime<Utc>>,
}

pub struct BookingEngine {
    repos: Arc<dyn RepositoryProvider>,
    clock: SharedClock,
    availability_window: Duration,
}

impl BookingEngine {
    pub fn new(repos: Arc<dyn RepositoryProvider>, clock: SharedClock) -> Self {
        Self {
            repos,
            clock,
            availability_window: Duration::minutes(DEFAULT_AVAILABILITY_WINDOW_MINUTES),
        }
    }

    pub fn with_availability_window(mut self, window: Duration) -> Self {
        self.availability_window = window;
        self
    }

    /// Reserve `[start, end)` on a station for the requester
    pub async fn reserve(
        &self,
        station_id: i64,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        requester: &Identity,
    ) -> DomainResult<Booking> {
        let window = TimeWindow::new(start, end)?;

        // The version must be read before the scan. Any reservation that
        // commits after this read bumps it, so a scan that missed that
        // booking still loses the CAS below.
        let station = self
            .repos
            .stations()
            .find_by_id(station_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Station", station_id))?;

        if let Some(existing) = self
            .repos
            .bookings()
            .find_overlapping(station_id, window)
            .await?
        {
            debug!(station_id, blocking_booking = existing.id, "Overlap pre-scan rejected request");
            metrics::counter!("booking_conflicts_total", "cause" => "overlap").increment(1);
            return Err(DomainError::SlotConflict(format!(
                "station {} is already booked from {} to {}",
                station_id, existing.start_time, existing.end_time
            )));
        }

        let total_cost = booking_cost(&window, station.price_per_hour)?;
        let new_booking = NewBooking {
            user_id: requester.user_id,
            station_id,
            window,
            total_cost,
            created_at: self.clock.now(),
        };

        match self
            .repos
            .bookings()
            .commit_reservation(station.version, new_booking)
            .await?
        {
            Some(booking) => {
                info!(
                    booking_id = booking.id,
                    station_id,
                    user_id = requester.user_id,
                    version = station.version + 1,
                    total_cost,
                    "Booking confirmed"
                );
                metrics::counter!("bookings_reserved_total").increment(1);
                Ok(booking)
            }
            None => {
                warn!(station_id, expected_version = station.version, "Lost station version race");
                metrics::counter!("booking_conflicts_total", "cause" => "version").increment(1);
                Err(DomainError::SlotConflict(format!(
                    "station {} was booked concurrently, try again",
                    station_id
                )))
            }
        }
    }

    /// Cancel a confirmed booking owned by the requester
    pub async fn cancel(&self, booking_id: i64, requester: &Identity) -> DomainResult<Booking> {
        let mut booking = self
            .repos
            .bookings()
            .find_by_id(booking_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Booking", booking_id))?;

        if !booking.is_owned_by(requester.user_id) {
            return Err(DomainError::Unauthorized(format!(
                "booking {} belongs to another user",
                booking_id
            )));
        }

        booking.cancel()?;

        let applied = self
            .repos
            .bookings()
            .transition_status(booking_id, BookingStatus::Confirmed, BookingStatus::Cancelled)
            .await?;

        if !applied {
            // a concurrent writer moved it off `confirmed` between read and write
            let current = self
                .repos
                .bookings()
                .find_by_id(booking_id)
                .await?
                .map(|b| b.status)
                .unwrap_or(BookingStatus::Cancelled);
            return Err(DomainError::InvalidStateTransition {
                entity: "Booking",
                from: current.to_string(),
                to: BookingStatus::Cancelled.to_string(),
            });
        }

        info!(booking_id, user_id = requester.user_id, "Booking cancelled");
        Ok(booking)
    }

    /// Whether the station can be used in `[as_of, as_of + window)`
    pub async fn get_availability(
        &self,
        station_id: i64,
        as_of: DateTime<Utc>,
    ) -> DomainResult<StationAvailability> {
        let station = self
            .repos
            .stations()
            .find_by_id(station_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Station", station_id))?;

        if !station.is_active() {
            return Ok(StationAvailability {
                station_id,
                availability: Availability::Unavailable,
                reason: Some(station.status),
                occupied_until: None,
            });
        }

        let window = TimeWindow::starting_at(as_of, self.availability_window)?;
        let blocking = self
            .repos
            .bookings()
            .find_overlapping(station_id, window)
            .await?;

        Ok(match blocking {
            Some(b) => StationAvailability {
                station_id,
                availability: Availability::Occupied,
                reason: None,
                occupied_until: Some(b.end_time),
            },
            None => StationAvailability {
                station_id,
                availability: Availability::Available,
                reason: None,
                occupied_until: None,
            },
        })
    }

    /// Availability as of the injected clock's now
    pub async fn availability_now(&self, station_id: i64) -> DomainResult<StationAvailability> {
        self.get_availability(station_id, self.clock.now()).await
    }

    pub async fn list_for_user(&self, requester: &Identity) -> DomainResult<Vec<Booking>> {
        self.repos.bookings().find_for_user(requester.user_id).await
    }

    /// Someone else's booking reports the same as a missing one.
    pub async fn get_for_user(&self, booking_id: i64, requester: &Identity) -> DomainResult<Booking> {
        self.repos
            .bookings()
            .find_by_id(booking_id)
            .await?
            .filter(|b| b.is_owned_by(requester.user_id))
            .ok_or_else(|| DomainError::not_found("Booking", booking_id))
    }
}
