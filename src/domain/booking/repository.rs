//! Booking repository interface

use async_trait::async_trait;

use super::model::{Booking, BookingStatus, NewBooking, TimeWindow};
use crate::domain::DomainResult;

#[async_trait]
pub trait BookingRepository: Send + Sync {
    async fn find_by_id(&self, id: i64) -> DomainResult<Option<Booking>>;

    /// Bookings made by a user, most recent start first
    async fn find_for_user(&self, user_id: i64) -> DomainResult<Vec<Booking>>;

    /// Every booking on any of the given stations, oldest start first
    async fn find_for_stations(&self, station_ids: &[i64]) -> DomainResult<Vec<Booking>>;

    /// Any `confirmed` booking on the station intersecting `window`
    async fn find_overlapping(
        &self,
        station_id: i64,
        window: TimeWindow,
    ) -> DomainResult<Option<Booking>>;

    /// Bump the station version from `expected_version` and insert the
    /// booking as one unit.
    ///
    /// `Ok(None)` means the version CAS matched no row; nothing was written.
    /// If the insert fails the version bump is rolled back with it.
    async fn commit_reservation(
        &self,
        expected_version: i32,
        booking: NewBooking,
    ) -> DomainResult<Option<Booking>>;

    /// Conditional status write: applies only while the stored status is
    /// still `from`. Returns whether a row changed.
    async fn transition_status(
        &self,
        id: i64,
        from: BookingStatus,
        to: BookingStatus,
    ) -> DomainResult<bool>;
}
