//! In-memory storage implementation
//!
//! A single lock guards every table so the multi-row operations
//! (`commit_reservation`, `insert_batch`) are atomic the same way a database
//! transaction is. Used for development and in tests.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::booking::{Booking, BookingRepository, BookingStatus, NewBooking, TimeWindow};
use crate::domain::station::{NewStation, Station, StationRepository, StationStatus};
use crate::domain::telemetry::{NewTelemetrySample, TelemetryRepository, TelemetrySample};
use crate::domain::user::{User, UserRepository, UserRole};
use crate::domain::{DomainError, DomainResult, RepositoryProvider};

#[derive(Default)]
struct Tables {
    stations: BTreeMap<i64, Station>,
    bookings: BTreeMap<i64, Booking>,
    telemetry: Vec<TelemetrySample>,
    users: BTreeMap<i64, User>,
    next_station_id: i64,
    next_booking_id: i64,
    next_telemetry_id: i64,
    next_user_id: i64,
}

fn next(counter: &mut i64) -> i64 {
    *counter += 1;
    *counter
}

/// In-memory store implementing every repository
#[derive(Default)]
pub struct InMemoryStore {
    tables: RwLock<Tables>,
    fail_booking_inserts: AtomicBool,
    fail_telemetry_writes: AtomicBool,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the booking insert inside `commit_reservation` fail
    pub fn fail_booking_inserts(&self, fail: bool) {
        self.fail_booking_inserts.store(fail, Ordering::SeqCst);
    }

    /// Make `insert_batch` fail
    pub fn fail_telemetry_writes(&self, fail: bool) {
        self.fail_telemetry_writes.store(fail, Ordering::SeqCst);
    }

    pub async fn telemetry_len(&self) -> usize {
        self.tables.read().await.telemetry.len()
    }

    pub async fn booking_count(&self) -> usize {
        self.tables.read().await.bookings.len()
    }
}

impl RepositoryProvider for InMemoryStore {
    fn stations(&self) -> &dyn StationRepository {
        self
    }

    fn bookings(&self) -> &dyn BookingRepository {
        self
    }

    fn telemetry(&self) -> &dyn TelemetryRepository {
        self
    }

    fn users(&self) -> &dyn UserRepository {
        self
    }
}

#[async_trait]
impl StationRepository for InMemoryStore {
    async fn find_by_id(&self, id: i64) -> DomainResult<Option<Station>> {
        Ok(self.tables.read().await.stations.get(&id).cloned())
    }

    async fn find_all(&self) -> DomainResult<Vec<Station>> {
        Ok(self.tables.read().await.stations.values().cloned().collect())
    }

    async fn find_active(&self) -> DomainResult<Vec<Station>> {
        let tables = self.tables.read().await;
        Ok(tables
            .stations
            .values()
            .filter(|s| s.is_active())
            .cloned()
            .collect())
    }

    async fn find_by_owner(&self, owner_id: i64) -> DomainResult<Vec<Station>> {
        let tables = self.tables.read().await;
        Ok(tables
            .stations
            .values()
            .filter(|s| s.is_owned_by(owner_id))
            .cloned()
            .collect())
    }

    async fn create(&self, station: NewStation) -> DomainResult<Station> {
        let mut tables = self.tables.write().await;
        let id = next(&mut tables.next_station_id);
        let station = station.into_station(id);
        tables.stations.insert(id, station.clone());
        Ok(station)
    }

    async fn update_status(&self, id: i64, status: StationStatus) -> DomainResult<()> {
        let mut tables = self.tables.write().await;
        let station = tables
            .stations
            .get_mut(&id)
            .ok_or_else(|| DomainError::not_found("Station", id))?;
        station.status = status;
        Ok(())
    }

    async fn compare_and_swap_version(
        &self,
        id: i64,
        expected_version: i32,
        new_version: i32,
    ) -> DomainResult<bool> {
        let mut tables = self.tables.write().await;
        match tables.stations.get_mut(&id) {
            Some(station) if station.version == expected_version => {
                station.version = new_version;
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

#[async_trait]
impl BookingRepository for InMemoryStore {
    async fn find_by_id(&self, id: i64) -> DomainResult<Option<Booking>> {
        Ok(self.tables.read().await.bookings.get(&id).cloned())
    }

    async fn find_for_user(&self, user_id: i64) -> DomainResult<Vec<Booking>> {
        let tables = self.tables.read().await;
        let mut bookings: Vec<Booking> = tables
            .bookings
            .values()
            .filter(|b| b.is_owned_by(user_id))
            .cloned()
            .collect();
        bookings.sort_by(|a, b| b.start_time.cmp(&a.start_time));
        Ok(bookings)
    }

    async fn find_for_stations(&self, station_ids: &[i64]) -> DomainResult<Vec<Booking>> {
        let tables = self.tables.read().await;
        let mut bookings: Vec<Booking> = tables
            .bookings
            .values()
            .filter(|b| station_ids.contains(&b.station_id))
            .cloned()
            .collect();
        bookings.sort_by(|a, b| a.start_time.cmp(&b.start_time).then(a.id.cmp(&b.id)));
        Ok(bookings)
    }

    async fn find_overlapping(
        &self,
        station_id: i64,
        window: TimeWindow,
    ) -> DomainResult<Option<Booking>> {
        let tables = self.tables.read().await;
        Ok(tables
            .bookings
            .values()
            .find(|b| b.station_id == station_id && b.blocks(&window))
            .cloned())
    }

    async fn commit_reservation(
        &self,
        expected_version: i32,
        booking: NewBooking,
    ) -> DomainResult<Option<Booking>> {
        let mut tables = self.tables.write().await;

        let version_matches = tables
            .stations
            .get(&booking.station_id)
            .is_some_and(|s| s.version == expected_version);
        if !version_matches {
            return Ok(None);
        }

        // Fail before touching anything: equivalent to rolling both writes back.
        if self.fail_booking_inserts.load(Ordering::SeqCst) {
            return Err(DomainError::DependencyUnavailable(
                "booking insert failed".to_string(),
            ));
        }

        if let Some(station) = tables.stations.get_mut(&booking.station_id) {
            station.version = expected_version + 1;
        }
        let id = next(&mut tables.next_booking_id);
        let booking = booking.into_booking(id);
        tables.bookings.insert(id, booking.clone());
        Ok(Some(booking))
    }

    async fn transition_status(
        &self,
        id: i64,
        from: BookingStatus,
        to: BookingStatus,
    ) -> DomainResult<bool> {
        let mut tables = self.tables.write().await;
        match tables.bookings.get_mut(&id) {
            Some(booking) if booking.status == from => {
                booking.status = to;
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

#[async_trait]
impl TelemetryRepository for InMemoryStore {
    async fn insert_batch(&self, samples: Vec<NewTelemetrySample>) -> DomainResult<usize> {
        if self.fail_telemetry_writes.load(Ordering::SeqCst) {
            return Err(DomainError::DependencyUnavailable(
                "telemetry batch write failed".to_string(),
            ));
        }

        let mut tables = self.tables.write().await;
        let count = samples.len();
        for sample in samples {
            let id = next(&mut tables.next_telemetry_id);
            tables.telemetry.push(sample.into_sample(id));
        }
        Ok(count)
    }

    async fn recent_for_station(
        &self,
        station_id: i64,
        limit: u64,
    ) -> DomainResult<Vec<TelemetrySample>> {
        let tables = self.tables.read().await;
        let mut samples: Vec<TelemetrySample> = tables
            .telemetry
            .iter()
            .filter(|s| s.station_id == station_id)
            .cloned()
            .collect();
        // Ties on timestamp fall back to insertion order.
        samples.sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then(b.id.cmp(&a.id)));
        samples.truncate(limit as usize);
        Ok(samples)
    }
}

#[async_trait]
impl UserRepository for InMemoryStore {
    async fn find_by_id(&self, id: i64) -> DomainResult<Option<User>> {
        Ok(self.tables.read().await.users.get(&id).cloned())
    }

    async fn create(&self, email: &str, role: UserRole) -> DomainResult<User> {
        let mut tables = self.tables.write().await;
        if tables.users.values().any(|u| u.email == email) {
            return Err(DomainError::Validation(format!(
                "email '{}' is already registered",
                email
            )));
        }
        let id = next(&mut tables.next_user_id);
        let user = User {
            id,
            email: email.to_string(),
            role,
            is_active: true,
        };
        tables.users.insert(id, user.clone());
        Ok(user)
    }

    async fn set_active(&self, id: i64, is_active: bool) -> DomainResult<()> {
        let mut tables = self.tables.write().await;
        let user = tables
            .users
            .get_mut(&id)
            .ok_or_else(|| DomainError::not_found("User", id))?;
        user.is_active = is_active;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn window(start_h: u32, end_h: u32) -> TimeWindow {
        let day = Utc.with_ymd_and_hms(2026, 6, 1, 0, 0, 0).unwrap();
        TimeWindow::new(
            day + Duration::hours(start_h as i64),
            day + Duration::hours(end_h as i64),
        )
        .unwrap()
    }

    fn new_booking(station_id: i64, w: TimeWindow) -> NewBooking {
        NewBooking {
            user_id: 1,
            station_id,
            window: w,
            total_cost: 5.0,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn cas_only_matches_current_version() {
        let store = InMemoryStore::new();
        let station = store
            .stations()
            .create(NewStation::active(1, "S", 10.0))
            .await
            .unwrap();

        assert!(!store.compare_and_swap_version(station.id, 7, 8).await.unwrap());
        assert!(store.compare_and_swap_version(station.id, 1, 2).await.unwrap());
        assert!(!store.compare_and_swap_version(station.id, 1, 2).await.unwrap());
        assert!(!store.compare_and_swap_version(999, 1, 2).await.unwrap());
    }

    #[tokio::test]
    async fn stale_version_writes_nothing() {
        let store = InMemoryStore::new();
        let station = store
            .stations()
            .create(NewStation::active(1, "S", 10.0))
            .await
            .unwrap();

        let outcome = store
            .commit_reservation(5, new_booking(station.id, window(10, 11)))
            .await
            .unwrap();
        assert!(outcome.is_none());
        assert_eq!(store.booking_count().await, 0);
    }

    #[tokio::test]
    async fn failed_insert_leaves_version_untouched() {
        let store = InMemoryStore::new();
        let station = store
            .stations()
            .create(NewStation::active(1, "S", 10.0))
            .await
            .unwrap();
        store.fail_booking_inserts(true);

        let result = store
            .commit_reservation(1, new_booking(station.id, window(10, 11)))
            .await;
        assert!(matches!(result, Err(DomainError::DependencyUnavailable(_))));

        let reloaded = StationRepository::find_by_id(&store, station.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(reloaded.version, 1);
        assert_eq!(store.booking_count().await, 0);
    }

    #[tokio::test]
    async fn recent_samples_are_newest_first_and_limited() {
        let store = InMemoryStore::new();
        let base = Utc.with_ymd_and_hms(2026, 6, 1, 12, 0, 0).unwrap();
        let batch = (0..5)
            .map(|i| NewTelemetrySample {
                station_id: 1,
                voltage: 220.0 + i as f64,
                current: 32.0,
                temperature: 40.0,
                timestamp: base + Duration::seconds(i * 5),
            })
            .collect();
        store.insert_batch(batch).await.unwrap();

        let recent = store.recent_for_station(1, 3).await.unwrap();
        assert_eq!(recent.len(), 3);
        assert_eq!(recent[0].voltage, 224.0);
        assert_eq!(recent[2].voltage, 222.0);
    }

    #[tokio::test]
    async fn failed_batch_writes_no_samples() {
        let store = InMemoryStore::new();
        store.fail_telemetry_writes(true);
        let sample = NewTelemetrySample {
            station_id: 1,
            voltage: 220.0,
            current: 32.0,
            temperature: 40.0,
            timestamp: Utc::now(),
        };
        assert!(store.insert_batch(vec![sample.clone(), sample]).await.is_err());
        assert_eq!(store.telemetry_len().await, 0);
    }
}
