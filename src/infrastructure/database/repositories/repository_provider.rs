//! SeaORM implementation of RepositoryProvider

use sea_orm::DatabaseConnection;

use crate::domain::booking::BookingRepository;
use crate::domain::repositories::RepositoryProvider;
use crate::domain::station::StationRepository;
use crate::domain::telemetry::TelemetryRepository;
use crate::domain::user::UserRepository;

use super::booking_repository::SeaOrmBookingRepository;
use super::station_repository::SeaOrmStationRepository;
use super::telemetry_repository::SeaOrmTelemetryRepository;
use super::user_repository::SeaOrmUserRepository;

/// Unified repository provider backed by SeaORM.
///
/// Holds one connection pool and exposes per-aggregate repository accessors.
///
/// ```ignore
/// let repos = SeaOrmRepositoryProvider::new(db.clone());
/// let station = repos.stations().find_by_id(7).await?;
/// let clash = repos.bookings().find_overlapping(7, window).await?;
/// ```
pub struct SeaOrmRepositoryProvider {
    stations: SeaOrmStationRepository,
    bookings: SeaOrmBookingRepository,
    telemetry: SeaOrmTelemetryRepository,
    users: SeaOrmUserRepository,
}

impl SeaOrmRepositoryProvider {
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            stations: SeaOrmStationRepository::new(db.clone()),
            bookings: SeaOrmBookingRepository::new(db.clone()),
            telemetry: SeaOrmTelemetryRepository::new(db.clone()),
            users: SeaOrmUserRepository::new(db),
        }
    }
}

impl RepositoryProvider for SeaOrmRepositoryProvider {
    fn stations(&self) -> &dyn StationRepository {
        &self.stations
    }

    fn bookings(&self) -> &dyn BookingRepository {
        &self.bookings
    }

    fn telemetry(&self) -> &dyn TelemetryRepository {
        &self.telemetry
    }

    fn users(&self) -> &dyn UserRepository {
        &self.users
    }
}
