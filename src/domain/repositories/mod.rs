//! Repository provider
//!
//! One object hands out every per-aggregate repository so services take a
//! single `Arc<dyn RepositoryProvider>`.

use super::booking::BookingRepository;
use super::station::StationRepository;
use super::telemetry::TelemetryRepository;
use super::user::UserRepository;

pub trait RepositoryProvider: Send + Sync {
    fn stations(&self) -> &dyn StationRepository;
    fn bookings(&self) -> &dyn BookingRepository;
    fn telemetry(&self) -> &dyn TelemetryRepository;
    fn users(&self) -> &dyn UserRepository;
}
