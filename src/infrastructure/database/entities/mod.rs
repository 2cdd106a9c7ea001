//! Database entities module

pub mod booking;
pub mod station;
pub mod station_telemetry;
pub mod user;

pub use booking::Entity as Booking;
pub use station::Entity as Station;
pub use station_telemetry::Entity as StationTelemetry;
pub use user::Entity as User;
