//! Application services: booking, health, telemetry and push fan-out

pub mod booking;
pub mod fanout;
pub mod health;
pub mod telemetry;

pub use booking::{Availability, BookingEngine, OwnerAnalytics, StationAvailability};
pub use fanout::{AdmissionError, Channel, Connection, FanoutHub, SharedFanoutHub, Subscription};
pub use health::{BaselineDetector, HealthService};
pub use telemetry::{TelemetryGenerator, TelemetrySampler};
