//! Domain layer: entities, invariants and the store contracts they rely on.

pub mod booking;
pub mod health;
pub mod repositories;
pub mod station;
pub mod telemetry;
pub mod user;

pub use booking::{Booking, BookingStatus, NewBooking, TimeWindow};
pub use health::{AnomalyDetector, HealthAssessment, RiskLevel};
pub use repositories::RepositoryProvider;
pub use station::{NewStation, Station, StationStatus};
pub use telemetry::{NewTelemetrySample, TelemetrySample};
pub use user::{Identity, IdentityError, IdentityProvider, User, UserRole};

pub use crate::support::errors::{DomainError, DomainResult};
