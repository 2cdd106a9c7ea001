//! Telemetry samples (append-only, read newest-first)

pub mod model;
pub mod repository;

pub use model::{NewTelemetrySample, TelemetrySample};
pub use repository::TelemetryRepository;
