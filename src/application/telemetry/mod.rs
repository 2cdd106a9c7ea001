//! Synthetic telemetry: sampling, the single-flight guard and the periodic job

pub mod generator;
pub mod sampler;
pub mod single_flight;

pub use generator::{log_run_failures, RunFailure, RunOutcome, RunReport, TelemetryGenerator};
pub use sampler::{Fault, Reading, TelemetrySampler};
pub use single_flight::{FlightGuard, SingleFlight};
