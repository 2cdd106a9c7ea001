//! Station health: the default detector and the store-backed service

pub mod detector;
pub mod service;

pub use detector::BaselineDetector;
pub use service::{HealthService, MAX_HISTORY_WINDOW};
