//! Station aggregate
//!
//! Holds the optimistic-locking `version` that serializes reservations.

pub mod model;
pub mod repository;

pub use model::{NewStation, Station, StationStatus};
pub use repository::StationRepository;
