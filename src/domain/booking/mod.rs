//! Booking aggregate
//!
//! Contains the Booking entity, the half-open time window it occupies and
//! the repository interface used by the booking engine.

pub mod model;
pub mod repository;

pub use model::{Booking, BookingStatus, NewBooking, TimeWindow};
pub use repository::BookingRepository;
