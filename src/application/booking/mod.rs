//! Booking engine: optimistic reservation, cancellation, availability and
//! owner revenue

pub mod analytics;
pub mod engine;
pub mod pricing;

pub use analytics::{DailyRevenue, OwnerAnalytics, RevenueSummary, StationUsage};
pub use engine::{Availability, BookingEngine, StationAvailability};
pub use pricing::booking_cost;
