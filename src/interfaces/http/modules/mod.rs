//! Route modules, one per resource

pub mod admin;
pub mod bookings;
pub mod driver;
pub mod health;
pub mod metrics;
pub mod owner;
pub mod stations;
pub mod request_id;
