//! Push fan-out to connected owner and admin sessions

pub mod connection;
pub mod hub;
pub mod messages;
pub mod registry;

pub use connection::{AdmissionError, Channel, Connection, ConnectionState};
pub use hub::{FanoutHub, SharedFanoutHub};
pub use messages::{CriticalFaultAlert, OwnerTelemetryPush};
pub use registry::{DeliveryReport, SubscriberRegistry, Subscription};
