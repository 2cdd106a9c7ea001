//! WebSocket push channels for station owners and administrators

pub mod push;

pub use push::{ws_admin_alerts, ws_owner_telemetry, TokenQuery};
