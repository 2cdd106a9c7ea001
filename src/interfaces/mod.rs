//! Outward surfaces: REST API and WebSocket push channels

pub mod http;
pub mod ws;

pub use http::{create_api_router, AppState};
