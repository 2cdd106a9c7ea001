//! # EcoCharge
//!
//! Booking and telemetry backend for EV charging stations.
//!
//! ## Architecture
//!
//! - **domain**: entities, invariants and the store / identity contracts
//! - **application**: booking engine, health assessment, telemetry job, push fan-out
//! - **infrastructure**: SeaORM persistence, in-memory store, JWT identity
//! - **interfaces**: REST API (axum + Swagger) and WebSocket push channels
//! - **server**: lifecycle wiring used by the CLI
//! - **support**: errors, clock and shutdown primitives

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod interfaces;
pub mod server;
pub mod support;

pub use config::{default_config_path, AppConfig, ConfigError};
pub use domain::{DomainError, DomainResult};
pub use infrastructure::{init_database, DatabaseConfig, InMemoryStore, SeaOrmRepositoryProvider};
pub use interfaces::create_api_router;
pub use server::{init_tracing, ServerError, ServerHandle, ServerOptions};
