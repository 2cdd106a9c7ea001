//! Shared handler state

use std::sync::Arc;
use std::time::Instant;

use axum::extract::FromRef;
use sea_orm::DatabaseConnection;

use super::middleware::AuthState;
use crate::application::{BookingEngine, HealthService, SharedFanoutHub};
use crate::domain::{IdentityProvider, RepositoryProvider};

#[derive(Clone)]
pub struct AppState {
    pub repos: Arc<dyn RepositoryProvider>,
    pub bookings: Arc<BookingEngine>,
    pub health: Arc<HealthService>,
    pub hub: SharedFanoutHub,
    pub identities: Arc<dyn IdentityProvider>,
    /// Present when backed by a database; pinged by `/health`
    pub db: Option<DatabaseConnection>,
    pub started_at: Arc<Instant>,
}

impl FromRef<AppState> for AuthState {
    fn from_ref(s: &AppState) -> Self {
        AuthState {
            identities: s.identities.clone(),
        }
    }
}
