//! Database repository implementations
//!
//! Per-aggregate SeaORM repositories + unified RepositoryProvider.

pub mod booking_repository;
pub mod repository_provider;
pub mod station_repository;
pub mod telemetry_repository;
pub mod user_repository;

pub use repository_provider::SeaOrmRepositoryProvider;

use crate::domain::DomainError;

pub(crate) fn db_err(e: sea_orm::DbErr) -> DomainError {
    DomainError::from(e)
}

/// A stored enum column that no longer parses is a store fault, not a
/// caller error.
pub(crate) fn corrupt(column: &str, detail: String) -> DomainError {
    DomainError::DependencyUnavailable(format!("corrupt {} column: {}", column, detail))
}
