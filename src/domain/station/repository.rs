//! Station repository interface

use async_trait::async_trait;

use super::model::{NewStation, Station, StationStatus};
use crate::domain::DomainResult;

#[async_trait]
pub trait StationRepository: Send + Sync {
    async fn find_by_id(&self, id: i64) -> DomainResult<Option<Station>>;

    async fn find_all(&self) -> DomainResult<Vec<Station>>;

    /// Stations with status `active`, the telemetry generator's working set
    async fn find_active(&self) -> DomainResult<Vec<Station>>;

    async fn find_by_owner(&self, owner_id: i64) -> DomainResult<Vec<Station>>;

    async fn create(&self, station: NewStation) -> DomainResult<Station>;

    async fn update_status(&self, id: i64, status: StationStatus) -> DomainResult<()>;

    /// Atomically set `version = new_version` iff the stored version still
    /// equals `expected_version`. Returns whether a row was updated.
    async fn compare_and_swap_version(
        &self,
        id: i64,
        expected_version: i32,
        new_version: i32,
    ) -> DomainResult<bool>;
}
