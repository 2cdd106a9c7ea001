//! Telemetry repository interface

use async_trait::async_trait;

use super::model::{NewTelemetrySample, TelemetrySample};
use crate::domain::DomainResult;

#[async_trait]
pub trait TelemetryRepository: Send + Sync {
    /// Persist a whole run in one transaction; on error nothing is written.
    async fn insert_batch(&self, samples: Vec<NewTelemetrySample>) -> DomainResult<usize>;

    /// Up to `limit` samples for the station, newest first
    async fn recent_for_station(
        &self,
        station_id: i64,
        limit: u64,
    ) -> DomainResult<Vec<TelemetrySample>>;
}
