//! SeaORM implementation of TelemetryRepository

use async_trait::async_trait;
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, NotSet, QueryFilter, QueryOrder, QuerySelect,
    Set, TransactionTrait,
};
use tracing::debug;

use super::db_err;
use crate::domain::telemetry::TelemetryRepository;
use crate::domain::{DomainResult, NewTelemetrySample, TelemetrySample};
use crate::infrastructure::database::entities::station_telemetry;

pub struct SeaOrmTelemetryRepository {
    db: DatabaseConnection,
}

impl SeaOrmTelemetryRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

fn model_to_domain(m: station_telemetry::Model) -> TelemetrySample {
    TelemetrySample {
        id: m.id,
        station_id: m.station_id,
        voltage: m.voltage,
        current: m.current,
        temperature: m.temperature,
        timestamp: m.timestamp,
    }
}

fn to_active(s: NewTelemetrySample) -> station_telemetry::ActiveModel {
    station_telemetry::ActiveModel {
        id: NotSet,
        station_id: Set(s.station_id),
        voltage: Set(s.voltage),
        current: Set(s.current),
        temperature: Set(s.temperature),
        timestamp: Set(s.timestamp),
    }
}

#[async_trait]
impl TelemetryRepository for SeaOrmTelemetryRepository {
    async fn insert_batch(&self, samples: Vec<NewTelemetrySample>) -> DomainResult<usize> {
        let count = samples.len();
        if count == 0 {
            return Ok(0);
        }

        let txn = self.db.begin().await.map_err(db_err)?;
        station_telemetry::Entity::insert_many(samples.into_iter().map(to_active))
            .exec(&txn)
            .await
            .map_err(db_err)?;
        txn.commit().await.map_err(db_err)?;

        debug!(count, "Telemetry batch committed");
        Ok(count)
    }

    async fn recent_for_station(
        &self,
        station_id: i64,
        limit: u64,
    ) -> DomainResult<Vec<TelemetrySample>> {
        let models = station_telemetry::Entity::find()
            .filter(station_telemetry::Column::StationId.eq(station_id))
            .order_by_desc(station_telemetry::Column::Timestamp)
            .order_by_desc(station_telemetry::Column::Id)
            .limit(limit)
            .all(&self.db)
            .await
            .map_err(db_err)?;
        Ok(models.into_iter().map(model_to_domain).collect())
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone, Utc};

    use super::*;
    use crate::domain::station::StationRepository;
    use crate::domain::user::UserRepository;
    use crate::domain::{NewStation, UserRole};
    use crate::infrastructure::database::repositories::station_repository::SeaOrmStationRepository;
    use crate::infrastructure::database::repositories::user_repository::SeaOrmUserRepository;
    use crate::infrastructure::database::test_connection;

    fn sample(station_id: i64, minute: i64, voltage: f64) -> NewTelemetrySample {
        NewTelemetrySample {
            station_id,
            voltage,
            current: 32.0,
            temperature: 40.0,
            timestamp: Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap()
                + Duration::minutes(minute),
        }
    }

    #[tokio::test]
    async fn recent_is_newest_first_and_limited() {
        let db = test_connection().await;
        let owner = SeaOrmUserRepository::new(db.clone())
            .create("o@example.com", UserRole::StationOwner)
            .await
            .unwrap();
        let station = SeaOrmStationRepository::new(db.clone())
            .create(NewStation::active(owner.id, "S", 5.0))
            .await
            .unwrap();
        let repo = SeaOrmTelemetryRepository::new(db);

        let batch = (0..5).map(|m| sample(station.id, m, 200.0 + m as f64)).collect();
        assert_eq!(repo.insert_batch(batch).await.unwrap(), 5);

        let recent = repo.recent_for_station(station.id, 3).await.unwrap();
        let volts: Vec<f64> = recent.iter().map(|s| s.voltage).collect();
        assert_eq!(volts, vec![204.0, 203.0, 202.0]);
    }

    #[tokio::test]
    async fn empty_batch_writes_nothing() {
        let repo = SeaOrmTelemetryRepository::new(test_connection().await);
        assert_eq!(repo.insert_batch(Vec::new()).await.unwrap(), 0);
        assert!(repo.recent_for_station(1, 50).await.unwrap().is_empty());
    }
}
