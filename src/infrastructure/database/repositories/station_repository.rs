//! SeaORM implementation of StationRepository

use async_trait::async_trait;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, NotSet, QueryFilter,
    QueryOrder, Set,
};
use tracing::debug;

use super::{corrupt, db_err};
use crate::domain::station::StationRepository;
use crate::domain::{DomainError, DomainResult, NewStation, Station, StationStatus};
use crate::infrastructure::database::entities::station;

pub struct SeaOrmStationRepository {
    db: DatabaseConnection,
}

impl SeaOrmStationRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

// ── Conversion helpers ──────────────────────────────────────────

pub(crate) fn model_to_domain(m: station::Model) -> DomainResult<Station> {
    Ok(Station {
        id: m.id,
        owner_id: m.owner_id,
        status: m
            .status
            .parse::<StationStatus>()
            .map_err(|e| corrupt("stations.status", e))?,
        name: m.name,
        latitude: m.location_lat,
        longitude: m.location_lng,
        price_per_hour: m.price_per_hour,
        price_per_kwh: m.price_per_kwh,
        version: m.version,
    })
}

fn collect(models: Vec<station::Model>) -> DomainResult<Vec<Station>> {
    models.into_iter().map(model_to_domain).collect()
}

// ── StationRepository impl ──────────────────────────────────────

#[async_trait]
impl StationRepository for SeaOrmStationRepository {
    async fn find_by_id(&self, id: i64) -> DomainResult<Option<Station>> {
        station::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(db_err)?
            .map(model_to_domain)
            .transpose()
    }

    async fn find_all(&self) -> DomainResult<Vec<Station>> {
        let models = station::Entity::find()
            .order_by_asc(station::Column::Id)
            .all(&self.db)
            .await
            .map_err(db_err)?;
        collect(models)
    }

    async fn find_active(&self) -> DomainResult<Vec<Station>> {
        let models = station::Entity::find()
            .filter(station::Column::Status.eq(StationStatus::Active.as_str()))
            .order_by_asc(station::Column::Id)
            .all(&self.db)
            .await
            .map_err(db_err)?;
        collect(models)
    }

    async fn find_by_owner(&self, owner_id: i64) -> DomainResult<Vec<Station>> {
        let models = station::Entity::find()
            .filter(station::Column::OwnerId.eq(owner_id))
            .order_by_asc(station::Column::Id)
            .all(&self.db)
            .await
            .map_err(db_err)?;
        collect(models)
    }

    async fn create(&self, s: NewStation) -> DomainResult<Station> {
        debug!(owner_id = s.owner_id, name = %s.name, "Creating station");
        let model = station::ActiveModel {
            id: NotSet,
            owner_id: Set(s.owner_id),
            name: Set(s.name),
            location_lat: Set(s.latitude),
            location_lng: Set(s.longitude),
            status: Set(s.status.as_str().to_string()),
            price_per_hour: Set(s.price_per_hour),
            price_per_kwh: Set(s.price_per_kwh),
            version: Set(Station::INITIAL_VERSION),
        };
        let saved = model.insert(&self.db).await.map_err(db_err)?;
        model_to_domain(saved)
    }

    async fn update_status(&self, id: i64, status: StationStatus) -> DomainResult<()> {
        let existing = station::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(db_err)?
            .ok_or_else(|| DomainError::not_found("Station", id))?;

        let mut model: station::ActiveModel = existing.into();
        model.status = Set(status.as_str().to_string());
        model.update(&self.db).await.map_err(db_err)?;
        Ok(())
    }

    async fn compare_and_swap_version(
        &self,
        id: i64,
        expected_version: i32,
        new_version: i32,
    ) -> DomainResult<bool> {
        let result = station::Entity::update_many()
            .col_expr(station::Column::Version, Expr::value(new_version))
            .filter(station::Column::Id.eq(id))
            .filter(station::Column::Version.eq(expected_version))
            .exec(&self.db)
            .await
            .map_err(db_err)?;
        Ok(result.rows_affected == 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::user::UserRepository;
    use crate::domain::UserRole;
    use crate::infrastructure::database::repositories::user_repository::SeaOrmUserRepository;
    use crate::infrastructure::database::test_connection;

    async fn setup() -> (SeaOrmStationRepository, i64) {
        let db = test_connection().await;
        let owner = SeaOrmUserRepository::new(db.clone())
            .create("owner@example.com", UserRole::StationOwner)
            .await
            .unwrap();
        (SeaOrmStationRepository::new(db), owner.id)
    }

    #[tokio::test]
    async fn create_starts_at_version_one() {
        let (repo, owner) = setup().await;
        let s = repo
            .create(NewStation::active(owner, "Depot", 10.0).at(41.3, 69.2))
            .await
            .unwrap();
        assert_eq!(s.version, 1);
        assert_eq!(s.latitude, 41.3);
        assert_eq!(repo.find_by_owner(owner).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn cas_only_wins_on_expected_version() {
        let (repo, owner) = setup().await;
        let s = repo.create(NewStation::active(owner, "Depot", 10.0)).await.unwrap();

        assert!(repo.compare_and_swap_version(s.id, 1, 2).await.unwrap());
        assert!(!repo.compare_and_swap_version(s.id, 1, 2).await.unwrap());

        let reloaded = repo.find_by_id(s.id).await.unwrap().unwrap();
        assert_eq!(reloaded.version, 2);
    }

    #[tokio::test]
    async fn find_active_skips_maintenance() {
        let (repo, owner) = setup().await;
        repo.create(NewStation::active(owner, "A", 10.0)).await.unwrap();
        let b = repo.create(NewStation::active(owner, "B", 10.0)).await.unwrap();
        repo.update_status(b.id, StationStatus::Maintenance).await.unwrap();

        let active = repo.find_active().await.unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].name, "A");
        assert_eq!(repo.find_all().await.unwrap().len(), 2);
    }
}
