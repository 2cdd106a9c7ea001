//! SeaORM implementation of BookingRepository

use async_trait::async_trait;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, NotSet, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use tracing::{debug, warn};

use super::{corrupt, db_err};
use crate::domain::booking::BookingRepository;
use crate::domain::{Booking, BookingStatus, DomainResult, NewBooking, TimeWindow};
use crate::infrastructure::database::entities::{booking, station};

pub struct SeaOrmBookingRepository {
    db: DatabaseConnection,
}

impl SeaOrmBookingRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

// ── Conversion helpers ──────────────────────────────────────────

fn model_to_domain(m: booking::Model) -> DomainResult<Booking> {
    Ok(Booking {
        id: m.id,
        user_id: m.user_id,
        station_id: m.station_id,
        start_time: m.start_time,
        end_time: m.end_time,
        status: m
            .status
            .parse::<BookingStatus>()
            .map_err(|e| corrupt("bookings.status", e))?,
        total_cost: m.total_cost,
        version: m.version,
        created_at: m.created_at,
    })
}

// ── BookingRepository impl ──────────────────────────────────────

#[async_trait]
impl BookingRepository for SeaOrmBookingRepository {
    async fn find_by_id(&self, id: i64) -> DomainResult<Option<Booking>> {
        booking::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(db_err)?
            .map(model_to_domain)
            .transpose()
    }

    async fn find_for_user(&self, user_id: i64) -> DomainResult<Vec<Booking>> {
        let models = booking::Entity::find()
            .filter(booking::Column::UserId.eq(user_id))
            .order_by_desc(booking::Column::StartTime)
            .order_by_desc(booking::Column::Id)
            .all(&self.db)
            .await
            .map_err(db_err)?;
        models.into_iter().map(model_to_domain).collect()
    }

    async fn find_for_stations(&self, station_ids: &[i64]) -> DomainResult<Vec<Booking>> {
        if station_ids.is_empty() {
            return Ok(Vec::new());
        }
        let models = booking::Entity::find()
            .filter(booking::Column::StationId.is_in(station_ids.iter().copied()))
            .order_by_asc(booking::Column::StartTime)
            .order_by_asc(booking::Column::Id)
            .all(&self.db)
            .await
            .map_err(db_err)?;
        models.into_iter().map(model_to_domain).collect()
    }

    async fn find_overlapping(
        &self,
        station_id: i64,
        window: TimeWindow,
    ) -> DomainResult<Option<Booking>> {
        booking::Entity::find()
            .filter(booking::Column::StationId.eq(station_id))
            .filter(booking::Column::Status.eq(BookingStatus::Confirmed.as_str()))
            .filter(booking::Column::StartTime.lt(window.end()))
            .filter(booking::Column::EndTime.gt(window.start()))
            .order_by_asc(booking::Column::StartTime)
            .one(&self.db)
            .await
            .map_err(db_err)?
            .map(model_to_domain)
            .transpose()
    }

    async fn commit_reservation(
        &self,
        expected_version: i32,
        b: NewBooking,
    ) -> DomainResult<Option<Booking>> {
        let txn = self.db.begin().await.map_err(db_err)?;

        let cas = station::Entity::update_many()
            .col_expr(station::Column::Version, Expr::value(expected_version + 1))
            .filter(station::Column::Id.eq(b.station_id))
            .filter(station::Column::Version.eq(expected_version))
            .exec(&txn)
            .await
            .map_err(db_err)?;

        if cas.rows_affected == 0 {
            debug!(
                station_id = b.station_id,
                expected_version, "Station version moved, reservation lost"
            );
            txn.rollback().await.map_err(db_err)?;
            return Ok(None);
        }

        let model = booking::ActiveModel {
            id: NotSet,
            user_id: Set(b.user_id),
            station_id: Set(b.station_id),
            start_time: Set(b.window.start()),
            end_time: Set(b.window.end()),
            total_cost: Set(b.total_cost),
            status: Set(BookingStatus::Confirmed.as_str().to_string()),
            version: Set(Booking::INITIAL_VERSION),
            created_at: Set(b.created_at),
        };

        // dropping an uncommitted txn rolls back the version bump
        let saved = match model.insert(&txn).await {
            Ok(saved) => saved,
            Err(e) => {
                warn!(station_id = b.station_id, error = %e, "Booking insert failed, rolling back");
                return Err(db_err(e));
            }
        };

        txn.commit().await.map_err(db_err)?;
        model_to_domain(saved).map(Some)
    }

    async fn transition_status(
        &self,
        id: i64,
        from: BookingStatus,
        to: BookingStatus,
    ) -> DomainResult<bool> {
        let result = booking::Entity::update_many()
            .col_expr(booking::Column::Status, Expr::value(to.as_str()))
            .filter(booking::Column::Id.eq(id))
            .filter(booking::Column::Status.eq(from.as_str()))
            .exec(&self.db)
            .await
            .map_err(db_err)?;
        Ok(result.rows_affected == 1)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Duration, TimeZone, Utc};

    use super::*;
    use crate::domain::station::StationRepository;
    use crate::domain::user::UserRepository;
    use crate::domain::{NewStation, UserRole};
    use crate::infrastructure::database::repositories::station_repository::SeaOrmStationRepository;
    use crate::infrastructure::database::repositories::user_repository::SeaOrmUserRepository;
    use crate::infrastructure::database::test_connection;

    struct Fixture {
        bookings: SeaOrmBookingRepository,
        stations: SeaOrmStationRepository,
        driver: i64,
        station: i64,
    }

    async fn fixture() -> Fixture {
        let db = test_connection().await;
        let users = SeaOrmUserRepository::new(db.clone());
        let owner = users.create("owner@example.com", UserRole::StationOwner).await.unwrap();
        let driver = users.create("driver@example.com", UserRole::Driver).await.unwrap();
        let stations = SeaOrmStationRepository::new(db.clone());
        let station = stations
            .create(NewStation::active(owner.id, "Depot", 10.0))
            .await
            .unwrap();
        Fixture {
            bookings: SeaOrmBookingRepository::new(db),
            stations,
            driver: driver.id,
            station: station.id,
        }
    }

    fn at(h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, h, 0, 0).unwrap()
    }

    fn new_booking(f: &Fixture, from: u32, to: u32) -> NewBooking {
        NewBooking {
            user_id: f.driver,
            station_id: f.station,
            window: TimeWindow::new(at(from), at(to)).unwrap(),
            total_cost: 10.0 * (to - from) as f64,
            created_at: at(0),
        }
    }

    #[tokio::test]
    async fn commit_bumps_version_and_inserts() {
        let f = fixture().await;
        let booking = f
            .bookings
            .commit_reservation(1, new_booking(&f, 10, 12))
            .await
            .unwrap()
            .expect("cas should win");

        assert_eq!(booking.status, BookingStatus::Confirmed);
        assert_eq!(booking.version, 1);
        assert_eq!(booking.total_cost, 20.0);
        let station = f.stations.find_by_id(f.station).await.unwrap().unwrap();
        assert_eq!(station.version, 2);
    }

    #[tokio::test]
    async fn stale_version_writes_nothing() {
        let f = fixture().await;
        f.bookings.commit_reservation(1, new_booking(&f, 10, 12)).await.unwrap();

        let lost = f
            .bookings
            .commit_reservation(1, new_booking(&f, 14, 15))
            .await
            .unwrap();
        assert!(lost.is_none());
        assert_eq!(f.bookings.find_for_user(f.driver).await.unwrap().len(), 1);
        let station = f.stations.find_by_id(f.station).await.unwrap().unwrap();
        assert_eq!(station.version, 2);
    }

    #[tokio::test]
    async fn failed_insert_rolls_back_version() {
        let f = fixture().await;
        let mut b = new_booking(&f, 10, 12);
        // violates the users foreign key
        b.user_id = 9_999;

        assert!(f.bookings.commit_reservation(1, b).await.is_err());
        let station = f.stations.find_by_id(f.station).await.unwrap().unwrap();
        assert_eq!(station.version, 1);
    }

    #[tokio::test]
    async fn overlap_query_uses_half_open_windows() {
        let f = fixture().await;
        f.bookings.commit_reservation(1, new_booking(&f, 10, 12)).await.unwrap();

        let touching = TimeWindow::new(at(12), at(13)).unwrap();
        assert!(f.bookings.find_overlapping(f.station, touching).await.unwrap().is_none());

        let straddling = TimeWindow::new(at(11), at(13)).unwrap();
        assert!(f.bookings.find_overlapping(f.station, straddling).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn cancelled_bookings_stop_blocking() {
        let f = fixture().await;
        let b = f
            .bookings
            .commit_reservation(1, new_booking(&f, 10, 12))
            .await
            .unwrap()
            .unwrap();

        assert!(f
            .bookings
            .transition_status(b.id, BookingStatus::Confirmed, BookingStatus::Cancelled)
            .await
            .unwrap());
        // second transition from confirmed matches nothing
        assert!(!f
            .bookings
            .transition_status(b.id, BookingStatus::Confirmed, BookingStatus::Cancelled)
            .await
            .unwrap());

        let window = TimeWindow::new(at(10), at(12)).unwrap();
        assert!(f.bookings.find_overlapping(f.station, window).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn user_bookings_are_newest_start_first() {
        let f = fixture().await;
        f.bookings.commit_reservation(1, new_booking(&f, 8, 9)).await.unwrap();
        f.bookings.commit_reservation(2, new_booking(&f, 15, 16)).await.unwrap();

        let list = f.bookings.find_for_user(f.driver).await.unwrap();
        assert_eq!(list[0].start_time, at(15));
        assert_eq!(list[1].start_time, at(8));
    }

    #[tokio::test]
    async fn station_bookings_span_statuses_oldest_first() {
        let f = fixture().await;
        f.bookings.commit_reservation(1, new_booking(&f, 15, 16)).await.unwrap();
        let early = f
            .bookings
            .commit_reservation(2, new_booking(&f, 8, 9))
            .await
            .unwrap()
            .unwrap();
        f.bookings
            .transition_status(early.id, BookingStatus::Confirmed, BookingStatus::Completed)
            .await
            .unwrap();

        let list = f.bookings.find_for_stations(&[f.station]).await.unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list[0].status, BookingStatus::Completed);
        assert_eq!(list[1].start_time, at(15));

        assert!(f.bookings.find_for_stations(&[f.station + 1]).await.unwrap().is_empty());
        assert!(f.bookings.find_for_stations(&[]).await.unwrap().is_empty());
    }
}
