//! Owner revenue and usage
//!
//! Read-only sums over the bookings of an owner's stations. `completed`
//! bookings count as realised revenue, `confirmed` ones as booked revenue;
//! cancelled bookings are counted but never summed.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::NaiveDate;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{Booking, BookingStatus, DomainError, DomainResult, RepositoryProvider};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct StationUsage {
    pub station_id: i64,
    pub name: String,
    pub completed_bookings: u64,
    pub active_bookings: u64,
    pub cancelled_bookings: u64,
    pub booked_hours: f64,
    pub revenue: f64,
    pub booked_revenue: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct RevenueSummary {
    /// Sum over `completed` bookings
    pub total_revenue: f64,
    /// Sum over still `confirmed` bookings
    pub booked_revenue: f64,
    pub completed_bookings: u64,
    pub active_bookings: u64,
    pub stations: Vec<StationUsage>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct DailyRevenue {
    /// UTC date of the booking's end
    pub date: NaiveDate,
    pub revenue: f64,
    pub completed_bookings: u64,
}

#[derive(Default)]
struct Tally {
    completed: u64,
    active: u64,
    cancelled: u64,
    booked_minutes: i64,
    revenue: Decimal,
    booked: Decimal,
}

impl Tally {
    fn add(&mut self, booking: &Booking) -> DomainResult<()> {
        match booking.status {
            BookingStatus::Completed => {
                self.completed += 1;
                self.revenue += money(booking.total_cost)?;
                self.booked_minutes += booking.window().duration().num_minutes();
            }
            BookingStatus::Confirmed => {
                self.active += 1;
                self.booked += money(booking.total_cost)?;
                self.booked_minutes += booking.window().duration().num_minutes();
            }
            BookingStatus::Cancelled => self.cancelled += 1,
        }
        Ok(())
    }
}

fn money(cost: f64) -> DomainResult<Decimal> {
    Decimal::try_from(cost).map_err(|e| {
        DomainError::DependencyUnavailable(format!("corrupt bookings.total_cost {}: {}", cost, e))
    })
}

fn to_f64(d: Decimal) -> f64 {
    d.round_dp(2).to_f64().unwrap_or(0.0)
}

pub struct OwnerAnalytics {
    repos: Arc<dyn RepositoryProvider>,
}

impl OwnerAnalytics {
    pub fn new(repos: Arc<dyn RepositoryProvider>) -> Self {
        Self { repos }
    }

    /// All-time totals plus a per-station breakdown, in station id order
    pub async fn revenue_summary(&self, owner_id: i64) -> DomainResult<RevenueSummary> {
        let mut stations = self.repos.stations().find_by_owner(owner_id).await?;
        stations.sort_by_key(|s| s.id);
        let ids: Vec<i64> = stations.iter().map(|s| s.id).collect();
        let bookings = self.repos.bookings().find_for_stations(&ids).await?;

        let mut per_station: BTreeMap<i64, Tally> = BTreeMap::new();
        for booking in &bookings {
            per_station.entry(booking.station_id).or_default().add(booking)?;
        }

        let mut total = Tally::default();
        let mut usage = Vec::with_capacity(stations.len());
        for station in stations {
            let tally = per_station.remove(&station.id).unwrap_or_default();
            total.completed += tally.completed;
            total.active += tally.active;
            total.revenue += tally.revenue;
            total.booked += tally.booked;
            usage.push(StationUsage {
                station_id: station.id,
                name: station.name,
                completed_bookings: tally.completed,
                active_bookings: tally.active,
                cancelled_bookings: tally.cancelled,
                booked_hours: tally.booked_minutes as f64 / 60.0,
                revenue: to_f64(tally.revenue),
                booked_revenue: to_f64(tally.booked),
            });
        }

        Ok(RevenueSummary {
            total_revenue: to_f64(total.revenue),
            booked_revenue: to_f64(total.booked),
            completed_bookings: total.completed,
            active_bookings: total.active,
            stations: usage,
        })
    }

    /// Realised revenue grouped by end date, oldest first
    pub async fn daily_revenue(&self, owner_id: i64) -> DomainResult<Vec<DailyRevenue>> {
        let ids: Vec<i64> = self
            .repos
            .stations()
            .find_by_owner(owner_id)
            .await?
            .iter()
            .map(|s| s.id)
            .collect();

        let mut days: BTreeMap<NaiveDate, (Decimal, u64)> = BTreeMap::new();
        for booking in self.repos.bookings().find_for_stations(&ids).await? {
            if booking.status != BookingStatus::Completed {
                continue;
            }
            let day = days.entry(booking.end_time.date_naive()).or_default();
            day.0 += money(booking.total_cost)?;
            day.1 += 1;
        }

        Ok(days
            .into_iter()
            .map(|(date, (revenue, completed_bookings))| DailyRevenue {
                date,
                revenue: to_f64(revenue),
                completed_bookings,
            })
            .collect())
    }
}
