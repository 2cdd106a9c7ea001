//! Station domain entity

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Operational status of a station
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum StationStatus {
    Active,
    Maintenance,
    Offline,
}

impl StationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Maintenance => "maintenance",
            Self::Offline => "offline",
        }
    }
}

impl FromStr for StationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(Self::Active),
            "maintenance" => Ok(Self::Maintenance),
            "offline" => Ok(Self::Offline),
            other => Err(format!("unknown station status '{}'", other)),
        }
    }
}

impl std::fmt::Display for StationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Charging station
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Station {
    pub id: i64,
    /// User who registered the station and receives its telemetry
    pub owner_id: i64,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub status: StationStatus,
    pub price_per_hour: f64,
    pub price_per_kwh: Option<f64>,
    /// Optimistic lock. Starts at 1, bumped once per successful reservation.
    pub version: i32,
}

impl Station {
    pub const INITIAL_VERSION: i32 = 1;

    pub fn is_active(&self) -> bool {
        self.status == StationStatus::Active
    }

    pub fn is_owned_by(&self, user_id: i64) -> bool {
        self.owner_id == user_id
    }
}

/// Insert payload for a station (id and version are assigned by the store)
#[derive(Debug, Clone)]
pub struct NewStation {
    pub owner_id: i64,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub status: StationStatus,
    pub price_per_hour: f64,
    pub price_per_kwh: Option<f64>,
}

impl NewStation {
    pub fn active(owner_id: i64, name: impl Into<String>, price_per_hour: f64) -> Self {
        Self {
            owner_id,
            name: name.into(),
            latitude: 0.0,
            longitude: 0.0,
            status: StationStatus::Active,
            price_per_hour,
            price_per_kwh: None,
        }
    }

    pub fn at(mut self, latitude: f64, longitude: f64) -> Self {
        self.latitude = latitude;
        self.longitude = longitude;
        self
    }

    pub fn with_status(mut self, status: StationStatus) -> Self {
        self.status = status;
        self
    }

    pub fn into_station(self, id: i64) -> Station {
        Station {
            id,
            owner_id: self.owner_id,
            name: self.name,
            latitude: self.latitude,
            longitude: self.longitude,
            status: self.status,
            price_per_hour: self.price_per_hour,
            price_per_kwh: self.price_per_kwh,
            version: Station::INITIAL_VERSION,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_station_starts_at_initial_version() {
        let station = NewStation::active(9, "Depot A", 12.5).into_station(3);
        assert_eq!(station.version, 1);
        assert!(station.is_active());
        assert!(station.is_owned_by(9));
        assert!(!station.is_owned_by(10));
    }

    #[test]
    fn status_parses_lowercase_names() {
        assert_eq!("maintenance".parse::<StationStatus>(), Ok(StationStatus::Maintenance));
        assert!("Active".parse::<StationStatus>().is_err());
    }

    #[test]
    fn status_serializes_snake_case() {
        let json = serde_json::to_string(&StationStatus::Offline).unwrap();
        assert_eq!(json, "\"offline\"");
    }
}
