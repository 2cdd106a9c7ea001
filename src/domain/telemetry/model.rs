//! Telemetry sample entity

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// One charger sensor reading. Immutable once written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct TelemetrySample {
    pub id: i64,
    pub station_id: i64,
    /// Volts
    pub voltage: f64,
    /// Amperes
    pub current: f64,
    /// Degrees Celsius
    pub temperature: f64,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewTelemetrySample {
    pub station_id: i64,
    pub voltage: f64,
    pub current: f64,
    pub temperature: f64,
    pub timestamp: DateTime<Utc>,
}

impl NewTelemetrySample {
    pub fn into_sample(self, id: i64) -> TelemetrySample {
        TelemetrySample {
            id,
            station_id: self.station_id,
            voltage: self.voltage,
            current: self.current,
            temperature: self.temperature,
            timestamp: self.timestamp,
        }
    }
}
