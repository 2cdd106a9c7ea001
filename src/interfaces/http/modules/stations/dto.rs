//! Station DTOs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::domain::{HealthAssessment, RiskLevel};

#[derive(Debug, Deserialize, IntoParams)]
pub struct AvailabilityQuery {
    /// Defaults to now
    pub as_of: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct StationHealthDto {
    pub station_id: i64,
    pub health_score: u8,
    pub risk_level: RiskLevel,
    pub anomalies_detected: u32,
    pub alert: bool,
}

impl StationHealthDto {
    pub fn new(station_id: i64, a: HealthAssessment) -> Self {
        Self {
            station_id,
            health_score: a.health_score,
            risk_level: a.risk_level,
            anomalies_detected: a.anomalies_detected,
            alert: a.is_alert(),
        }
    }
}
