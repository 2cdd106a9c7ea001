//! Push payloads

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{HealthAssessment, NewTelemetrySample, RiskLevel};

/// Per-sample update sent to the station's owner
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct OwnerTelemetryPush {
    pub station_id: i64,
    pub voltage: f64,
    pub current: f64,
    pub temperature: f64,
    pub health: RiskLevel,
    pub alert: bool,
}

impl OwnerTelemetryPush {
    pub fn new(sample: &NewTelemetrySample, assessment: &HealthAssessment) -> Self {
        Self {
            station_id: sample.station_id,
            voltage: sample.voltage,
            current: sample.current,
            temperature: sample.temperature,
            health: assessment.risk_level,
            alert: assessment.is_alert(),
        }
    }
}

/// Admin alert raised when a station's risk turns HIGH
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CriticalFaultAlert {
    #[serde(rename = "type")]
    pub kind: String,
    pub station_id: i64,
    pub owner_id: i64,
    pub health_score: u8,
    pub anomalies_detected: u32,
    pub timestamp: DateTime<Utc>,
}

impl CriticalFaultAlert {
    pub const KIND: &'static str = "critical_fault";

    pub fn new(
        station_id: i64,
        owner_id: i64,
        assessment: &HealthAssessment,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            kind: Self::KIND.to_string(),
            station_id,
            owner_id,
            health_score: assessment.health_score,
            anomalies_detected: assessment.anomalies_detected,
            timestamp,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alert_wire_shape() {
        let assessment = HealthAssessment {
            health_score: 88,
            risk_level: RiskLevel::High,
            anomalies_detected: 6,
        };
        let alert = CriticalFaultAlert::new(3, 9, &assessment, Utc::now());
        let json = serde_json::to_value(&alert).unwrap();
        assert_eq!(json["type"], "critical_fault");
        assert_eq!(json["owner_id"], 9);
        assert_eq!(json["health_score"], 88);
    }

    #[test]
    fn owner_push_carries_risk_string_and_alert_flag() {
        let sample = NewTelemetrySample {
            station_id: 3,
            voltage: 219.0,
            current: 31.0,
            temperature: 91.0,
            timestamp: Utc::now(),
        };
        let assessment = HealthAssessment {
            health_score: 90,
            risk_level: RiskLevel::High,
            anomalies_detected: 5,
        };
        let json = serde_json::to_value(OwnerTelemetryPush::new(&sample, &assessment)).unwrap();
        assert_eq!(json["health"], "HIGH");
        assert_eq!(json["alert"], true);
        assert_eq!(json["station_id"], 3);
    }
}
