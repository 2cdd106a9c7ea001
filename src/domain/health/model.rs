//! Station health assessment contract

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::telemetry::TelemetrySample;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskLevel {
    Low,
    High,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "LOW",
            Self::High => "HIGH",
        }
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct HealthAssessment {
    /// 0..=100
    pub health_score: u8,
    pub risk_level: RiskLevel,
    pub anomalies_detected: u32,
}

impl HealthAssessment {
    /// Returned whenever there is no history to judge
    pub const HEALTHY: HealthAssessment = HealthAssessment {
        health_score: 100,
        risk_level: RiskLevel::Low,
        anomalies_detected: 0,
    };

    pub fn is_alert(&self) -> bool {
        self.risk_level == RiskLevel::High
    }
}

impl Default for HealthAssessment {
    fn default() -> Self {
        Self::HEALTHY
    }
}

/// Black-box classifier over a station's recent samples (newest first).
///
/// Implementations must return [`HealthAssessment::HEALTHY`] for an empty
/// slice and must not fail.
pub trait AnomalyDetector: Send + Sync {
    fn analyze(&self, recent: &[TelemetrySample]) -> HealthAssessment;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn risk_level_serializes_uppercase() {
        assert_eq!(serde_json::to_string(&RiskLevel::High).unwrap(), "\"HIGH\"");
        assert_eq!(RiskLevel::Low.to_string(), "LOW");
    }

    #[test]
    fn healthy_default() {
        let a = HealthAssessment::default();
        assert_eq!(a.health_score, 100);
        assert_eq!(a.risk_level, RiskLevel::Low);
        assert_eq!(a.anomalies_detected, 0);
        assert!(!a.is_alert());
    }
}
