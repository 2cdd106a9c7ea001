//! Baseline z-score detector
//!
//! Scores each sample against the nominal operating distribution. Any
//! [`AnomalyDetector`] can stand in for it.

use crate::config::{DetectorConfig, NormalParams};
use crate::domain::{AnomalyDetector, HealthAssessment, RiskLevel, TelemetrySample};

#[derive(Debug, Clone)]
pub struct BaselineDetector {
    voltage: NormalParams,
    current: NormalParams,
    temperature: NormalParams,
    z_threshold: f64,
    high_risk_anomalies: u32,
    score_penalty: u32,
}

impl Default for BaselineDetector {
    fn default() -> Self {
        Self::from_config(&DetectorConfig::default())
    }
}

impl BaselineDetector {
    pub fn from_config(config: &DetectorConfig) -> Self {
        Self {
            voltage: config.voltage,
            current: config.current,
            temperature: config.temperature,
            z_threshold: config.z_threshold,
            high_risk_anomalies: config.high_risk_anomalies,
            score_penalty: config.score_penalty,
        }
    }

    fn deviates(&self, value: f64, baseline: NormalParams) -> bool {
        ((value - baseline.mean) / baseline.std_dev).abs() > self.z_threshold
    }

    pub fn is_anomalous(&self, s: &TelemetrySample) -> bool {
        self.deviates(s.voltage, self.voltage)
            || self.deviates(s.current, self.current)
            || self.deviates(s.temperature, self.temperature)
    }
}

impl AnomalyDetector for BaselineDetector {
    fn analyze(&self, recent: &[TelemetrySample]) -> HealthAssessment {
        if recent.is_empty() {
            return HealthAssessment::HEALTHY;
        }

        let anomalies = recent.iter().filter(|s| self.is_anomalous(s)).count() as u32;
        let penalty = anomalies.saturating_mul(self.score_penalty);
        let health_score = 100u32.saturating_sub(penalty) as u8;
        let risk_level = if anomalies > self.high_risk_anomalies {
            RiskLevel::High
        } else {
            RiskLevel::Low
        };

        HealthAssessment {
            health_score,
            risk_level,
            anomalies_detected: anomalies,
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    fn sample(voltage: f64, current: f64, temperature: f64) -> TelemetrySample {
        TelemetrySample {
            id: 0,
            station_id: 1,
            voltage,
            current,
            temperature,
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn empty_history_is_healthy() {
        assert_eq!(BaselineDetector::default().analyze(&[]), HealthAssessment::HEALTHY);
    }

    #[test]
    fn nominal_samples_score_full() {
        let recent: Vec<_> = (0..50).map(|_| sample(221.0, 31.5, 42.0)).collect();
        let a = BaselineDetector::default().analyze(&recent);
        assert_eq!(a.health_score, 100);
        assert_eq!(a.risk_level, RiskLevel::Low);
        assert_eq!(a.anomalies_detected, 0);
    }

    #[test]
    fn overheat_and_undervoltage_are_flagged() {
        let d = BaselineDetector::default();
        assert!(d.is_anomalous(&sample(220.0, 32.0, 90.0)));
        assert!(d.is_anomalous(&sample(160.0, 32.0, 40.0)));
        // exactly 3 sigma is not beyond the threshold
        assert!(!d.is_anomalous(&sample(235.0, 32.0, 40.0)));
    }

    #[test]
    fn risk_turns_high_above_three_anomalies() {
        let d = BaselineDetector::default();
        let mut recent: Vec<_> = (0..3).map(|_| sample(220.0, 32.0, 90.0)).collect();
        recent.extend((0..10).map(|_| sample(220.0, 32.0, 40.0)));

        let a = d.analyze(&recent);
        assert_eq!(a.anomalies_detected, 3);
        assert_eq!(a.health_score, 94);
        assert_eq!(a.risk_level, RiskLevel::Low);

        recent.push(sample(150.0, 32.0, 40.0));
        let a = d.analyze(&recent);
        assert_eq!(a.anomalies_detected, 4);
        assert_eq!(a.health_score, 92);
        assert!(a.is_alert());
    }

    #[test]
    fn score_floors_at_zero() {
        let recent: Vec<_> = (0..60).map(|_| sample(100.0, 32.0, 40.0)).collect();
        let a = BaselineDetector::default().analyze(&recent);
        assert_eq!(a.health_score, 0);
        assert_eq!(a.anomalies_detected, 60);
    }
}
