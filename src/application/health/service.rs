//! Store-backed health assessment

use std::sync::Arc;

use tracing::debug;

use crate::domain::{AnomalyDetector, DomainResult, HealthAssessment, RepositoryProvider};

/// Most samples the detector is ever handed
pub const MAX_HISTORY_WINDOW: u64 = 50;

pub struct HealthService {
    repos: Arc<dyn RepositoryProvider>,
    detector: Arc<dyn AnomalyDetector>,
    history_window: u64,
}

impl HealthService {
    pub fn new(repos: Arc<dyn RepositoryProvider>, detector: Arc<dyn AnomalyDetector>) -> Self {
        Self {
            repos,
            detector,
            history_window: MAX_HISTORY_WINDOW,
        }
    }

    /// Clamped to `1..=MAX_HISTORY_WINDOW`
    pub fn with_history_window(mut self, samples: u64) -> Self {
        self.history_window = samples.clamp(1, MAX_HISTORY_WINDOW);
        self
    }

    /// Assess the station from its most recent samples (newest first)
    pub async fn analyze(&self, station_id: i64) -> DomainResult<HealthAssessment> {
        let recent = self
            .repos
            .telemetry()
            .recent_for_station(station_id, self.history_window)
            .await?;

        if recent.is_empty() {
            return Ok(HealthAssessment::HEALTHY);
        }

        let assessment = self.detector.analyze(&recent);
        debug!(
            station_id,
            samples = recent.len(),
            score = assessment.health_score,
            risk = %assessment.risk_level,
            "Station assessed"
        );
        Ok(assessment)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use chrono::{Duration, TimeZone, Utc};

    use super::*;
    use crate::application::health::BaselineDetector;
    use crate::domain::{NewTelemetrySample, RiskLevel, TelemetrySample};
    use crate::infrastructure::storage::InMemoryStore;

    struct CountingDetector {
        calls: AtomicUsize,
        seen: AtomicUsize,
    }

    impl AnomalyDetector for CountingDetector {
        fn analyze(&self, recent: &[TelemetrySample]) -> HealthAssessment {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.seen.store(recent.len(), Ordering::SeqCst);
            HealthAssessment::HEALTHY
        }
    }

    fn overheated(station_id: i64, i: i64) -> NewTelemetrySample {
        NewTelemetrySample {
            station_id,
            voltage: 220.0,
            current: 32.0,
            temperature: 95.0,
            timestamp: Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap() + Duration::seconds(i),
        }
    }

    #[tokio::test]
    async fn empty_history_skips_detector() {
        let store = Arc::new(InMemoryStore::new());
        let detector = Arc::new(CountingDetector {
            calls: AtomicUsize::new(0),
            seen: AtomicUsize::new(0),
        });
        let service = HealthService::new(store, detector.clone());

        assert_eq!(service.analyze(3).await.unwrap(), HealthAssessment::HEALTHY);
        assert_eq!(detector.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn detector_sees_at_most_history_window() {
        let store = Arc::new(InMemoryStore::new());
        store
            .telemetry()
            .insert_batch((0..80).map(|i| overheated(3, i)).collect())
            .await
            .unwrap();
        let detector = Arc::new(CountingDetector {
            calls: AtomicUsize::new(0),
            seen: AtomicUsize::new(0),
        });
        let service = HealthService::new(store, detector.clone());

        service.analyze(3).await.unwrap();
        assert_eq!(detector.seen.load(Ordering::SeqCst), 50);
    }

    #[tokio::test]
    async fn oversized_history_window_is_clamped() {
        let store = Arc::new(InMemoryStore::new());
        store
            .telemetry()
            .insert_batch((0..80).map(|i| overheated(3, i)).collect())
            .await
            .unwrap();
        let detector = Arc::new(CountingDetector {
            calls: AtomicUsize::new(0),
            seen: AtomicUsize::new(0),
        });
        let service = HealthService::new(store, detector.clone()).with_history_window(200);

        service.analyze(3).await.unwrap();
        assert_eq!(detector.seen.load(Ordering::SeqCst), 50);
    }

    #[tokio::test]
    async fn overheating_station_is_high_risk() {
        let store = Arc::new(InMemoryStore::new());
        store
            .telemetry()
            .insert_batch((0..5).map(|i| overheated(3, i)).collect())
            .await
            .unwrap();
        let service = HealthService::new(store, Arc::new(BaselineDetector::default()));

        let a = service.analyze(3).await.unwrap();
        assert_eq!(a.risk_level, RiskLevel::High);
        assert_eq!(a.anomalies_detected, 5);
        assert_eq!(a.health_score, 90);
    }
}
