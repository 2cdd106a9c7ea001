//! Periodic telemetry job.
//!
//! Every tick draws one reading per active station, commits the whole run
//! as one batch, then assesses and pushes station by station. A run that
//! fails to persist pushes nothing and is reported on the failure channel.

use std::sync::{Arc, Mutex};
use std::time::Instant;

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Duration, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use super::sampler::TelemetrySampler;
use super::single_flight::SingleFlight;
use crate::application::fanout::{CriticalFaultAlert, OwnerTelemetryPush, SharedFanoutHub};
use crate::application::health::HealthService;
use crate::domain::{DomainError, DomainResult, NewTelemetrySample, RepositoryProvider};
use crate::support::clock::SharedClock;
use crate::support::shutdown::ShutdownSignal;

const DEFAULT_INTERVAL_SECS: u64 = 5;

/// Counters for one completed run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunReport {
    pub stations: usize,
    pub samples_written: usize,
    pub pushes_delivered: usize,
    pub alerts_raised: usize,
    pub assessment_failures: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    Completed(RunReport),
    /// Another run was still in flight
    Skipped,
    Failed(DomainError),
}

/// Sent on the failure channel when a run aborts
#[derive(Debug, Clone)]
pub struct RunFailure {
    pub at: DateTime<Utc>,
    pub error: DomainError,
}

pub struct TelemetryGenerator {
    repos: Arc<dyn RepositoryProvider>,
    health: Arc<HealthService>,
    hub: SharedFanoutHub,
    clock: SharedClock,
    sampler: Mutex<TelemetrySampler>,
    flight: SingleFlight,
    interval: Duration,
}

impl TelemetryGenerator {
    pub fn new(
        repos: Arc<dyn RepositoryProvider>,
        health: Arc<HealthService>,
        hub: SharedFanoutHub,
        clock: SharedClock,
        sampler: TelemetrySampler,
    ) -> Self {
        Self {
            repos,
            health,
            hub,
            clock,
            sampler: Mutex::new(sampler),
            flight: SingleFlight::new(),
            interval: Duration::from_secs(DEFAULT_INTERVAL_SECS),
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Spawn the ticking loop. Each tick spawns one guarded run so a slow
    /// run never delays the schedule; overlapping ticks are skipped.
    pub fn start(
        self: Arc<Self>,
        shutdown: ShutdownSignal,
        failures: mpsc::UnboundedSender<RunFailure>,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            info!(interval_secs = self.interval.as_secs(), "Telemetry generator started");

            let mut interval = tokio::time::interval(self.interval);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            let stop = shutdown.notified();
            tokio::pin!(stop);

            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        let generator = self.clone();
                        let failures = failures.clone();
                        tokio::spawn(async move {
                            if let RunOutcome::Failed(error) = generator.trigger().await {
                                let at = generator.clock.now();
                                // receiver gone means we are shutting down
                                let _ = failures.send(RunFailure { at, error });
                            }
                        });
                    }
                    _ = &mut stop => {
                        info!("Telemetry generator shutting down");
                        break;
                    }
                }
            }

            info!("Telemetry generator stopped");
        })
    }

    /// One guarded run attempt
    pub async fn trigger(&self) -> RunOutcome {
        let Some(_guard) = self.flight.try_begin() else {
            debug!("Previous telemetry run still in flight, skipping tick");
            metrics::counter!("telemetry_runs_skipped_total").increment(1);
            return RunOutcome::Skipped;
        };

        let started = Instant::now();
        let outcome = match self.run_once().await {
            Ok(report) => RunOutcome::Completed(report),
            Err(e) => {
                metrics::counter!("telemetry_run_failures_total").increment(1);
                RunOutcome::Failed(e)
            }
        };
        metrics::histogram!("telemetry_run_duration_seconds")
            .record(started.elapsed().as_secs_f64());
        outcome
    }

    async fn run_once(&self) -> DomainResult<RunReport> {
        let stations = self.repos.stations().find_active().await?;
        if stations.is_empty() {
            return Ok(RunReport::default());
        }

        let timestamp = self.clock.now();
        let samples: Vec<NewTelemetrySample> = {
            let mut sampler = self
                .sampler
                .lock()
                .map_err(|_| DomainError::DependencyUnavailable("sampler lock poisoned".into()))?;
            stations
                .iter()
                .map(|station| {
                    let reading = sampler.draw();
                    if let Some(fault) = reading.fault {
                        debug!(station_id = station.id, ?fault, "Injected fault");
                    }
                    NewTelemetrySample {
                        station_id: station.id,
                        voltage: reading.voltage,
                        current: reading.current,
                        temperature: reading.temperature,
                        timestamp,
                    }
                })
                .collect()
        };

        let written = self.repos.telemetry().insert_batch(samples.clone()).await?;
        metrics::counter!("telemetry_samples_total").increment(written as u64);

        let mut report = RunReport {
            stations: stations.len(),
            samples_written: written,
            ..RunReport::default()
        };

        for (station, sample) in stations.iter().zip(samples.iter()) {
            let assessment = match self.health.analyze(station.id).await {
                Ok(a) => a,
                Err(e) => {
                    warn!(station_id = station.id, error = %e, "Health assessment failed, skipping push");
                    report.assessment_failures += 1;
                    continue;
                }
            };

            let push = OwnerTelemetryPush::new(sample, &assessment);
            report.pushes_delivered += self.hub.push_to_owner(station.owner_id, &push).delivered;

            if assessment.is_alert() {
                let alert =
                    CriticalFaultAlert::new(station.id, station.owner_id, &assessment, timestamp);
                self.hub.broadcast_admins(&alert);
                report.alerts_raised += 1;
                warn!(
                    station_id = station.id,
                    owner_id = station.owner_id,
                    health_score = assessment.health_score,
                    anomalies = assessment.anomalies_detected,
                    "Critical station fault"
                );
            }
        }

        debug!(
            stations = report.stations,
            pushes = report.pushes_delivered,
            alerts = report.alerts_raised,
            "Telemetry run complete"
        );
        Ok(report)
    }
}

/// Drain the failure channel: every failed run is logged at error level
pub fn log_run_failures(mut failures: mpsc::UnboundedReceiver<RunFailure>) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(failure) = failures.recv().await {
            error!(at = %failure.at, error = %failure.error, "Telemetry run failed; batch discarded");
        }
    })
}
