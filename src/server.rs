//! Service runtime.
//!
//! [`ServerHandle`] owns the full lifecycle: database and migrations,
//! the booking and health services, the telemetry job, the push hub, the
//! REST API, and graceful shutdown.

use std::net::SocketAddr;
use std::sync::{Arc, OnceLock};
use std::time::Instant;

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use sea_orm::{DatabaseConnection, DbErr};
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::application::telemetry::log_run_failures;
use crate::application::{
    BaselineDetector, BookingEngine, FanoutHub, HealthService, SharedFanoutHub, TelemetryGenerator,
    TelemetrySampler,
};
use crate::config::AppConfig;
use crate::domain::{AnomalyDetector, IdentityProvider, RepositoryProvider};
use crate::infrastructure::{init_database, run_migrations, JwtIdentityProvider, SeaOrmRepositoryProvider};
use crate::interfaces::{create_api_router, AppState};
use crate::support::clock::{SharedClock, SystemClock};
use crate::support::shutdown::{ShutdownCoordinator, ShutdownSignal};

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("database error: {0}")]
    Database(#[from] DbErr),

    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },
}

pub struct ServerOptions {
    pub config: AppConfig,
    /// Run database migrations on startup
    pub auto_migrate: bool,
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self {
            config: AppConfig::default(),
            auto_migrate: true,
        }
    }
}

/// Handle to a running service.
///
/// ```rust,no_run
/// use ecocharge::server::{ServerHandle, ServerOptions};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let handle = ServerHandle::start(ServerOptions::default()).await?;
///     handle.install_signal_handler();
///     handle.shutdown_signal().wait().await;
///     handle.wait().await;
///     Ok(())
/// }
/// ```
pub struct ServerHandle {
    pub repos: Arc<dyn RepositoryProvider>,
    pub hub: SharedFanoutHub,
    pub config: AppConfig,
    /// Address the REST API is bound to
    pub local_addr: SocketAddr,
    db: DatabaseConnection,
    shutdown: ShutdownCoordinator,
    api_task: JoinHandle<()>,
    background: Vec<JoinHandle<()>>,
}

impl ServerHandle {
    pub async fn start(opts: ServerOptions) -> Result<Self, ServerError> {
        let config = opts.config;
        info!("Starting EcoCharge service");

        let prometheus = prometheus_handle();

        // ── Database ───────────────────────────────────────────
        let db_config = config.database.to_database_config();
        let db = init_database(&db_config).await?;
        if opts.auto_migrate {
            run_migrations(&db).await?;
        }

        // ── Services ───────────────────────────────────────────
        let repos: Arc<dyn RepositoryProvider> = Arc::new(SeaOrmRepositoryProvider::new(db.clone()));
        let clock: SharedClock = Arc::new(SystemClock);
        let identities: Arc<dyn IdentityProvider> =
            Arc::new(JwtIdentityProvider::new(config.security.jwt(), repos.clone()));

        let bookings = Arc::new(
            BookingEngine::new(repos.clone(), clock.clone()).with_availability_window(
                chrono::Duration::minutes(config.booking.availability_window_minutes),
            ),
        );
        let detector: Arc<dyn AnomalyDetector> = Arc::new(BaselineDetector::from_config(&config.detector));
        let health = Arc::new(
            HealthService::new(repos.clone(), detector).with_history_window(config.detector.history_window),
        );
        let hub: SharedFanoutHub =
            Arc::new(FanoutHub::with_queue_capacity(config.server.push_queue_capacity));

        let shutdown = ShutdownCoordinator::new(config.server.shutdown_timeout_secs);
        let signal = shutdown.signal();

        // ── Background jobs ────────────────────────────────────
        let mut background = Vec::new();
        if config.telemetry.enabled {
            let (failures_tx, failures_rx) = mpsc::unbounded_channel();
            let generator = Arc::new(
                TelemetryGenerator::new(
                    repos.clone(),
                    health.clone(),
                    hub.clone(),
                    clock.clone(),
                    TelemetrySampler::from_config(&config.telemetry),
                )
                .with_interval(std::time::Duration::from_secs(config.telemetry.interval_secs)),
            );
            background.push(generator.start(signal.clone(), failures_tx));
            background.push(log_run_failures(failures_rx));
        } else {
            info!("Telemetry generator disabled");
        }

        // ── REST API ───────────────────────────────────────────
        let state = AppState {
            repos: repos.clone(),
            bookings,
            health,
            hub: hub.clone(),
            identities,
            db: Some(db.clone()),
            started_at: Arc::new(Instant::now()),
        };
        let router = create_api_router(state, prometheus);

        let addr = config.server.address();
        let listener = tokio::net::TcpListener::bind(&addr)
            .await
            .map_err(|source| ServerError::Bind {
                addr: addr.clone(),
                source,
            })?;
        let local_addr = listener.local_addr().map_err(|source| ServerError::Bind {
            addr: addr.clone(),
            source,
        })?;
        info!(%local_addr, "REST API listening");
        info!("Swagger UI available at http://{}/docs/", local_addr);

        let api_signal = signal.clone();
        let api_task = tokio::spawn(async move {
            let server = axum::serve(listener, router).with_graceful_shutdown(async move {
                api_signal.wait().await;
                info!("REST API received shutdown signal");
            });
            if let Err(e) = server.await {
                error!(error = %e, "REST API server error");
            }
        });

        Ok(Self {
            repos,
            hub,
            config,
            local_addr,
            db,
            shutdown,
            api_task,
            background,
        })
    }

    pub fn shutdown_signal(&self) -> ShutdownSignal {
        self.shutdown.signal()
    }

    /// Trigger shutdown on SIGTERM / Ctrl+C
    pub fn install_signal_handler(&self) {
        self.shutdown.start_signal_listener();
    }

    pub fn trigger_shutdown(&self) {
        self.shutdown.signal().trigger();
    }

    pub fn is_running(&self) -> bool {
        !self.api_task.is_finished()
    }

    /// Wait for the API to stop, then tear down push channels, background
    /// jobs and the database within the shutdown timeout.
    pub async fn wait(self) {
        let Self {
            hub,
            db,
            shutdown,
            api_task,
            background,
            ..
        } = self;

        if let Err(e) = api_task.await {
            error!(error = %e, "REST API task panicked");
        }

        shutdown
            .run_cleanup(|| async move {
                hub.close_all();
                for task in background {
                    if let Err(e) = task.await {
                        warn!(error = %e, "Background task ended abnormally");
                    }
                }
                match db.close().await {
                    Ok(()) => info!("Database connection closed"),
                    Err(e) => warn!(error = %e, "Error closing database connection"),
                }
            })
            .await;

        info!("EcoCharge service stopped");
    }

    pub async fn shutdown(self) {
        info!("Shutting down EcoCharge service");
        self.trigger_shutdown();
        self.wait().await;
    }
}

/// The global recorder can be installed once per process; later starts
/// in the same process reuse it.
fn prometheus_handle() -> Option<PrometheusHandle> {
    static HANDLE: OnceLock<Option<PrometheusHandle>> = OnceLock::new();
    HANDLE
        .get_or_init(|| match PrometheusBuilder::new().install_recorder() {
            Ok(handle) => {
                info!("Prometheus metrics recorder installed");
                Some(handle)
            }
            Err(e) => {
                warn!(error = %e, "Metrics recorder unavailable, /metrics disabled");
                None
            }
        })
        .clone()
}

/// Initialise tracing from the logging section. `RUST_LOG` wins when set.
///
/// Call once at process startup, before [`ServerHandle::start`].
pub fn init_tracing(config: &AppConfig) {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.logging.level));

    let registry = tracing_subscriber::registry().with(env_filter);
    let result = match config.logging.format.to_lowercase().as_str() {
        "json" => registry.with(tracing_subscriber::fmt::layer().json()).try_init(),
        _ => registry.with(tracing_subscriber::fmt::layer()).try_init(),
    };
    if let Err(e) = result {
        eprintln!("tracing already initialised: {}", e);
    }
}
