//! Application configuration
//!
//! Loaded from a TOML file (default `~/.config/ecocharge/config.toml`).
//! Every field has a default, so an empty or missing section is valid.
//! `DATABASE_URL` and `JWT_SECRET_KEY` override the file when set.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::application::fanout::registry::DEFAULT_QUEUE_CAPACITY;
use crate::application::health::MAX_HISTORY_WINDOW;
use crate::infrastructure::crypto::JwtConfig;
use crate::infrastructure::DatabaseConfig;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Root configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseSection,
    pub security: SecurityConfig,
    pub booking: BookingConfig,
    pub telemetry: TelemetryConfig,
    pub detector: DetectorConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub api_host: String,
    pub api_port: u16,
    /// Seconds to wait for cleanup before forcing exit
    pub shutdown_timeout_secs: u64,
    /// Queued pushes per WebSocket session before it is disconnected
    pub push_queue_capacity: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            api_host: "0.0.0.0".to_string(),
            api_port: 8000,
            shutdown_timeout_secs: 30,
            push_queue_capacity: DEFAULT_QUEUE_CAPACITY,
        }
    }
}

impl ServerConfig {
    pub fn address(&self) -> String {
        format!("{}:{}", self.api_host, self.api_port)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseSection {
    /// Full connection URL; takes precedence over `path`
    pub url: Option<String>,
    /// SQLite file path
    pub path: String,
    pub max_connections: u32,
}

impl Default for DatabaseSection {
    fn default() -> Self {
        Self {
            url: None,
            path: "./ecocharge.db".to_string(),
            max_connections: 10,
        }
    }
}

impl DatabaseSection {
    pub fn connection_url(&self) -> String {
        match &self.url {
            Some(url) => url.clone(),
            None => format!("sqlite://{}?mode=rwc", self.path),
        }
    }

    pub fn to_database_config(&self) -> DatabaseConfig {
        DatabaseConfig {
            url: self.connection_url(),
            max_connections: self.max_connections,
        }
    }
}

#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SecurityConfig {
    pub jwt_secret: String,
    pub jwt_expiration_hours: i64,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            jwt_secret: "change-me-in-production".to_string(),
            jwt_expiration_hours: 24,
        }
    }
}

impl std::fmt::Debug for SecurityConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecurityConfig")
            .field("jwt_secret", &"<redacted>")
            .field("jwt_expiration_hours", &self.jwt_expiration_hours)
            .finish()
    }
}

impl SecurityConfig {
    pub fn jwt(&self) -> JwtConfig {
        JwtConfig {
            secret: self.jwt_secret.clone(),
            expiration_hours: self.jwt_expiration_hours,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BookingConfig {
    /// Look-ahead used by the availability query
    pub availability_window_minutes: i64,
}

impl Default for BookingConfig {
    fn default() -> Self {
        Self {
            availability_window_minutes: 15,
        }
    }
}

/// Parameters of a normal distribution
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NormalParams {
    pub mean: f64,
    pub std_dev: f64,
}

impl NormalParams {
    pub const fn new(mean: f64, std_dev: f64) -> Self {
        Self { mean, std_dev }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    pub enabled: bool,
    pub interval_secs: u64,
    /// Chance per sample that one reading is replaced by a fault draw
    pub fault_probability: f64,
    /// Fixed seed for reproducible runs; entropy when absent
    pub seed: Option<u64>,
    pub voltage: NormalParams,
    pub current: NormalParams,
    pub temperature: NormalParams,
    pub overheat_temperature: NormalParams,
    pub undervoltage_voltage: NormalParams,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_secs: 5,
            fault_probability: 0.05,
            seed: None,
            voltage: NormalParams::new(220.0, 5.0),
            current: NormalParams::new(32.0, 2.0),
            temperature: NormalParams::new(40.0, 5.0),
            overheat_temperature: NormalParams::new(90.0, 3.0),
            undervoltage_voltage: NormalParams::new(160.0, 5.0),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    /// Samples handed to the detector, newest first
    pub history_window: u64,
    pub z_threshold: f64,
    /// Risk is HIGH when anomalies exceed this count
    pub high_risk_anomalies: u32,
    /// Points deducted from 100 per anomalous sample
    pub score_penalty: u32,
    pub voltage: NormalParams,
    pub current: NormalParams,
    pub temperature: NormalParams,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            history_window: 50,
            z_threshold: 3.0,
            high_risk_anomalies: 3,
            score_penalty: 2,
            voltage: NormalParams::new(220.0, 5.0),
            current: NormalParams::new(32.0, 2.0),
            temperature: NormalParams::new(40.0, 5.0),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// trace, debug, info, warn, error (or a full filter directive)
    pub level: String,
    /// "pretty" or "json"
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

impl AppConfig {
    /// Read the file (if present), apply env overrides and validate
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let mut config = if path.exists() {
            let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
                path: path.to_path_buf(),
                source,
            })?;
            Self::from_toml_str(&raw).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?
        } else {
            Self::default()
        };

        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml_str(raw: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(raw)
    }

    fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("DATABASE_URL").filter(|v| !v.trim().is_empty()) {
            self.database.url = Some(url.trim().to_string());
        }
        if let Some(secret) = lookup("JWT_SECRET_KEY").filter(|v| !v.trim().is_empty()) {
            self.security.jwt_secret = secret.trim().to_string();
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.api_port == 0 {
            return Err(ConfigError::Invalid("server.api_port must be non-zero".into()));
        }
        if self.server.push_queue_capacity == 0 {
            return Err(ConfigError::Invalid("server.push_queue_capacity must be positive".into()));
        }
        if self.security.jwt_secret.is_empty() {
            return Err(ConfigError::Invalid("security.jwt_secret must not be empty".into()));
        }
        if self.booking.availability_window_minutes <= 0 {
            return Err(ConfigError::Invalid(
                "booking.availability_window_minutes must be positive".into(),
            ));
        }
        if self.telemetry.interval_secs == 0 {
            return Err(ConfigError::Invalid("telemetry.interval_secs must be positive".into()));
        }
        if !(0.0..=1.0).contains(&self.telemetry.fault_probability) {
            return Err(ConfigError::Invalid(
                "telemetry.fault_probability must be within [0, 1]".into(),
            ));
        }
        let spreads = [
            ("telemetry.voltage", self.telemetry.voltage),
            ("telemetry.current", self.telemetry.current),
            ("telemetry.temperature", self.telemetry.temperature),
            ("telemetry.overheat_temperature", self.telemetry.overheat_temperature),
            ("telemetry.undervoltage_voltage", self.telemetry.undervoltage_voltage),
            ("detector.voltage", self.detector.voltage),
            ("detector.current", self.detector.current),
            ("detector.temperature", self.detector.temperature),
        ];
        for (name, params) in spreads {
            if !(params.std_dev > 0.0) {
                return Err(ConfigError::Invalid(format!("{}.std_dev must be positive", name)));
            }
        }
        if !(self.detector.z_threshold > 0.0) {
            return Err(ConfigError::Invalid("detector.z_threshold must be positive".into()));
        }
        if !(1..=MAX_HISTORY_WINDOW).contains(&self.detector.history_window) {
            return Err(ConfigError::Invalid(format!(
                "detector.history_window must be within [1, {}]",
                MAX_HISTORY_WINDOW
            )));
        }
        if !matches!(self.logging.format.as_str(), "pretty" | "json") {
            return Err(ConfigError::Invalid(format!(
                "logging.format must be 'pretty' or 'json', got '{}'",
                self.logging.format
            )));
        }
        Ok(())
    }
}

/// `~/.config/ecocharge/config.toml`, falling back to the working directory
pub fn default_config_path() -> PathBuf {
    dirs_next::config_dir()
        .map(|dir| dir.join("ecocharge").join("config.toml"))
        .unwrap_or_else(|| PathBuf::from("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_yields_defaults() {
        let config = AppConfig::from_toml_str("").unwrap();
        assert_eq!(config.server.api_port, 8000);
        assert_eq!(config.telemetry.interval_secs, 5);
        assert_eq!(config.telemetry.fault_probability, 0.05);
        assert_eq!(config.detector.history_window, 50);
        assert_eq!(config.booking.availability_window_minutes, 15);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let config = AppConfig::from_toml_str(
            r#"
            [server]
            api_port = 9100

            [telemetry]
            seed = 42
            voltage = { mean = 230.0, std_dev = 4.0 }
            "#,
        )
        .unwrap();
        assert_eq!(config.server.api_port, 9100);
        assert_eq!(config.server.api_host, "0.0.0.0");
        assert_eq!(config.telemetry.seed, Some(42));
        assert_eq!(config.telemetry.voltage, NormalParams::new(230.0, 4.0));
        assert_eq!(config.telemetry.current, NormalParams::new(32.0, 2.0));
    }

    #[test]
    fn env_overrides_win_over_file() {
        let mut config = AppConfig::default();
        config.apply_overrides(|key| match key {
            "DATABASE_URL" => Some("sqlite::memory:".to_string()),
            "JWT_SECRET_KEY" => Some("from-env".to_string()),
            _ => None,
        });
        assert_eq!(config.database.connection_url(), "sqlite::memory:");
        assert_eq!(config.security.jwt_secret, "from-env");
    }

    #[test]
    fn rejects_out_of_range_fault_probability() {
        let mut config = AppConfig::default();
        config.telemetry.fault_probability = 1.5;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("fault_probability"));
    }

    #[test]
    fn history_window_is_capped_at_fifty() {
        let mut config = AppConfig::default();
        config.detector.history_window = 51;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("history_window"));

        config.detector.history_window = 0;
        assert!(config.validate().is_err());

        config.detector.history_window = 50;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn rejects_zero_spread() {
        let mut config = AppConfig::default();
        config.detector.temperature.std_dev = 0.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn missing_file_is_default() {
        let path = std::env::temp_dir().join("ecocharge-definitely-missing.toml");
        let config = AppConfig::load(&path).unwrap();
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn debug_output_hides_secret() {
        let config = AppConfig::default();
        let rendered = format!("{:?}", config.security);
        assert!(!rendered.contains("change-me"));
    }
}
