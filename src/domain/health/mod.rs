pub mod model;

pub use model::{AnomalyDetector, HealthAssessment, RiskLevel};
