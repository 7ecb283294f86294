//! Alerting System
//!
//! Maps anomaly scores to severity tiers, derives rule-based maintenance
//! recommendations from raw metrics, and assembles alert records.

mod alert;
mod manager;
mod recommendation;
mod severity;

pub use alert::{Alert, AlertMetrics, AlertSink, NullSink, PublishError};
pub use manager::{AlertConfig, AlertManager};
pub use recommendation::{RecommendationEngine, RecommendationRules};
pub use severity::{Severity, SeverityThresholds};
