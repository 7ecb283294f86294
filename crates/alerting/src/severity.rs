//! Severity Tiers

use serde::{Deserialize, Serialize};
use std::fmt;

/// Alert severity derived from the anomaly score
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Info,
    Warning,
    Critical,
}

impl Severity {
    /// Classify a score with the default thresholds
    pub fn classify(score: f64) -> Self {
        SeverityThresholds::default().classify(score)
    }

    /// Get string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Info => "INFO",
            Severity::Warning => "WARNING",
            Severity::Critical => "CRITICAL",
        }
    }

    /// Parse a tier name, case-insensitively
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_uppercase().as_str() {
            "INFO" => Some(Severity::Info),
            "WARNING" => Some(Severity::Warning),
            "CRITICAL" => Some(Severity::Critical),
            _ => None,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Score cut-offs; a score strictly below a cut-off reaches that tier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeverityThresholds {
    /// Scores below this are critical (default: -0.5)
    pub critical_below: f64,
    /// Scores below this are warnings (default: -0.3)
    pub warning_below: f64,
}

impl Default for SeverityThresholds {
    fn default() -> Self {
        Self {
            critical_below: -0.5,
            warning_below: -0.3,
        }
    }
}

impl SeverityThresholds {
    /// Map a score to a tier. Total over all inputs; NaN maps to INFO.
    pub fn classify(&self, score: f64) -> Severity {
        if score < self.critical_below {
            Severity::Critical
        } else if score < self.warning_below {
            Severity::Warning
        } else {
            Severity::Info
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_severity_levels() {
        assert_eq!(Severity::classify(-0.6), Severity::Critical);
        assert_eq!(Severity::classify(-0.4), Severity::Warning);
        assert_eq!(Severity::classify(-0.1), Severity::Info);
    }

    #[test]
    fn test_boundaries() {
        assert_eq!(Severity::classify(-0.5), Severity::Warning);
        assert_eq!(Severity::classify(-0.3), Severity::Info);
        assert_eq!(Severity::classify(f64::NAN), Severity::Info);
    }

    #[test]
    fn test_serialized_names() {
        assert_eq!(serde_json::to_string(&Severity::Critical).unwrap(), "\"CRITICAL\"");
        assert_eq!(Severity::parse("warning"), Some(Severity::Warning));
        assert_eq!(Severity::parse("urgent"), None);
    }

    proptest! {
        #[test]
        fn prop_more_negative_is_never_less_severe(a in -1.0f64..0.0, b in -1.0f64..0.0) {
            let (low, high) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(Severity::classify(low) >= Severity::classify(high));
        }
    }
}
