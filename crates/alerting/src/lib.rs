//! Cycle-Meter Alerting
//!
//! Weekly cycle-meter readings per asset, the cycles-since-last-preventive
//! delta, and the threshold rules that open and close maintenance alerts.

pub mod alert;
pub mod baseline;
pub mod reading;
pub mod sync;

pub use alert::{AlertId, AlertStatus, MaintenanceAlert};
pub use baseline::{apply_baseline, baseline_value, iso_year_week};
pub use reading::{year_week_key, MeterReading, ReadingId};
pub use sync::{decide, SkipReason, SyncDecision, SyncOptions, SyncOutcome};

use serde::{Deserialize, Serialize};

/// Default alert threshold: cycles since the last preventive service
pub const ALERT_THRESHOLD: f64 = 70_000.0;
/// Default warning band (UI severity only, never opens an alert)
pub const WARN_THRESHOLD: f64 = 60_000.0;

/// Alerting thresholds
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct AlertThresholds {
    /// Cycles that open an alert
    pub alert: f64,
    /// Cycles that flag a warning severity
    pub warn: f64,
}

impl Default for AlertThresholds {
    fn default() -> Self {
        Self { alert: ALERT_THRESHOLD, warn: WARN_THRESHOLD }
    }
}

/// Severity band for a delta value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
    Normal,
    Warning,
    Alert,
}

impl AlertThresholds {
    /// Map a cycles delta onto a severity band
    pub fn severity(&self, cycles: f64) -> Severity {
        if cycles >= self.alert {
            Severity::Alert
        } else if cycles >= self.warn {
            Severity::Warning
        } else {
            Severity::Normal
        }
    }
}
