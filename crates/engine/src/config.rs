//! Engine configuration
//!
//! Layered loading: built-in defaults, then an optional `engine.toml`,
//! then `MAINT_`-prefixed environment variables.

use alerting::{AlertThresholds, ALERT_THRESHOLD, WARN_THRESHOLD};
use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};

/// Engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Cycles since the last preventive that open an alert
    pub alert_threshold: f64,
    /// Cycles that flag a warning severity
    pub warn_threshold: f64,
    /// Seconds between sweep runs (due plans + alert recompute)
    pub sweep_interval_secs: u64,
    /// Fault codes whose issue reports auto-escalate to corrective orders
    pub critical_faults: Vec<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            alert_threshold: ALERT_THRESHOLD,
            warn_threshold: WARN_THRESHOLD,
            sweep_interval_secs: 300,
            critical_faults: Vec::new(),
        }
    }
}

impl EngineConfig {
    /// Load from `engine.toml` (optional) and `MAINT_*` env overrides
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from("engine")
    }

    pub fn load_from(name: &str) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        Config::builder()
            .set_default("alert_threshold", defaults.alert_threshold)?
            .set_default("warn_threshold", defaults.warn_threshold)?
            .set_default("sweep_interval_secs", defaults.sweep_interval_secs as i64)?
            .set_default("critical_faults", defaults.critical_faults.clone())?
            .add_source(File::with_name(name).required(false))
            .add_source(Environment::with_prefix("MAINT"))
            .build()?
            .try_deserialize()
    }

    /// Thresholds in the shape the alerting rules take
    pub fn thresholds(&self) -> AlertThresholds {
        AlertThresholds { alert: self.alert_threshold, warn: self.warn_threshold }
    }
}
