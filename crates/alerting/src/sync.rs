//! Alert synchronization rules
//!
//! Pure decision table for one reading. The caller supplies what the
//! repository knows (is there a later reading? which alert is open?) and
//! applies the returned decision inside its own transaction.

use crate::alert::MaintenanceAlert;
use crate::reading::MeterReading;
use crate::AlertThresholds;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

/// Sync tuning knobs
#[derive(Debug, Clone, Copy)]
pub struct SyncOptions {
    /// Only the asset's latest week may create, update or close alerts
    pub only_latest: bool,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self { only_latest: true }
    }
}

/// Why a reading was ignored
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SkipReason {
    /// A later (year, week) reading exists for the asset
    NotLatestWeek,
    /// No delta could be computed
    NoDelta,
    /// Inconsistent data produced a negative delta
    NegativeDelta,
    /// Below threshold with nothing open to close
    BelowThreshold,
    /// Asset has no readings at all
    NoReadings,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            SkipReason::NotLatestWeek => "not_latest_week",
            SkipReason::NoDelta => "no_delta",
            SkipReason::NegativeDelta => "negative_delta",
            SkipReason::BelowThreshold => "below_threshold",
            SkipReason::NoReadings => "no_readings",
        };
        write!(f, "{reason}")
    }
}

/// What to do about a reading
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SyncDecision {
    /// Leave alerts untouched
    Skip(SkipReason),
    /// Upsert the alert for the reading's week
    Raise {
        /// Delta that breached the threshold
        cycles: f64,
        /// An open alert from an earlier week must be closed first
        close_previous_open: bool,
    },
    /// Close the open alert: the delta dropped back under threshold
    Clear,
}

/// What actually happened after a decision was applied
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncOutcome {
    pub created: bool,
    pub updated: bool,
    pub closed_previous: bool,
    pub closed_existing: bool,
    pub skipped: bool,
    pub reason: Option<SkipReason>,
}

impl SyncOutcome {
    pub fn skipped(reason: SkipReason) -> Self {
        Self { skipped: true, reason: Some(reason), ..Self::default() }
    }

    pub fn closed_any(&self) -> bool {
        self.closed_previous || self.closed_existing
    }
}

/// Decide how the alert state must change for `reading`.
///
/// `later_reading_exists` answers "does the asset have a reading in a later
/// (year, week)?"; `open_alert` is the asset's most recent open alert.
pub fn decide(
    reading: &MeterReading,
    later_reading_exists: bool,
    open_alert: Option<&MaintenanceAlert>,
    thresholds: AlertThresholds,
    options: SyncOptions,
) -> SyncDecision {
    if options.only_latest && later_reading_exists {
        return SyncDecision::Skip(SkipReason::NotLatestWeek);
    }

    let delta = match reading.delta_since_preventive() {
        Some(delta) => delta,
        None => return SyncDecision::Skip(SkipReason::NoDelta),
    };
    if delta < 0.0 {
        debug!(
            "Reading {} for asset {} has negative delta {}",
            reading.id, reading.asset, delta
        );
        return SyncDecision::Skip(SkipReason::NegativeDelta);
    }

    let this_key = reading.key();
    let open_key = open_alert.map(|a| a.key());

    if delta >= thresholds.alert {
        return SyncDecision::Raise {
            cycles: delta,
            close_previous_open: open_key.is_some_and(|k| k < this_key),
        };
    }

    // Under threshold: close the open alert when this week is at or past it
    match open_key {
        Some(k) if this_key >= k => SyncDecision::Clear,
        _ => SyncDecision::Skip(SkipReason::BelowThreshold),
    }
}
