//! Weekly cycle-meter readings

use assets::AssetId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Reading identifier
pub type ReadingId = i64;

/// Comparable key for an (ISO year, ISO week) pair
pub fn year_week_key(year: i32, week: u32) -> i64 {
    i64::from(year) * 100 + i64::from(week)
}

/// One weekly cycle-meter reading for an asset.
///
/// Unique per (asset, year, week). The main `value` column may be missing
/// on partially imported rows; the ERP export (`oracle_cycles`) backs it up.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeterReading {
    pub id: ReadingId,
    pub asset: AssetId,
    /// ISO year
    pub year: i32,
    /// ISO week (1-53)
    pub week: u32,
    /// Cycles at the end of the week
    pub value: Option<f64>,
    /// Same counter as exported by the ERP
    pub oracle_cycles: Option<f64>,
    /// Counter value at the last preventive service
    pub last_preventive_cycle: Option<f64>,
    /// Pre-computed delta, when the import sheet carries it
    pub cycles_since_preventive: Option<f64>,
    /// Source spreadsheet row, for traceability
    pub source_row: Option<u32>,
    pub recorded_at: DateTime<Utc>,
}

impl MeterReading {
    pub fn new(id: ReadingId, asset: AssetId, year: i32, week: u32, value: f64) -> Self {
        Self {
            id,
            asset,
            year,
            week,
            value: Some(value),
            oracle_cycles: None,
            last_preventive_cycle: None,
            cycles_since_preventive: None,
            source_row: None,
            recorded_at: Utc::now(),
        }
    }

    /// Comparable (year, week) key
    pub fn key(&self) -> i64 {
        year_week_key(self.year, self.week)
    }

    /// "2024-W07" style label
    pub fn week_label(&self) -> String {
        format!("{}-W{:02}", self.year, self.week)
    }

    /// Cycles since the last preventive service.
    ///
    /// Resolution order: the pre-computed column, then the main value minus
    /// the preventive baseline, then the ERP counter minus the baseline.
    /// `None` when no combination is available.
    pub fn delta_since_preventive(&self) -> Option<f64> {
        if let Some(delta) = self.cycles_since_preventive {
            return Some(delta);
        }
        let base = self.value.or(self.oracle_cycles)?;
        let preventive = self.last_preventive_cycle?;
        Some(base - preventive)
    }
}
