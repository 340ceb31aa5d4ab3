//! Maintenance alert records

use crate::reading::{year_week_key, ReadingId};
use assets::AssetId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Alert identifier
pub type AlertId = i64;

/// Alert workflow status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AlertStatus {
    #[default]
    New,
    /// Picked up by maintenance planning
    InProgress,
    Closed,
}

impl AlertStatus {
    pub fn is_open(&self) -> bool {
        matches!(self, AlertStatus::New | AlertStatus::InProgress)
    }
}

impl fmt::Display for AlertStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AlertStatus::New => "NEW",
            AlertStatus::InProgress => "IN_PROGRESS",
            AlertStatus::Closed => "CLOSED",
        };
        write!(f, "{name}")
    }
}

/// Threshold-breach alert, unique per (asset, year, week)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaintenanceAlert {
    pub id: AlertId,
    pub asset: AssetId,
    /// Reading that opened (or last updated) the alert
    pub reading: Option<ReadingId>,
    pub year: i32,
    pub week: u32,
    /// Cycles since the last preventive at the triggering reading
    pub cycles: f64,
    /// Threshold in force when the alert fired
    pub threshold: f64,
    pub status: AlertStatus,
    pub notes: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub closed_at: Option<DateTime<Utc>>,
}

impl MaintenanceAlert {
    pub fn new(id: AlertId, asset: AssetId, year: i32, week: u32, cycles: f64, threshold: f64) -> Self {
        let now = Utc::now();
        Self {
            id,
            asset,
            reading: None,
            year,
            week,
            cycles,
            threshold,
            status: AlertStatus::New,
            notes: String::new(),
            created_at: now,
            updated_at: now,
            closed_at: None,
        }
    }

    pub fn is_open(&self) -> bool {
        self.status.is_open()
    }

    /// Comparable (year, week) key
    pub fn key(&self) -> i64 {
        year_week_key(self.year, self.week)
    }

    /// Close and stamp; no-op when already closed
    pub fn close(&mut self) {
        if self.status == AlertStatus::Closed {
            return;
        }
        let now = Utc::now();
        self.status = AlertStatus::Closed;
        self.closed_at = Some(now);
        self.updated_at = now;
    }

    /// New cycles value from a re-synced reading; an in-progress alert keeps
    /// its status
    pub fn update_metrics(&mut self, cycles: f64, threshold: f64) {
        self.cycles = cycles;
        self.threshold = threshold;
        self.updated_at = Utc::now();
    }

    /// Move a fresh alert into planning
    pub fn acknowledge(&mut self) {
        if self.status == AlertStatus::New {
            self.status = AlertStatus::InProgress;
            self.updated_at = Utc::now();
        }
    }
}
