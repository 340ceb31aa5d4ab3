//! Preventive baselines
//!
//! Closing a preventive order resets the meter baseline: the reading for
//! the execution week takes the closure counter as its new
//! last-preventive-cycle and its delta restarts at zero.

use crate::reading::MeterReading;
use chrono::{Datelike, NaiveDate};
use tracing::info;

/// ISO (year, week) for a calendar date
pub fn iso_year_week(date: NaiveDate) -> (i32, u32) {
    let iso = date.iso_week();
    (iso.year(), iso.week())
}

/// Counter value to baseline on: the order's captured execution reading,
/// else the weekly value, else the ERP counter
pub fn baseline_value(execution_reading: Option<f64>, reading: &MeterReading) -> Option<f64> {
    execution_reading.or(reading.value).or(reading.oracle_cycles)
}

/// Stamp the baseline onto a reading and restart its delta
pub fn apply_baseline(reading: &mut MeterReading, baseline: f64) {
    reading.last_preventive_cycle = Some(baseline);
    reading.cycles_since_preventive = Some(0.0);
    info!(
        "Preventive baseline {} set on asset {} at {}",
        baseline,
        reading.asset,
        reading.week_label()
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_iso_year_week_handles_year_boundary() {
        // 2024-12-30 falls in ISO week 1 of 2025
        let date = NaiveDate::from_ymd_opt(2024, 12, 30).unwrap();
        assert_eq!(iso_year_week(date), (2025, 1));

        let date = NaiveDate::from_ymd_opt(2024, 6, 15).unwrap();
        assert_eq!(iso_year_week(date), (2024, 24));
    }

    #[test]
    fn test_baseline_value_priority() {
        let mut reading = MeterReading::new(1, 1, 2024, 7, 90_000.0);
        reading.oracle_cycles = Some(88_000.0);

        assert_eq!(baseline_value(Some(91_000.0), &reading), Some(91_000.0));
        assert_eq!(baseline_value(None, &reading), Some(90_000.0));

        reading.value = None;
        assert_eq!(baseline_value(None, &reading), Some(88_000.0));

        reading.oracle_cycles = None;
        assert_eq!(baseline_value(None, &reading), None);
    }

    #[test]
    fn test_apply_baseline_restarts_delta() {
        let mut reading = MeterReading::new(1, 1, 2024, 7, 90_000.0);
        reading.cycles_since_preventive = Some(75_000.0);
        apply_baseline(&mut reading, 90_000.0);
        assert_eq!(reading.last_preventive_cycle, Some(90_000.0));
        assert_eq!(reading.cycles_since_preventive, Some(0.0));
        assert_eq!(reading.delta_since_preventive(), Some(0.0));
    }
}
