//! Preventive plan records

use assets::AssetId;
use checklists::TemplateId;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Plan identifier
pub type PlanId = i64;

/// What makes a plan fire
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum PlanTrigger {
    /// Calendar cadence
    EveryDays(u32),
    /// Cycles accumulated since the last preventive service
    EveryCycles(f64),
    /// Fired explicitly (inspection findings, campaigns)
    OnEvent,
}

/// A recurring preventive maintenance plan for one asset
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreventivePlan {
    pub id: PlanId,
    pub asset: AssetId,
    pub name: String,
    /// Preventive template applied to generated orders
    pub template: TemplateId,
    pub trigger: PlanTrigger,
    pub last_run: Option<DateTime<Utc>>,
    /// Next calendar due date (day-triggered plans)
    pub next_date: Option<NaiveDate>,
    pub enabled: bool,
}

impl PreventivePlan {
    pub fn new(
        id: PlanId,
        asset: AssetId,
        name: impl Into<String>,
        template: TemplateId,
        trigger: PlanTrigger,
    ) -> Self {
        Self {
            id,
            asset,
            name: name.into(),
            template,
            trigger,
            last_run: None,
            next_date: None,
            enabled: true,
        }
    }

    /// Calendar date a day-triggered plan comes due; `None` for other triggers
    pub fn due_date(&self) -> Option<NaiveDate> {
        match self.trigger {
            PlanTrigger::EveryDays(days) => self
                .next_date
                .or_else(|| self.last_run.map(|run| run.date_naive() + Duration::days(i64::from(days)))),
            _ => None,
        }
    }

    /// Whether the plan is due.
    ///
    /// `latest_delta` is the asset's current cycles-since-preventive, for
    /// cycle-triggered plans. A day-triggered plan that never ran is due
    /// immediately.
    pub fn is_due(&self, today: NaiveDate, latest_delta: Option<f64>) -> bool {
        if !self.enabled {
            return false;
        }
        match self.trigger {
            PlanTrigger::EveryDays(_) => match self.due_date() {
                Some(due) => due <= today,
                None => true,
            },
            PlanTrigger::EveryCycles(cycles) => latest_delta.is_some_and(|d| d >= cycles),
            PlanTrigger::OnEvent => false,
        }
    }

    /// Stamp a run and advance the calendar for day-triggered plans
    pub fn mark_run(&mut self, now: DateTime<Utc>) {
        self.last_run = Some(now);
        if let PlanTrigger::EveryDays(days) = self.trigger {
            self.next_date = Some(now.date_naive() + Duration::days(i64::from(days)));
        }
    }
}
