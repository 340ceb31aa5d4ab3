//! Plan Scheduler Implementation

use crate::plan::{PlanId, PlanTrigger, PreventivePlan};
use assets::AssetId;
use chrono::{DateTime, NaiveDate, Utc};
use std::cmp::Ordering;
use std::collections::BinaryHeap;
use tracing::{debug, info};

/// A plan that has come due, ordered earliest-first
#[derive(Debug, Clone)]
struct DuePlan {
    plan: PlanId,
    /// Calendar due date; cycle-triggered plans are due "today"
    due: NaiveDate,
}

impl Eq for DuePlan {}

impl PartialEq for DuePlan {
    fn eq(&self, other: &Self) -> bool {
        self.due == other.due && self.plan == other.plan
    }
}

impl Ord for DuePlan {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse ordering for min-heap behavior (earliest date first),
        // then lowest plan id
        other
            .due
            .cmp(&self.due)
            .then_with(|| other.plan.cmp(&self.plan))
    }
}

impl PartialOrd for DuePlan {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Owns the preventive plans and computes which are due
pub struct PlanScheduler {
    plans: Vec<PreventivePlan>,
    next_id: PlanId,
}

impl PlanScheduler {
    pub fn new() -> Self {
        Self { plans: Vec::new(), next_id: 1 }
    }

    /// Register a plan; the scheduler assigns its id
    pub fn add_plan(
        &mut self,
        asset: AssetId,
        name: impl Into<String>,
        template: i64,
        trigger: PlanTrigger,
    ) -> PlanId {
        let id = self.next_id;
        self.next_id += 1;
        let plan = PreventivePlan::new(id, asset, name, template, trigger);
        info!("Registered preventive plan {} for asset {}", id, asset);
        self.plans.push(plan);
        id
    }

    pub fn get(&self, id: PlanId) -> Option<&PreventivePlan> {
        self.plans.iter().find(|p| p.id == id)
    }

    pub fn set_enabled(&mut self, id: PlanId, enabled: bool) -> bool {
        match self.plans.iter_mut().find(|p| p.id == id) {
            Some(plan) => {
                plan.enabled = enabled;
                true
            }
            None => false,
        }
    }

    /// Plans due today, earliest first.
    ///
    /// `delta_for` supplies the asset's current cycles-since-preventive for
    /// cycle-triggered plans.
    pub fn due_plans(&self, today: NaiveDate, delta_for: impl Fn(AssetId) -> Option<f64>) -> Vec<PlanId> {
        let mut heap = BinaryHeap::new();
        for plan in &self.plans {
            let delta = match plan.trigger {
                PlanTrigger::EveryCycles(_) => delta_for(plan.asset),
                _ => None,
            };
            if plan.is_due(today, delta) {
                let due = plan.due_date().unwrap_or(today);
                debug!("Plan {} due on {}", plan.id, due);
                heap.push(DuePlan { plan: plan.id, due });
            }
        }

        let mut out = Vec::with_capacity(heap.len());
        while let Some(due) = heap.pop() {
            out.push(due.plan);
        }
        out
    }

    /// Stamp a run on a plan; true when the plan exists
    pub fn mark_run(&mut self, id: PlanId, now: DateTime<Utc>) -> bool {
        match self.plans.iter_mut().find(|p| p.id == id) {
            Some(plan) => {
                plan.mark_run(now);
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.plans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plans.is_empty()
    }
}

impl Default for PlanScheduler {
    fn default() -> Self {
        Self::new()
    }
}
