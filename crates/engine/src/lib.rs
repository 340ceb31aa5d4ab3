//! Maintenance Engine
//!
//! Wires the repository, the work-order state machine, template resolution,
//! the cycle-meter alert rules and the preventive scheduler into one
//! service. Every mutation with follow-on effects (a reading insert
//! re-syncing alerts, a preventive closure baselining the meter) goes
//! through here.

mod config;

pub use crate::config::EngineConfig;

use alerting::{
    apply_baseline, baseline_value, decide, iso_year_week, MaintenanceAlert, MeterReading,
    Severity, SkipReason, SyncDecision, SyncOptions, SyncOutcome,
};
use assets::{Asset, AssetFamily, AssetId, FaultCode, ImportSummary, TaxonomyImporter, TaxonomyRow};
use checklists::{best_match, ChecklistTemplate, MaintenanceKind, MaintenanceTask, TaskId};
use chrono::{NaiveDate, Utc};
use scheduler::{PlanId, PlanScheduler, PlanTrigger};
use std::sync::{Arc, Mutex};
use storage::{Repository, StorageError};
use thiserror::Error;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;
use work_orders::{
    issue_title, should_escalate, IssueReport, OrderHistoryEntry, OrderId, OrderPriority,
    OrderStatus, TransitionError, UserId, WorkOrder,
};

/// Engine errors
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Transition(#[from] TransitionError),

    #[error("Scheduler lock poisoned")]
    SchedulerLock,

    #[error("Unknown plan id {0}")]
    UnknownPlan(PlanId),
}

/// What one sweep did
#[derive(Debug, Clone, Default)]
pub struct SweepReport {
    /// Orders generated from due preventive plans
    pub orders_created: Vec<OrderId>,
    pub alerts_created: usize,
    pub alerts_updated: usize,
    pub alerts_closed: usize,
}

/// The maintenance service facade
pub struct MaintenanceEngine {
    repo: Arc<Repository>,
    scheduler: Mutex<PlanScheduler>,
    config: EngineConfig,
}

impl MaintenanceEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self::with_repository(config, Arc::new(Repository::new()))
    }

    pub fn with_repository(config: EngineConfig, repo: Arc<Repository>) -> Self {
        info!(
            "Maintenance engine starting (alert threshold {} cycles)",
            config.alert_threshold
        );
        Self {
            repo,
            scheduler: Mutex::new(PlanScheduler::new()),
            config,
        }
    }

    /// Shared handle to the backing repository
    pub fn repository(&self) -> Arc<Repository> {
        Arc::clone(&self.repo)
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    // ---------------- Registry ----------------

    pub fn register_asset(&self, asset: Asset) -> Result<Asset, EngineError> {
        Ok(self.repo.insert_asset(asset)?)
    }

    pub fn register_family(&self, name: impl Into<String>) -> Result<AssetFamily, EngineError> {
        Ok(self.repo.insert_family(AssetFamily { id: 0, name: name.into() })?)
    }

    pub fn register_fault(&self, fault: FaultCode) -> Result<FaultCode, EngineError> {
        Ok(self.repo.insert_fault(fault)?)
    }

    pub fn register_task(&self, name: impl Into<String>, description: impl Into<String>) -> Result<MaintenanceTask, EngineError> {
        Ok(self.repo.insert_task(MaintenanceTask {
            id: 0,
            name: name.into(),
            description: description.into(),
        })?)
    }

    pub fn register_template(&self, template: ChecklistTemplate) -> Result<ChecklistTemplate, EngineError> {
        Ok(self.repo.insert_template(template)?)
    }

    /// Upsert taxonomy rows for an asset
    pub fn import_taxonomy(
        &self,
        asset: AssetId,
        rows: Vec<TaxonomyRow>,
    ) -> Result<ImportSummary, EngineError> {
        // Fail fast on unknown assets rather than importing orphans
        self.repo.get_asset(asset)?;
        let importer = TaxonomyImporter::new(asset);
        Ok(self.repo.with_taxonomy(|tax| importer.import(tax, rows))?)
    }

    // ---------------- Readings and alerts ----------------

    /// Insert a weekly reading and immediately re-sync the asset's alert
    pub fn record_reading(
        &self,
        reading: MeterReading,
    ) -> Result<(MeterReading, SyncOutcome), EngineError> {
        let stored = self.repo.insert_reading(reading)?;
        let outcome = self.sync_alert_for_reading(&stored, SyncOptions::default())?;
        Ok((stored, outcome))
    }

    /// Apply the alert rules for one reading
    pub fn sync_alert_for_reading(
        &self,
        reading: &MeterReading,
        options: SyncOptions,
    ) -> Result<SyncOutcome, EngineError> {
        let later = self.repo.has_later_reading(reading.asset, reading.key())?;
        let open = self.repo.open_alert_for(reading.asset)?;
        let thresholds = self.config.thresholds();

        if let Some(delta) = reading.delta_since_preventive() {
            if thresholds.severity(delta) == Severity::Warning {
                warn!(
                    "Asset {} at {:.0} cycles since preventive at {}, inside the warning band",
                    reading.asset,
                    delta,
                    reading.week_label()
                );
            }
        }

        let decision = decide(reading, later, open.as_ref(), thresholds, options);

        let mut outcome = SyncOutcome::default();
        match decision {
            SyncDecision::Skip(reason) => {
                outcome = SyncOutcome::skipped(reason);
            }
            SyncDecision::Clear => {
                // decide() only clears when an open alert exists
                if let Some(mut alert) = open {
                    alert.close();
                    self.repo.update_alert(&alert)?;
                    info!("Alert {} closed for asset {}", alert.id, alert.asset);
                    outcome.closed_existing = true;
                }
            }
            SyncDecision::Raise { cycles, close_previous_open } => {
                if close_previous_open {
                    if let Some(mut stale) = open {
                        stale.close();
                        self.repo.update_alert(&stale)?;
                        outcome.closed_previous = true;
                    }
                }
                match self.repo.alert_for_week(reading.asset, reading.year, reading.week)? {
                    Some(mut existing) => {
                        existing.update_metrics(cycles, self.config.alert_threshold);
                        self.repo.update_alert(&existing)?;
                        outcome.updated = true;
                    }
                    None => {
                        let mut alert = MaintenanceAlert::new(
                            0,
                            reading.asset,
                            reading.year,
                            reading.week,
                            cycles,
                            self.config.alert_threshold,
                        );
                        alert.reading = Some(reading.id);
                        let alert = self.repo.insert_alert(alert)?;
                        warn!(
                            "Alert {} opened for asset {} at {} ({} cycles)",
                            alert.id,
                            alert.asset,
                            reading.week_label(),
                            cycles
                        );
                        outcome.created = true;
                    }
                }
            }
        }
        Ok(outcome)
    }

    /// Re-sync using the asset's latest reading
    pub fn sync_alert_for_latest_of(&self, asset: AssetId) -> Result<SyncOutcome, EngineError> {
        match self.repo.latest_reading_for(asset)? {
            Some(reading) => self.sync_alert_for_reading(&reading, SyncOptions::default()),
            None => Ok(SyncOutcome::skipped(SkipReason::NoReadings)),
        }
    }

    /// Recompute every asset's alert from its latest reading.
    ///
    /// Returns (created, updated, closed) counts.
    pub fn recompute_all_alerts(&self) -> Result<(usize, usize, usize), EngineError> {
        let mut created = 0;
        let mut updated = 0;
        let mut closed = 0;
        for asset in self.repo.assets_with_readings()? {
            let outcome = self.sync_alert_for_latest_of(asset)?;
            if outcome.created {
                created += 1;
            }
            if outcome.updated {
                updated += 1;
            }
            if outcome.closed_any() {
                closed += 1;
            }
        }
        Ok((created, updated, closed))
    }

    /// Alerts, optionally only the open ones, newest week first
    pub fn list_alerts(&self, open_only: bool) -> Result<Vec<MaintenanceAlert>, EngineError> {
        Ok(self.repo.list_alerts(open_only)?)
    }

    /// Move a fresh alert into planning
    pub fn acknowledge_alert(&self, alert: i64) -> Result<MaintenanceAlert, EngineError> {
        let mut alert = self.repo.get_alert(alert)?;
        alert.acknowledge();
        self.repo.update_alert(&alert)?;
        Ok(alert)
    }

    /// Manual alert closure (planning decision, not rule-driven)
    pub fn close_alert(&self, alert: i64) -> Result<MaintenanceAlert, EngineError> {
        let mut alert = self.repo.get_alert(alert)?;
        alert.close();
        self.repo.update_alert(&alert)?;
        Ok(alert)
    }

    // ---------------- Work orders ----------------

    /// Create an order, resolving and applying the best-matching template
    pub fn create_order(
        &self,
        asset: AssetId,
        kind: MaintenanceKind,
        title: impl Into<String>,
        fault: Option<i64>,
        priority: OrderPriority,
        user: Option<UserId>,
    ) -> Result<WorkOrder, EngineError> {
        let asset_rec = self.repo.get_asset(asset)?;
        let mut order = WorkOrder::new(0, asset, kind, title);
        order.fault = fault;
        order.priority = priority;
        order.created_by = user;

        let templates = self.repo.list_templates()?;
        if let Some(template) = best_match(&templates, &asset_rec, kind, fault) {
            order.apply_template(template);
        }

        let order = self.repo.insert_order(order)?;
        self.repo
            .append_history(OrderHistoryEntry::creation(0, order.id, order.status, user))?;
        info!("Created {} order {} for asset {}", kind, order.id, asset);
        Ok(order)
    }

    pub fn assign_order(&self, order: OrderId, user: UserId) -> Result<WorkOrder, EngineError> {
        let mut order = self.repo.get_order(order)?;
        order.assigned_to = Some(user);
        self.repo.update_order(&order)?;
        Ok(order)
    }

    /// Record execution context used for preventive baselining
    pub fn set_execution_details(
        &self,
        order: OrderId,
        year: i32,
        week: u32,
        reading: Option<f64>,
    ) -> Result<WorkOrder, EngineError> {
        let mut order = self.repo.get_order(order)?;
        order.execution_year = Some(year);
        order.execution_week = Some(week);
        order.execution_reading = reading;
        self.repo.update_order(&order)?;
        Ok(order)
    }

    /// Tick one checklist task; true when the entry existed
    pub fn complete_task(
        &self,
        order: OrderId,
        task: TaskId,
        notes: Option<String>,
    ) -> Result<bool, EngineError> {
        let mut order = self.repo.get_order(order)?;
        let hit = order.complete_task(task, notes);
        if hit {
            self.repo.update_order(&order)?;
        }
        Ok(hit)
    }

    /// Drive the state machine, persist, log history, run closure effects
    pub fn transition_order(
        &self,
        order: OrderId,
        to: OrderStatus,
        user: Option<UserId>,
    ) -> Result<WorkOrder, EngineError> {
        let mut order = self.repo.get_order(order)?;
        if let Some(change) = order.transition_to(to, user)? {
            self.repo.update_order(&order)?;
            self.repo
                .append_history(OrderHistoryEntry::from_change(0, order.id, change, ""))?;
            if change.to == OrderStatus::Closed {
                self.after_closure(&order)?;
            }
        }
        Ok(order)
    }

    /// Closure side effects: preventive orders baseline the meter, every
    /// closure re-syncs the asset's alert
    fn after_closure(&self, order: &WorkOrder) -> Result<(), EngineError> {
        if order.kind != MaintenanceKind::Preventive {
            self.sync_alert_for_latest_of(order.asset)?;
            return Ok(());
        }

        let (year, week) = match (order.execution_year, order.execution_week) {
            (Some(year), Some(week)) => (year, week),
            _ => {
                let date = order
                    .closed_at
                    .map(|t| t.date_naive())
                    .unwrap_or_else(|| Utc::now().date_naive());
                iso_year_week(date)
            }
        };

        let reading = match self.repo.reading_for_week(order.asset, year, week)? {
            Some(reading) => Some(reading),
            None => self.repo.latest_reading_for(order.asset)?,
        };
        let Some(mut reading) = reading else {
            // No readings yet; nothing to baseline
            return Ok(());
        };
        let Some(baseline) = baseline_value(order.execution_reading, &reading) else {
            return Ok(());
        };

        apply_baseline(&mut reading, baseline);
        self.repo.update_reading(&reading)?;
        self.sync_alert_for_latest_of(order.asset)?;
        Ok(())
    }

    // ---------------- Issue reports ----------------

    pub fn report_issue(
        &self,
        asset: AssetId,
        description: impl Into<String>,
        fault: Option<i64>,
        user: Option<UserId>,
    ) -> Result<IssueReport, EngineError> {
        self.repo.get_asset(asset)?;
        let mut issue = IssueReport::new(0, asset, description);
        issue.fault = fault;
        issue.reported_by = user;
        Ok(self.repo.insert_issue(issue)?)
    }

    /// Escalate an issue to a high-priority corrective order when its fault
    /// is critical (or when forced). An already-escalated issue hands back
    /// its linked order; `None` means the issue did not qualify.
    pub fn escalate_issue(
        &self,
        issue: i64,
        force: bool,
    ) -> Result<Option<WorkOrder>, EngineError> {
        let mut issue = self.repo.get_issue(issue)?;
        if let Some(order) = issue.work_order {
            return Ok(Some(self.repo.get_order(order)?));
        }
        let fault_code = match issue.fault {
            Some(fault) => Some(self.repo.get_fault(fault)?.code),
            None => None,
        };
        if !should_escalate(&issue, fault_code.as_deref(), &self.config.critical_faults, force) {
            return Ok(None);
        }

        let order = self.create_order(
            issue.asset,
            MaintenanceKind::Corrective,
            issue_title(&issue.description),
            issue.fault,
            OrderPriority::High,
            issue.reported_by,
        )?;
        issue.work_order = Some(order.id);
        self.repo.update_issue(&issue)?;
        info!("Issue {} escalated to order {}", issue.id, order.id);
        Ok(Some(order))
    }

    // ---------------- Preventive plans ----------------

    pub fn register_plan(
        &self,
        asset: AssetId,
        name: impl Into<String>,
        template: i64,
        trigger: PlanTrigger,
    ) -> Result<PlanId, EngineError> {
        self.repo.get_asset(asset)?;
        self.repo.get_template(template)?;
        let mut scheduler = self.scheduler.lock().map_err(|_| EngineError::SchedulerLock)?;
        Ok(scheduler.add_plan(asset, name, template, trigger))
    }

    /// Generate preventive orders for every due plan
    pub fn run_due_plans(&self, today: NaiveDate) -> Result<Vec<OrderId>, EngineError> {
        let due = {
            let scheduler = self.scheduler.lock().map_err(|_| EngineError::SchedulerLock)?;
            scheduler.due_plans(today, |asset| self.latest_delta(asset))
        };

        let mut created = Vec::with_capacity(due.len());
        for plan_id in due {
            let (asset, name, template) = {
                let scheduler = self.scheduler.lock().map_err(|_| EngineError::SchedulerLock)?;
                let plan = scheduler.get(plan_id).ok_or(EngineError::UnknownPlan(plan_id))?;
                (plan.asset, plan.name.clone(), plan.template)
            };

            let template = self.repo.get_template(template)?;
            let mut order = WorkOrder::new(0, asset, MaintenanceKind::Preventive, name);
            order.apply_template(&template);
            let order = self.repo.insert_order(order)?;
            self.repo
                .append_history(OrderHistoryEntry::creation(0, order.id, order.status, None))?;

            let mut scheduler = self.scheduler.lock().map_err(|_| EngineError::SchedulerLock)?;
            scheduler.mark_run(plan_id, Utc::now());
            created.push(order.id);
        }
        if !created.is_empty() {
            info!("Generated {} preventive orders from due plans", created.len());
        }
        Ok(created)
    }

    fn latest_delta(&self, asset: AssetId) -> Option<f64> {
        self.repo
            .latest_reading_for(asset)
            .ok()
            .flatten()
            .and_then(|r| r.delta_since_preventive())
    }

    /// One periodic pass: fire due plans, then recompute alerts
    pub fn sweep(&self, today: NaiveDate) -> Result<SweepReport, EngineError> {
        let orders_created = self.run_due_plans(today)?;
        let (alerts_created, alerts_updated, alerts_closed) = self.recompute_all_alerts()?;
        Ok(SweepReport { orders_created, alerts_created, alerts_updated, alerts_closed })
    }
}

/// Install the global tracing subscriber (binary entry point only)
pub fn init_logging() {
    let subscriber = FmtSubscriber::builder().with_max_level(Level::INFO).finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
}

#[cfg(test)]
mod tests {
    use super::*;
    use checklists::{TemplateItem, TemplateScope};

    fn engine() -> MaintenanceEngine {
        MaintenanceEngine::new(EngineConfig::default())
    }

    fn press(engine: &MaintenanceEngine) -> Asset {
        engine
            .register_asset(Asset::new(0, "PM-001", "4711", "Press 12"))
            .unwrap()
    }

    fn reading(asset: AssetId, year: i32, week: u32, value: f64, baseline: f64) -> MeterReading {
        let mut r = MeterReading::new(0, asset, year, week, value);
        r.last_preventive_cycle = Some(baseline);
        r
    }

    fn preventive_template(engine: &MaintenanceEngine, tasks: &[TaskId]) -> ChecklistTemplate {
        let mut tpl =
            ChecklistTemplate::new(0, "PM weekly", MaintenanceKind::Preventive, TemplateScope::Global);
        for (i, task) in tasks.iter().enumerate() {
            tpl.items.push(TemplateItem::new(*task, i as u16).mandatory());
        }
        engine.register_template(tpl).unwrap()
    }

    #[test]
    fn test_reading_over_threshold_opens_alert() {
        let engine = engine();
        let asset = press(&engine);

        let (_, outcome) = engine
            .record_reading(reading(asset.id, 2024, 7, 85_000.0, 10_000.0))
            .unwrap();
        assert!(outcome.created);

        let open = engine.repository().open_alert_for(asset.id).unwrap().unwrap();
        assert_eq!(open.cycles, 75_000.0);
        assert_eq!((open.year, open.week), (2024, 7));
    }

    #[test]
    fn test_next_week_reading_moves_alert_forward() {
        let engine = engine();
        let asset = press(&engine);

        engine.record_reading(reading(asset.id, 2024, 7, 85_000.0, 10_000.0)).unwrap();
        let (_, outcome) = engine
            .record_reading(reading(asset.id, 2024, 8, 86_000.0, 10_000.0))
            .unwrap();

        assert!(outcome.created);
        assert!(outcome.closed_previous);
        let open = engine.repository().open_alert_for(asset.id).unwrap().unwrap();
        assert_eq!(open.week, 8);
    }

    #[test]
    fn test_stale_week_reading_is_ignored() {
        let engine = engine();
        let asset = press(&engine);

        engine.record_reading(reading(asset.id, 2024, 8, 1_000.0, 0.0)).unwrap();
        // Back-filled older week, way over threshold; must not alert
        let (_, outcome) = engine
            .record_reading(reading(asset.id, 2024, 5, 95_000.0, 0.0))
            .unwrap();

        assert!(outcome.skipped);
        assert_eq!(outcome.reason, Some(SkipReason::NotLatestWeek));
        assert!(engine.repository().open_alert_for(asset.id).unwrap().is_none());
    }

    #[test]
    fn test_preventive_closure_baselines_and_clears_alert() {
        let engine = engine();
        let asset = press(&engine);
        let task = engine.register_task("Grease rails", "").unwrap();
        preventive_template(&engine, &[task.id]);

        // Breach: 75k cycles since last preventive
        engine.record_reading(reading(asset.id, 2024, 7, 85_000.0, 10_000.0)).unwrap();
        assert!(engine.repository().open_alert_for(asset.id).unwrap().is_some());

        // Preventive order lifecycle, executed on week 7
        let order = engine
            .create_order(asset.id, MaintenanceKind::Preventive, "PM", None, OrderPriority::Medium, Some(1))
            .unwrap();
        assert_eq!(order.checklist.len(), 1);
        engine.assign_order(order.id, 42).unwrap();
        engine.set_execution_details(order.id, 2024, 7, Some(85_000.0)).unwrap();
        engine.transition_order(order.id, OrderStatus::InProgress, Some(42)).unwrap();
        engine.complete_task(order.id, task.id, None).unwrap();
        engine.transition_order(order.id, OrderStatus::InReview, Some(42)).unwrap();
        let closed = engine.transition_order(order.id, OrderStatus::Closed, Some(7)).unwrap();
        assert_eq!(closed.status, OrderStatus::Closed);
        assert_eq!(closed.completed_by, Some(7));

        // Baseline reset the delta and the re-sync closed the alert
        let updated = engine
            .repository()
            .reading_for_week(asset.id, 2024, 7)
            .unwrap()
            .unwrap();
        assert_eq!(updated.last_preventive_cycle, Some(85_000.0));
        assert_eq!(updated.cycles_since_preventive, Some(0.0));
        assert!(engine.repository().open_alert_for(asset.id).unwrap().is_none());

        // Creation + three transitions in the history log
        let history = engine.repository().history_for(order.id).unwrap();
        assert_eq!(history.len(), 4);
    }

    #[test]
    fn test_closure_without_execution_details_baselines_latest_reading() {
        let engine = engine();
        let asset = press(&engine);
        let task = engine.register_task("Grease rails", "").unwrap();
        preventive_template(&engine, &[task.id]);

        engine.record_reading(reading(asset.id, 2024, 7, 85_000.0, 10_000.0)).unwrap();
        assert!(engine.repository().open_alert_for(asset.id).unwrap().is_some());

        // No execution details: closure falls back to the closure date's
        // week, which has no reading, so the latest one takes the baseline
        let order = engine
            .create_order(asset.id, MaintenanceKind::Preventive, "PM", None, OrderPriority::Medium, None)
            .unwrap();
        engine.assign_order(order.id, 42).unwrap();
        engine.transition_order(order.id, OrderStatus::InProgress, Some(42)).unwrap();
        engine.complete_task(order.id, task.id, None).unwrap();
        engine.transition_order(order.id, OrderStatus::InReview, Some(42)).unwrap();
        engine.transition_order(order.id, OrderStatus::Closed, Some(42)).unwrap();

        let latest = engine.repository().latest_reading_for(asset.id).unwrap().unwrap();
        assert_eq!((latest.year, latest.week), (2024, 7));
        assert_eq!(latest.last_preventive_cycle, Some(85_000.0));
        assert_eq!(latest.cycles_since_preventive, Some(0.0));
        assert!(engine.repository().open_alert_for(asset.id).unwrap().is_none());
    }

    #[test]
    fn test_execution_week_without_reading_falls_back_to_latest() {
        let engine = engine();
        let asset = press(&engine);
        let task = engine.register_task("Grease rails", "").unwrap();
        preventive_template(&engine, &[task.id]);

        engine.record_reading(reading(asset.id, 2024, 7, 85_000.0, 10_000.0)).unwrap();

        // Executed on week 10, but week 10 has no reading on file
        let order = engine
            .create_order(asset.id, MaintenanceKind::Preventive, "PM", None, OrderPriority::Medium, None)
            .unwrap();
        engine.assign_order(order.id, 42).unwrap();
        engine.set_execution_details(order.id, 2024, 10, Some(90_000.0)).unwrap();
        engine.transition_order(order.id, OrderStatus::InProgress, Some(42)).unwrap();
        engine.complete_task(order.id, task.id, None).unwrap();
        engine.transition_order(order.id, OrderStatus::InReview, Some(42)).unwrap();
        engine.transition_order(order.id, OrderStatus::Closed, Some(42)).unwrap();

        let latest = engine.repository().latest_reading_for(asset.id).unwrap().unwrap();
        assert_eq!(latest.week, 7);
        assert_eq!(latest.last_preventive_cycle, Some(90_000.0));
        assert!(engine.repository().open_alert_for(asset.id).unwrap().is_none());
    }

    #[test]
    fn test_preventive_closure_without_readings_is_a_noop() {
        let engine = engine();
        let asset = press(&engine);
        let task = engine.register_task("Grease rails", "").unwrap();
        preventive_template(&engine, &[task.id]);

        let order = engine
            .create_order(asset.id, MaintenanceKind::Preventive, "PM", None, OrderPriority::Medium, None)
            .unwrap();
        engine.assign_order(order.id, 42).unwrap();
        engine.transition_order(order.id, OrderStatus::InProgress, Some(42)).unwrap();
        engine.complete_task(order.id, task.id, None).unwrap();
        engine.transition_order(order.id, OrderStatus::InReview, Some(42)).unwrap();
        let closed = engine.transition_order(order.id, OrderStatus::Closed, Some(42)).unwrap();

        assert_eq!(closed.status, OrderStatus::Closed);
        assert_eq!(engine.repository().alert_count(), 0);
    }

    #[test]
    fn test_corrective_closure_resyncs_without_baselining() {
        let engine = engine();
        let asset = press(&engine);
        let task = engine.register_task("Replace seal", "").unwrap();
        let mut tpl =
            ChecklistTemplate::new(0, "COR generic", MaintenanceKind::Corrective, TemplateScope::Global);
        tpl.items.push(TemplateItem::new(task.id, 0));
        engine.register_template(tpl).unwrap();

        engine.record_reading(reading(asset.id, 2024, 7, 85_000.0, 10_000.0)).unwrap();
        let alert = engine.repository().open_alert_for(asset.id).unwrap().unwrap();

        let order = engine
            .create_order(asset.id, MaintenanceKind::Corrective, "Seal leak", None, OrderPriority::High, Some(1))
            .unwrap();
        engine.assign_order(order.id, 42).unwrap();
        engine.transition_order(order.id, OrderStatus::InProgress, Some(42)).unwrap();
        engine.complete_task(order.id, task.id, None).unwrap();
        engine.transition_order(order.id, OrderStatus::InReview, Some(42)).unwrap();
        engine.transition_order(order.id, OrderStatus::Closed, Some(42)).unwrap();

        // No baseline: the meter keeps its breach and the alert stays open
        let latest = engine.repository().latest_reading_for(asset.id).unwrap().unwrap();
        assert_eq!(latest.last_preventive_cycle, Some(10_000.0));
        assert!(latest.cycles_since_preventive.is_none());
        let still_open = engine.repository().open_alert_for(asset.id).unwrap().unwrap();
        assert_eq!(still_open.id, alert.id);
        assert!(still_open.updated_at >= alert.updated_at);
    }

    #[test]
    fn test_warning_band_never_opens_alert() {
        let engine = engine();
        let asset = press(&engine);

        // 65k since preventive: inside the warning band, under the threshold
        let (_, outcome) = engine
            .record_reading(reading(asset.id, 2024, 7, 75_000.0, 10_000.0))
            .unwrap();

        assert!(outcome.skipped);
        assert_eq!(outcome.reason, Some(SkipReason::BelowThreshold));
        assert!(engine.repository().open_alert_for(asset.id).unwrap().is_none());
    }

    #[test]
    fn test_template_resolution_prefers_asset_scope() {
        let engine = engine();
        let family = engine.register_family("Presses").unwrap();
        let asset = press(&engine);
        engine.repository().set_asset_family(asset.id, Some(family.id)).unwrap();
        let task = engine.register_task("Check oil", "").unwrap();

        let mut family_tpl =
            ChecklistTemplate::new(0, "family", MaintenanceKind::Preventive, TemplateScope::Family(family.id));
        family_tpl.items.push(TemplateItem::new(task.id, 0));
        engine.register_template(family_tpl).unwrap();

        let mut asset_tpl =
            ChecklistTemplate::new(0, "asset", MaintenanceKind::Preventive, TemplateScope::Asset(asset.id));
        asset_tpl.items.push(TemplateItem::new(task.id, 0));
        asset_tpl.items.push(TemplateItem::new(task.id + 1, 1));
        let asset_tpl = engine.register_template(asset_tpl).unwrap();

        let order = engine
            .create_order(asset.id, MaintenanceKind::Preventive, "PM", None, OrderPriority::Medium, None)
            .unwrap();
        assert_eq!(order.applied_template, Some(asset_tpl.id));
        assert_eq!(order.checklist.len(), 2);
    }

    #[test]
    fn test_critical_issue_escalates_to_corrective_order() {
        let mut config = EngineConfig::default();
        config.critical_faults = vec!["F-SEIZE".to_string()];
        let engine = MaintenanceEngine::new(config);
        let asset = press(&engine);
        let fault = engine
            .register_fault(FaultCode {
                id: 0,
                code: "F-SEIZE".to_string(),
                name: "Seized bearing".to_string(),
                description: String::new(),
            })
            .unwrap();

        let issue = engine
            .report_issue(asset.id, "main bearing seized during shift", Some(fault.id), Some(3))
            .unwrap();
        let order = engine.escalate_issue(issue.id, false).unwrap().unwrap();

        assert_eq!(order.kind, MaintenanceKind::Corrective);
        assert_eq!(order.priority, OrderPriority::High);
        assert_eq!(order.fault, Some(fault.id));

        // A repeat escalation hands back the linked order, no duplicate
        let again = engine.escalate_issue(issue.id, true).unwrap().unwrap();
        assert_eq!(again.id, order.id);
        assert_eq!(engine.repository().list_orders(Some(asset.id), None).unwrap().len(), 1);
    }

    #[test]
    fn test_non_critical_issue_stays_put_unless_forced() {
        let engine = engine();
        let asset = press(&engine);
        let issue = engine.report_issue(asset.id, "odd noise", None, None).unwrap();

        assert!(engine.escalate_issue(issue.id, false).unwrap().is_none());
        assert!(engine.escalate_issue(issue.id, true).unwrap().is_some());
    }

    #[test]
    fn test_due_plan_generates_order_once() {
        let engine = engine();
        let asset = press(&engine);
        let task = engine.register_task("Grease rails", "").unwrap();
        let tpl = preventive_template(&engine, &[task.id]);
        engine
            .register_plan(asset.id, "PM-30d", tpl.id, PlanTrigger::EveryDays(30))
            .unwrap();

        let today = Utc::now().date_naive();
        let first = engine.run_due_plans(today).unwrap();
        assert_eq!(first.len(), 1);
        let order = engine.repository().get_order(first[0]).unwrap();
        assert_eq!(order.kind, MaintenanceKind::Preventive);
        assert_eq!(order.checklist.len(), 1);

        // The plan advanced, so the same day produces nothing
        assert!(engine.run_due_plans(today).unwrap().is_empty());
    }

    #[test]
    fn test_sweep_combines_plans_and_alert_recompute() {
        let engine = engine();
        let asset = press(&engine);
        engine.record_reading(reading(asset.id, 2024, 7, 85_000.0, 10_000.0)).unwrap();

        let report = engine.sweep(Utc::now().date_naive()).unwrap();
        assert!(report.orders_created.is_empty());
        // The alert already exists, so the recompute updates it in place
        assert_eq!(report.alerts_updated, 1);
    }
}
