//! Repository Implementation

use crate::StorageError;
use alerting::{MaintenanceAlert, MeterReading};
use assets::{Asset, AssetFamily, AssetId, FamilyId, FaultCode, FaultId, Taxonomy};
use checklists::{ChecklistTemplate, MaintenanceTask, TaskId, TemplateId};
use std::sync::Mutex;
use tracing::{debug, info};
use work_orders::{IssueReport, OrderHistoryEntry, OrderStatus, WorkOrder};

/// Repository for all maintenance records (in-memory implementation)
pub struct Repository {
    assets: Mutex<Vec<Asset>>,
    families: Mutex<Vec<AssetFamily>>,
    faults: Mutex<Vec<FaultCode>>,
    taxonomy: Mutex<Taxonomy>,
    tasks: Mutex<Vec<MaintenanceTask>>,
    templates: Mutex<Vec<ChecklistTemplate>>,
    orders: Mutex<Vec<WorkOrder>>,
    history: Mutex<Vec<OrderHistoryEntry>>,
    issues: Mutex<Vec<IssueReport>>,
    readings: Mutex<Vec<MeterReading>>,
    alerts: Mutex<Vec<MaintenanceAlert>>,
    /// Next id, shared across record types
    next_id: Mutex<i64>,
}

impl Repository {
    /// Create an empty in-memory repository
    pub fn new() -> Self {
        info!("Creating in-memory maintenance repository");
        Self {
            assets: Mutex::new(Vec::new()),
            families: Mutex::new(Vec::new()),
            faults: Mutex::new(Vec::new()),
            taxonomy: Mutex::new(Taxonomy::new()),
            tasks: Mutex::new(Vec::new()),
            templates: Mutex::new(Vec::new()),
            orders: Mutex::new(Vec::new()),
            history: Mutex::new(Vec::new()),
            issues: Mutex::new(Vec::new()),
            readings: Mutex::new(Vec::new()),
            alerts: Mutex::new(Vec::new()),
            next_id: Mutex::new(1),
        }
    }

    fn alloc_id(&self) -> Result<i64, StorageError> {
        let mut id = lock(&self.next_id)?;
        let out = *id;
        *id += 1;
        Ok(out)
    }

    // ---------------- Assets, families, faults ----------------

    /// Insert an asset; the registry code must be unique
    pub fn insert_asset(&self, mut asset: Asset) -> Result<Asset, StorageError> {
        let mut assets = lock(&self.assets)?;
        if assets.iter().any(|a| a.code == asset.code) {
            return Err(StorageError::Conflict(format!("asset code {}", asset.code)));
        }
        asset.id = self.alloc_id()?;
        debug!("Inserted asset {} ({})", asset.id, asset.code);
        assets.push(asset.clone());
        Ok(asset)
    }

    pub fn get_asset(&self, id: AssetId) -> Result<Asset, StorageError> {
        lock(&self.assets)?
            .iter()
            .find(|a| a.id == id)
            .cloned()
            .ok_or(StorageError::NotFound)
    }

    pub fn find_asset_by_code(&self, code: &str) -> Result<Option<Asset>, StorageError> {
        Ok(lock(&self.assets)?.iter().find(|a| a.code == code).cloned())
    }

    pub fn list_assets(&self) -> Result<Vec<Asset>, StorageError> {
        Ok(lock(&self.assets)?.clone())
    }

    /// Attach an asset to a family
    pub fn set_asset_family(&self, id: AssetId, family: Option<FamilyId>) -> Result<(), StorageError> {
        let mut assets = lock(&self.assets)?;
        let asset = assets.iter_mut().find(|a| a.id == id).ok_or(StorageError::NotFound)?;
        asset.family = family;
        Ok(())
    }

    /// Insert a family; the name must be unique
    pub fn insert_family(&self, mut family: AssetFamily) -> Result<AssetFamily, StorageError> {
        let mut families = lock(&self.families)?;
        if families.iter().any(|f| f.name == family.name) {
            return Err(StorageError::Conflict(format!("family name {}", family.name)));
        }
        family.id = self.alloc_id()?;
        families.push(family.clone());
        Ok(family)
    }

    /// Insert a fault-catalog entry; the code must be unique
    pub fn insert_fault(&self, mut fault: FaultCode) -> Result<FaultCode, StorageError> {
        let mut faults = lock(&self.faults)?;
        if faults.iter().any(|f| f.code == fault.code) {
            return Err(StorageError::Conflict(format!("fault code {}", fault.code)));
        }
        fault.id = self.alloc_id()?;
        faults.push(fault.clone());
        Ok(fault)
    }

    pub fn get_fault(&self, id: FaultId) -> Result<FaultCode, StorageError> {
        lock(&self.faults)?
            .iter()
            .find(|f| f.id == id)
            .cloned()
            .ok_or(StorageError::NotFound)
    }

    /// Run a closure against the taxonomy forest under its lock
    pub fn with_taxonomy<T>(&self, f: impl FnOnce(&mut Taxonomy) -> T) -> Result<T, StorageError> {
        let mut taxonomy = lock(&self.taxonomy)?;
        Ok(f(&mut taxonomy))
    }

    // ---------------- Tasks and templates ----------------

    pub fn insert_task(&self, mut task: MaintenanceTask) -> Result<MaintenanceTask, StorageError> {
        task.id = self.alloc_id()?;
        lock(&self.tasks)?.push(task.clone());
        Ok(task)
    }

    pub fn get_task(&self, id: TaskId) -> Result<MaintenanceTask, StorageError> {
        lock(&self.tasks)?
            .iter()
            .find(|t| t.id == id)
            .cloned()
            .ok_or(StorageError::NotFound)
    }

    pub fn insert_template(&self, mut template: ChecklistTemplate) -> Result<ChecklistTemplate, StorageError> {
        template.id = self.alloc_id()?;
        debug!("Inserted template {} ({})", template.id, template.label());
        lock(&self.templates)?.push(template.clone());
        Ok(template)
    }

    pub fn get_template(&self, id: TemplateId) -> Result<ChecklistTemplate, StorageError> {
        lock(&self.templates)?
            .iter()
            .find(|t| t.id == id)
            .cloned()
            .ok_or(StorageError::NotFound)
    }

    pub fn list_templates(&self) -> Result<Vec<ChecklistTemplate>, StorageError> {
        Ok(lock(&self.templates)?.clone())
    }

    /// Retire a template so it no longer resolves
    pub fn deactivate_template(&self, id: TemplateId) -> Result<(), StorageError> {
        let mut templates = lock(&self.templates)?;
        let template = templates.iter_mut().find(|t| t.id == id).ok_or(StorageError::NotFound)?;
        template.active = false;
        Ok(())
    }

    // ---------------- Work orders ----------------

    pub fn insert_order(&self, mut order: WorkOrder) -> Result<WorkOrder, StorageError> {
        order.id = self.alloc_id()?;
        debug!("Inserted work order {} for asset {}", order.id, order.asset);
        lock(&self.orders)?.push(order.clone());
        Ok(order)
    }

    pub fn get_order(&self, id: i64) -> Result<WorkOrder, StorageError> {
        lock(&self.orders)?
            .iter()
            .find(|o| o.id == id)
            .cloned()
            .ok_or(StorageError::NotFound)
    }

    /// Replace a stored order with its mutated copy
    pub fn update_order(&self, order: &WorkOrder) -> Result<(), StorageError> {
        let mut orders = lock(&self.orders)?;
        let slot = orders.iter_mut().find(|o| o.id == order.id).ok_or(StorageError::NotFound)?;
        *slot = order.clone();
        Ok(())
    }

    /// Orders filtered by asset and/or status, newest first
    pub fn list_orders(
        &self,
        asset: Option<AssetId>,
        status: Option<OrderStatus>,
    ) -> Result<Vec<WorkOrder>, StorageError> {
        let orders = lock(&self.orders)?;
        let mut out: Vec<WorkOrder> = orders
            .iter()
            .filter(|o| asset.map_or(true, |a| o.asset == a))
            .filter(|o| status.map_or(true, |s| o.status == s))
            .cloned()
            .collect();
        out.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(out)
    }

    pub fn append_history(&self, mut entry: OrderHistoryEntry) -> Result<OrderHistoryEntry, StorageError> {
        entry.id = self.alloc_id()?;
        lock(&self.history)?.push(entry.clone());
        Ok(entry)
    }

    /// History of one order, newest first
    pub fn history_for(&self, order: i64) -> Result<Vec<OrderHistoryEntry>, StorageError> {
        let history = lock(&self.history)?;
        let mut out: Vec<OrderHistoryEntry> =
            history.iter().filter(|h| h.order == order).cloned().collect();
        out.sort_by(|a, b| b.at.cmp(&a.at).then(b.id.cmp(&a.id)));
        Ok(out)
    }

    // ---------------- Issue reports ----------------

    pub fn insert_issue(&self, mut issue: IssueReport) -> Result<IssueReport, StorageError> {
        issue.id = self.alloc_id()?;
        lock(&self.issues)?.push(issue.clone());
        Ok(issue)
    }

    pub fn get_issue(&self, id: i64) -> Result<IssueReport, StorageError> {
        lock(&self.issues)?
            .iter()
            .find(|i| i.id == id)
            .cloned()
            .ok_or(StorageError::NotFound)
    }

    pub fn update_issue(&self, issue: &IssueReport) -> Result<(), StorageError> {
        let mut issues = lock(&self.issues)?;
        let slot = issues.iter_mut().find(|i| i.id == issue.id).ok_or(StorageError::NotFound)?;
        *slot = issue.clone();
        Ok(())
    }

    // ---------------- Meter readings ----------------

    /// Insert a reading; one per (asset, year, week)
    pub fn insert_reading(&self, mut reading: MeterReading) -> Result<MeterReading, StorageError> {
        let mut readings = lock(&self.readings)?;
        if readings
            .iter()
            .any(|r| r.asset == reading.asset && r.year == reading.year && r.week == reading.week)
        {
            return Err(StorageError::Conflict(format!(
                "reading for asset {} at {}",
                reading.asset,
                reading.week_label()
            )));
        }
        reading.id = self.alloc_id()?;
        readings.push(reading.clone());
        Ok(reading)
    }

    pub fn get_reading(&self, id: i64) -> Result<MeterReading, StorageError> {
        lock(&self.readings)?
            .iter()
            .find(|r| r.id == id)
            .cloned()
            .ok_or(StorageError::NotFound)
    }

    pub fn update_reading(&self, reading: &MeterReading) -> Result<(), StorageError> {
        let mut readings = lock(&self.readings)?;
        let slot = readings.iter_mut().find(|r| r.id == reading.id).ok_or(StorageError::NotFound)?;
        *slot = reading.clone();
        Ok(())
    }

    /// Readings of an asset ordered by (year, week)
    pub fn readings_for_asset(&self, asset: AssetId) -> Result<Vec<MeterReading>, StorageError> {
        let readings = lock(&self.readings)?;
        let mut out: Vec<MeterReading> = readings.iter().filter(|r| r.asset == asset).cloned().collect();
        out.sort_by_key(|r| r.key());
        Ok(out)
    }

    /// Latest reading of an asset by (year, week)
    pub fn latest_reading_for(&self, asset: AssetId) -> Result<Option<MeterReading>, StorageError> {
        let readings = lock(&self.readings)?;
        Ok(readings
            .iter()
            .filter(|r| r.asset == asset)
            .max_by_key(|r| r.key())
            .cloned())
    }

    /// Reading of an asset for one specific week
    pub fn reading_for_week(
        &self,
        asset: AssetId,
        year: i32,
        week: u32,
    ) -> Result<Option<MeterReading>, StorageError> {
        let readings = lock(&self.readings)?;
        Ok(readings
            .iter()
            .find(|r| r.asset == asset && r.year == year && r.week == week)
            .cloned())
    }

    /// Whether the asset has a reading in a later (year, week) than `key`
    pub fn has_later_reading(&self, asset: AssetId, key: i64) -> Result<bool, StorageError> {
        let readings = lock(&self.readings)?;
        Ok(readings.iter().any(|r| r.asset == asset && r.key() > key))
    }

    /// Distinct ids of assets that have readings
    pub fn assets_with_readings(&self) -> Result<Vec<AssetId>, StorageError> {
        let readings = lock(&self.readings)?;
        let mut ids: Vec<AssetId> = readings.iter().map(|r| r.asset).collect();
        ids.sort_unstable();
        ids.dedup();
        Ok(ids)
    }

    pub fn reading_count(&self) -> usize {
        lock(&self.readings).map(|r| r.len()).unwrap_or(0)
    }

    // ---------------- Alerts ----------------

    pub fn insert_alert(&self, mut alert: MaintenanceAlert) -> Result<MaintenanceAlert, StorageError> {
        let mut alerts = lock(&self.alerts)?;
        if alerts
            .iter()
            .any(|a| a.asset == alert.asset && a.year == alert.year && a.week == alert.week)
        {
            return Err(StorageError::Conflict(format!(
                "alert for asset {} at {}-W{:02}",
                alert.asset, alert.year, alert.week
            )));
        }
        alert.id = self.alloc_id()?;
        debug!("Inserted alert {} for asset {}", alert.id, alert.asset);
        alerts.push(alert.clone());
        Ok(alert)
    }

    pub fn get_alert(&self, id: i64) -> Result<MaintenanceAlert, StorageError> {
        lock(&self.alerts)?
            .iter()
            .find(|a| a.id == id)
            .cloned()
            .ok_or(StorageError::NotFound)
    }

    pub fn update_alert(&self, alert: &MaintenanceAlert) -> Result<(), StorageError> {
        let mut alerts = lock(&self.alerts)?;
        let slot = alerts.iter_mut().find(|a| a.id == alert.id).ok_or(StorageError::NotFound)?;
        *slot = alert.clone();
        Ok(())
    }

    /// Most recent open alert of an asset by (year, week)
    pub fn open_alert_for(&self, asset: AssetId) -> Result<Option<MaintenanceAlert>, StorageError> {
        let alerts = lock(&self.alerts)?;
        Ok(alerts
            .iter()
            .filter(|a| a.asset == asset && a.is_open())
            .max_by_key(|a| a.key())
            .cloned())
    }

    /// Alert of an asset for one specific week
    pub fn alert_for_week(
        &self,
        asset: AssetId,
        year: i32,
        week: u32,
    ) -> Result<Option<MaintenanceAlert>, StorageError> {
        let alerts = lock(&self.alerts)?;
        Ok(alerts
            .iter()
            .find(|a| a.asset == asset && a.year == year && a.week == week)
            .cloned())
    }

    /// Alerts, optionally only the open ones, newest week first
    pub fn list_alerts(&self, open_only: bool) -> Result<Vec<MaintenanceAlert>, StorageError> {
        let alerts = lock(&self.alerts)?;
        let mut out: Vec<MaintenanceAlert> = alerts
            .iter()
            .filter(|a| !open_only || a.is_open())
            .cloned()
            .collect();
        out.sort_by(|a, b| b.key().cmp(&a.key()).then(b.id.cmp(&a.id)));
        Ok(out)
    }

    pub fn alert_count(&self) -> usize {
        lock(&self.alerts).map(|a| a.len()).unwrap_or(0)
    }
}

impl Default for Repository {
    fn default() -> Self {
        Self::new()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> Result<std::sync::MutexGuard<'_, T>, StorageError> {
    mutex.lock().map_err(|e| StorageError::Internal(format!("Lock error: {e}")))
}
