//! Template and task records

use assets::{AssetId, FamilyId, FaultId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Maintenance task identifier
pub type TaskId = i64;
/// Checklist template identifier
pub type TemplateId = i64;

/// Master maintenance task
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaintenanceTask {
    pub id: TaskId,
    pub name: String,
    /// Detailed work instructions
    pub description: String,
}

/// Kind of maintenance work
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MaintenanceKind {
    #[default]
    Preventive,
    Corrective,
}

impl MaintenanceKind {
    /// Three-letter wire code
    pub fn code(&self) -> &'static str {
        match self {
            MaintenanceKind::Preventive => "PRE",
            MaintenanceKind::Corrective => "COR",
        }
    }
}

impl fmt::Display for MaintenanceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Where a template applies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TemplateScope {
    /// One specific asset
    Asset(AssetId),
    /// Every asset of a family
    Family(FamilyId),
    /// Any asset
    Global,
}

impl fmt::Display for TemplateScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TemplateScope::Asset(id) => write!(f, "ACT:{id}"),
            TemplateScope::Family(id) => write!(f, "FAM:{id}"),
            TemplateScope::Global => write!(f, "GLOBAL"),
        }
    }
}

/// One line of a template
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateItem {
    pub task: TaskId,
    /// Must be completed before review
    pub mandatory: bool,
    /// Evidence (photo/file) required on completion
    pub requires_evidence: bool,
    /// Position within the checklist
    pub position: u16,
    pub suggested_notes: String,
}

impl TemplateItem {
    pub fn new(task: TaskId, position: u16) -> Self {
        Self {
            task,
            mandatory: false,
            requires_evidence: false,
            position,
            suggested_notes: String::new(),
        }
    }

    pub fn mandatory(mut self) -> Self {
        self.mandatory = true;
        self
    }

    pub fn with_evidence(mut self) -> Self {
        self.requires_evidence = true;
        self
    }
}

/// Reusable checklist definition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChecklistTemplate {
    pub id: TemplateId,
    pub name: String,
    pub kind: MaintenanceKind,
    pub scope: TemplateScope,
    /// Narrows corrective templates to one fault code
    pub fault: Option<FaultId>,
    pub version: u32,
    /// Retired templates stay for traceability but never resolve
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub items: Vec<TemplateItem>,
}

impl ChecklistTemplate {
    pub fn new(id: TemplateId, name: impl Into<String>, kind: MaintenanceKind, scope: TemplateScope) -> Self {
        Self {
            id,
            name: name.into(),
            kind,
            scope,
            fault: None,
            version: 1,
            active: true,
            created_at: Utc::now(),
            items: Vec::new(),
        }
    }

    /// Items in checklist order
    pub fn sorted_items(&self) -> Vec<&TemplateItem> {
        let mut items: Vec<_> = self.items.iter().collect();
        items.sort_by_key(|i| (i.position, i.task));
        items
    }

    /// Display label: name, kind, scope, optional fault, version
    pub fn label(&self) -> String {
        match self.fault {
            Some(fault) => format!("{} ({} · {} · F:{}) v{}", self.name, self.kind, self.scope, fault, self.version),
            None => format!("{} ({} · {}) v{}", self.name, self.kind, self.scope, self.version),
        }
    }
}
