//! Checklist entries attached to an order

use checklists::{TaskId, TemplateItem};
use serde::{Deserialize, Serialize};

/// One task on an order's checklist
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChecklistEntry {
    pub task: TaskId,
    pub completed: bool,
    pub notes: String,
    /// Copied from the template item
    pub mandatory: bool,
    pub requires_evidence: bool,
    pub position: u16,
}

impl ChecklistEntry {
    /// Fresh entry for a task added by hand
    pub fn new(task: TaskId, position: u16) -> Self {
        Self {
            task,
            completed: false,
            notes: String::new(),
            mandatory: false,
            requires_evidence: false,
            position,
        }
    }

    /// Entry carrying a template item's metadata
    pub fn from_template_item(item: &TemplateItem) -> Self {
        Self {
            task: item.task,
            completed: false,
            notes: String::new(),
            mandatory: item.mandatory,
            requires_evidence: item.requires_evidence,
            position: item.position,
        }
    }
}
