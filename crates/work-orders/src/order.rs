//! Work-order record and state machine

use crate::checklist::ChecklistEntry;
use crate::TransitionError;
use assets::{AssetId, FaultId};
use checklists::{ChecklistTemplate, MaintenanceKind, TemplateId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, info};

/// Work-order identifier
pub type OrderId = i64;
/// User reference (owned by the external accounts system)
pub type UserId = i64;

/// Lifecycle status of a work order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum OrderStatus {
    /// Waiting to be taken ("PEN")
    #[default]
    Pending,
    /// Being executed ("PRO")
    InProgress,
    /// Executed, waiting for review ("REV")
    InReview,
    /// Formally closed ("CER")
    Closed,
}

impl OrderStatus {
    /// Three-letter wire code
    pub fn code(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "PEN",
            OrderStatus::InProgress => "PRO",
            OrderStatus::InReview => "REV",
            OrderStatus::Closed => "CER",
        }
    }

    /// The only status reachable from this one, if any
    pub fn successor(&self) -> Option<OrderStatus> {
        match self {
            OrderStatus::Pending => Some(OrderStatus::InProgress),
            OrderStatus::InProgress => Some(OrderStatus::InReview),
            OrderStatus::InReview => Some(OrderStatus::Closed),
            OrderStatus::Closed => None,
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Work-order priority
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub enum OrderPriority {
    Low,
    #[default]
    Medium,
    High,
}

/// A status change, as fed to the history log
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusChange {
    pub from: OrderStatus,
    pub to: OrderStatus,
    pub at: DateTime<Utc>,
    pub by: Option<UserId>,
}

/// A maintenance work order (preventive or corrective)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkOrder {
    pub id: OrderId,
    pub asset: AssetId,
    pub status: OrderStatus,
    pub kind: MaintenanceKind,
    pub priority: OrderPriority,
    pub title: String,

    /// Fault being corrected (corrective orders)
    pub fault: Option<FaultId>,
    /// Template the checklist was built from
    pub applied_template: Option<TemplateId>,

    // Lifecycle stamps
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    pub closed_at: Option<DateTime<Utc>>,

    /// ISO year/week the work was executed in (for meter baselining)
    pub execution_year: Option<i32>,
    pub execution_week: Option<u32>,
    /// Meter value captured at execution
    pub execution_reading: Option<f64>,

    pub created_by: Option<UserId>,
    pub assigned_to: Option<UserId>,
    pub completed_by: Option<UserId>,

    pub checklist: Vec<ChecklistEntry>,
}

impl WorkOrder {
    pub fn new(id: OrderId, asset: AssetId, kind: MaintenanceKind, title: impl Into<String>) -> Self {
        Self {
            id,
            asset,
            status: OrderStatus::Pending,
            kind,
            priority: OrderPriority::default(),
            title: title.into(),
            fault: None,
            applied_template: None,
            created_at: Utc::now(),
            started_at: None,
            finished_at: None,
            closed_at: None,
            execution_year: None,
            execution_week: None,
            execution_reading: None,
            created_by: None,
            assigned_to: None,
            completed_by: None,
            checklist: Vec::new(),
        }
    }

    /// Whether `to` is reachable from the current status
    pub fn can_transition_to(&self, to: OrderStatus) -> bool {
        self.status.successor() == Some(to)
    }

    /// Checklist completion, rounded percent (0 when empty)
    pub fn progress_percent(&self) -> u8 {
        let total = self.checklist.len();
        if total == 0 {
            return 0;
        }
        let done = self.checklist.iter().filter(|e| e.completed).count();
        ((100.0 * done as f64 / total as f64).round()) as u8
    }

    /// Single entry point for status changes.
    ///
    /// Validates the transition, enforces the per-transition guards and
    /// stamps the minimal timestamps. A transition to the current status is
    /// a no-op and returns `None`.
    pub fn transition_to(
        &mut self,
        to: OrderStatus,
        user: Option<UserId>,
    ) -> Result<Option<StatusChange>, TransitionError> {
        if to == self.status {
            return Ok(None);
        }
        if !self.can_transition_to(to) {
            return Err(TransitionError::InvalidTransition { from: self.status, to });
        }

        let now = Utc::now();

        if to == OrderStatus::InProgress {
            if self.assigned_to.is_none() {
                return Err(TransitionError::Unassigned);
            }
            if self.started_at.is_none() {
                self.started_at = Some(now);
            }
        }

        if to == OrderStatus::InReview {
            let progress = self.progress_percent();
            if progress < 100 {
                return Err(TransitionError::ChecklistIncomplete { progress });
            }
            if self.finished_at.is_none() {
                self.finished_at = Some(now);
            }
        }

        if to == OrderStatus::Closed {
            return Ok(Some(self.close(user, now)));
        }

        let change = StatusChange { from: self.status, to, at: now, by: user };
        debug!("Order {} {} -> {}", self.id, self.status, to);
        self.status = to;
        Ok(Some(change))
    }

    /// Formal closure: backfills execution stamps, records the closer
    fn close(&mut self, user: Option<UserId>, now: DateTime<Utc>) -> StatusChange {
        if self.started_at.is_none() {
            self.started_at = Some(now);
        }
        if self.finished_at.is_none() {
            self.finished_at = Some(now);
        }
        self.closed_at = Some(now);
        if user.is_some() {
            self.completed_by = user;
        }

        let change = StatusChange { from: self.status, to: OrderStatus::Closed, at: now, by: user };
        info!("Order {} closed ({})", self.id, self.kind);
        self.status = OrderStatus::Closed;
        change
    }

    /// Rebuild the checklist from a template and record its id
    pub fn apply_template(&mut self, template: &ChecklistTemplate) {
        self.checklist = template
            .sorted_items()
            .into_iter()
            .map(ChecklistEntry::from_template_item)
            .collect();
        self.applied_template = Some(template.id);
        debug!(
            "Order {}: applied template {} ({} entries)",
            self.id,
            template.id,
            self.checklist.len()
        );
    }

    /// Mark a checklist task completed; true when the entry existed
    pub fn complete_task(&mut self, task: checklists::TaskId, notes: Option<String>) -> bool {
        match self.checklist.iter_mut().find(|e| e.task == task) {
            Some(entry) => {
                entry.completed = true;
                if let Some(notes) = notes {
                    entry.notes = notes;
                }
                true
            }
            None => false,
        }
    }
}
