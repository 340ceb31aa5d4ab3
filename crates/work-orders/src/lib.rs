//! Work Orders
//!
//! The work-order lifecycle: a forward-only state machine
//! (PEN -> PRO -> REV -> CER) with per-transition guards, checklist entries
//! sourced from templates, status history, and issue escalation.

pub mod checklist;
pub mod escalation;
pub mod history;
pub mod order;

pub use checklist::ChecklistEntry;
pub use escalation::{issue_title, should_escalate, IssueId, IssueReport};
pub use history::OrderHistoryEntry;
pub use order::{OrderId, OrderPriority, OrderStatus, StatusChange, UserId, WorkOrder};

use thiserror::Error;

/// Transition guard failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("Invalid transition: {from} -> {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },

    #[error("Order must be assigned before it can start")]
    Unassigned,

    #[error("Checklist incomplete ({progress}%), cannot send to review")]
    ChecklistIncomplete { progress: u8 },
}
