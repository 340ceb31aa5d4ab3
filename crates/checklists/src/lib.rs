//! Checklist Templates
//!
//! Master task catalog and reusable checklist templates scoped to an asset,
//! an asset family, or globally, with best-match resolution.

pub mod resolve;
pub mod template;

pub use resolve::best_match;
pub use template::{
    ChecklistTemplate, MaintenanceKind, MaintenanceTask, TaskId, TemplateId, TemplateItem,
    TemplateScope,
};
