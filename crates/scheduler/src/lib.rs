//! Preventive Scheduler
//!
//! Preventive maintenance plans per asset, triggered by elapsed days or by
//! accumulated cycles, and the due-plan computation that feeds order
//! creation.

pub mod plan;
pub mod scheduler;

pub use plan::{PlanId, PlanTrigger, PreventivePlan};
pub use scheduler::PlanScheduler;
