//! Issue reports and escalation to corrective orders
//!
//! Operators file free-form issue reports against an asset. A report whose
//! fault code is on the configured critical list (or a forced escalation)
//! becomes a high-priority corrective order; a report already linked to an
//! order never escalates twice.

use crate::order::{OrderId, UserId};
use assets::{AssetId, FaultId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Issue report identifier
pub type IssueId = i64;

/// Free-form problem report filed against an asset
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssueReport {
    pub id: IssueId,
    pub asset: AssetId,
    pub fault: Option<FaultId>,
    pub description: String,
    pub reported_by: Option<UserId>,
    pub reported_at: DateTime<Utc>,
    /// Corrective order this report escalated into, if any
    pub work_order: Option<OrderId>,
}

impl IssueReport {
    pub fn new(id: IssueId, asset: AssetId, description: impl Into<String>) -> Self {
        Self {
            id,
            asset,
            fault: None,
            description: description.into(),
            reported_by: None,
            reported_at: Utc::now(),
            work_order: None,
        }
    }
}

/// Escalation decision for an issue report.
///
/// `fault_code` is the report's fault code looked up in the catalog.
pub fn should_escalate(
    issue: &IssueReport,
    fault_code: Option<&str>,
    critical_faults: &[String],
    force: bool,
) -> bool {
    if issue.work_order.is_some() {
        return false;
    }
    if force {
        return true;
    }
    match fault_code {
        Some(code) => critical_faults.iter().any(|c| c == code),
        None => false,
    }
}

/// Order title derived from the report description (capped at 160 chars)
pub fn issue_title(description: &str) -> String {
    let trimmed = description.trim();
    match trimmed.char_indices().nth(160) {
        Some((idx, _)) => trimmed[..idx].to_string(),
        None => trimmed.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn critical() -> Vec<String> {
        vec!["F-SEIZE".to_string(), "F-LEAK".to_string()]
    }

    #[test]
    fn test_critical_fault_escalates() {
        let mut issue = IssueReport::new(1, 1, "oil leak at main pump");
        issue.fault = Some(7);
        assert!(should_escalate(&issue, Some("F-LEAK"), &critical(), false));
        assert!(!should_escalate(&issue, Some("F-NOISE"), &critical(), false));
    }

    #[test]
    fn test_force_overrides_rules_but_not_existing_link() {
        let mut issue = IssueReport::new(1, 1, "weird vibration");
        assert!(should_escalate(&issue, None, &critical(), true));

        issue.work_order = Some(99);
        assert!(!should_escalate(&issue, Some("F-LEAK"), &critical(), true));
    }

    #[test]
    fn test_issue_title_is_capped() {
        let long = "x".repeat(300);
        assert_eq!(issue_title(&long).len(), 160);
        assert_eq!(issue_title("  short  "), "short");
    }
}
