//! Best-match template resolution
//!
//! Scope priority is Asset > Family > Global; within a scope the highest
//! version wins. A requested fault code keeps templates carrying that fault
//! or none at all.

use crate::template::{ChecklistTemplate, MaintenanceKind, TemplateScope};
use assets::{Asset, FaultId};
use tracing::debug;

/// Pick the template to apply to a new order, if any
pub fn best_match<'a>(
    templates: &'a [ChecklistTemplate],
    asset: &Asset,
    kind: MaintenanceKind,
    fault: Option<FaultId>,
) -> Option<&'a ChecklistTemplate> {
    let candidates: Vec<&ChecklistTemplate> = templates
        .iter()
        .filter(|t| t.active && t.kind == kind)
        .filter(|t| match fault {
            Some(f) => t.fault == Some(f) || t.fault.is_none(),
            None => true,
        })
        .collect();

    let for_asset = pick(&candidates, TemplateScope::Asset(asset.id));
    if let Some(tpl) = for_asset {
        debug!("Template {} matched by asset scope", tpl.id);
        return Some(tpl);
    }

    if let Some(family) = asset.family {
        if let Some(tpl) = pick(&candidates, TemplateScope::Family(family)) {
            debug!("Template {} matched by family scope", tpl.id);
            return Some(tpl);
        }
    }

    let global = pick(&candidates, TemplateScope::Global);
    if let Some(tpl) = global {
        debug!("Template {} matched by global scope", tpl.id);
    }
    global
}

/// Highest version within one scope; newest id breaks version ties
fn pick<'a>(candidates: &[&'a ChecklistTemplate], scope: TemplateScope) -> Option<&'a ChecklistTemplate> {
    candidates
        .iter()
        .filter(|t| t.scope == scope)
        .max_by_key(|t| (t.version, t.id))
        .copied()
}

#[cfg(test)]
mod tests {
    use super::*;
    use assets::Asset;

    fn asset_with_family() -> Asset {
        let mut asset = Asset::new(1, "PM-001", "4711", "Press 12");
        asset.family = Some(5);
        asset
    }

    fn template(id: i64, kind: MaintenanceKind, scope: TemplateScope) -> ChecklistTemplate {
        ChecklistTemplate::new(id, format!("tpl-{id}"), kind, scope)
    }

    #[test]
    fn test_asset_scope_beats_family_and_global() {
        let templates = vec![
            template(1, MaintenanceKind::Preventive, TemplateScope::Global),
            template(2, MaintenanceKind::Preventive, TemplateScope::Family(5)),
            template(3, MaintenanceKind::Preventive, TemplateScope::Asset(1)),
        ];
        let hit = best_match(&templates, &asset_with_family(), MaintenanceKind::Preventive, None);
        assert_eq!(hit.unwrap().id, 3);
    }

    #[test]
    fn test_family_scope_beats_global() {
        let templates = vec![
            template(1, MaintenanceKind::Preventive, TemplateScope::Global),
            template(2, MaintenanceKind::Preventive, TemplateScope::Family(5)),
        ];
        let hit = best_match(&templates, &asset_with_family(), MaintenanceKind::Preventive, None);
        assert_eq!(hit.unwrap().id, 2);
    }

    #[test]
    fn test_no_family_falls_through_to_global() {
        let asset = Asset::new(1, "PM-001", "4711", "Press 12");
        let templates = vec![
            template(1, MaintenanceKind::Preventive, TemplateScope::Global),
            template(2, MaintenanceKind::Preventive, TemplateScope::Family(5)),
        ];
        let hit = best_match(&templates, &asset, MaintenanceKind::Preventive, None);
        assert_eq!(hit.unwrap().id, 1);
    }

    #[test]
    fn test_highest_version_wins_within_scope() {
        let mut v1 = template(1, MaintenanceKind::Preventive, TemplateScope::Asset(1));
        let mut v3 = template(2, MaintenanceKind::Preventive, TemplateScope::Asset(1));
        v1.version = 1;
        v3.version = 3;
        let templates = vec![v1, v3];
        let hit = best_match(&templates, &asset_with_family(), MaintenanceKind::Preventive, None);
        assert_eq!(hit.unwrap().id, 2);
    }

    #[test]
    fn test_fault_filter_keeps_matching_or_faultless() {
        let mut with_fault = template(1, MaintenanceKind::Corrective, TemplateScope::Global);
        with_fault.fault = Some(7);
        let mut other_fault = template(2, MaintenanceKind::Corrective, TemplateScope::Global);
        other_fault.fault = Some(8);
        other_fault.version = 9;
        let faultless = template(3, MaintenanceKind::Corrective, TemplateScope::Global);

        let templates = vec![with_fault, other_fault, faultless];
        let hit = best_match(&templates, &asset_with_family(), MaintenanceKind::Corrective, Some(7));
        // Template for fault 8 is excluded even with the higher version
        assert_eq!(hit.unwrap().id, 3);
    }

    #[test]
    fn test_inactive_and_wrong_kind_excluded() {
        let mut retired = template(1, MaintenanceKind::Preventive, TemplateScope::Asset(1));
        retired.active = false;
        let corrective = template(2, MaintenanceKind::Corrective, TemplateScope::Asset(1));
        let templates = vec![retired, corrective];
        assert!(best_match(&templates, &asset_with_family(), MaintenanceKind::Preventive, None).is_none());
    }
}
