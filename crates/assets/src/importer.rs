//! Row-based taxonomy importer
//!
//! Consumes already-parsed spreadsheet rows and upserts the hierarchy
//! system -> subsystem -> item -> part for one asset. A blank level name
//! stops the descent for that row; re-importing the same rows is a no-op.

use crate::asset::AssetId;
use crate::taxonomy::Taxonomy;
use serde::{Deserialize, Serialize};
use tracing::info;

/// One hierarchy row as it comes out of the upload parser
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaxonomyRow {
    pub system: Option<String>,
    pub system_code: Option<String>,
    pub system_tag: Option<String>,
    pub subsystem: Option<String>,
    pub subsystem_code: Option<String>,
    pub subsystem_tag: Option<String>,
    pub item: Option<String>,
    pub item_code: Option<String>,
    pub item_tag: Option<String>,
    pub part: Option<String>,
    pub part_code: Option<String>,
    pub part_tag: Option<String>,
}

/// Counts of nodes created per level during an import
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub systems_created: usize,
    pub subsystems_created: usize,
    pub items_created: usize,
    pub parts_created: usize,
    pub rows_seen: usize,
}

impl ImportSummary {
    pub fn total_created(&self) -> usize {
        self.systems_created + self.subsystems_created + self.items_created + self.parts_created
    }
}

/// Imports the taxonomy hierarchy for a single asset
pub struct TaxonomyImporter {
    asset: AssetId,
}

impl TaxonomyImporter {
    pub fn new(asset: AssetId) -> Self {
        Self { asset }
    }

    /// Upsert every row top-down into `taxonomy`
    pub fn import<I>(&self, taxonomy: &mut Taxonomy, rows: I) -> ImportSummary
    where
        I: IntoIterator<Item = TaxonomyRow>,
    {
        let mut summary = ImportSummary::default();

        for row in rows {
            summary.rows_seen += 1;

            let Some(system_name) = present(&row.system) else {
                continue;
            };
            let system = taxonomy.upsert_system(
                self.asset,
                system_name,
                row.system_code.as_deref(),
                row.system_tag.as_deref(),
            );
            if system.created {
                summary.systems_created += 1;
            }

            let Some(subsystem_name) = present(&row.subsystem) else {
                continue;
            };
            let subsystem = taxonomy.upsert_subsystem(
                system.id,
                subsystem_name,
                row.subsystem_code.as_deref(),
                row.subsystem_tag.as_deref(),
            );
            if subsystem.created {
                summary.subsystems_created += 1;
            }

            let Some(item_name) = present(&row.item) else {
                continue;
            };
            let item = taxonomy.upsert_item(
                subsystem.id,
                item_name,
                row.item_code.as_deref(),
                row.item_tag.as_deref(),
            );
            if item.created {
                summary.items_created += 1;
            }

            let Some(part_name) = present(&row.part) else {
                continue;
            };
            let part = taxonomy.upsert_part(
                item.id,
                part_name,
                row.part_code.as_deref(),
                row.part_tag.as_deref(),
            );
            if part.created {
                summary.parts_created += 1;
            }
        }

        info!(
            "Taxonomy import for asset {}: {} rows, {} nodes created",
            self.asset,
            summary.rows_seen,
            summary.total_created()
        );
        summary
    }
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_row(system: &str, subsystem: &str, item: &str, part: &str) -> TaxonomyRow {
        TaxonomyRow {
            system: Some(system.to_string()),
            subsystem: Some(subsystem.to_string()),
            item: Some(item.to_string()),
            part: Some(part.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_full_hierarchy_import() {
        let mut tax = Taxonomy::new();
        let importer = TaxonomyImporter::new(1);

        let summary = importer.import(
            &mut tax,
            vec![
                full_row("Hidráulico", "Bomba", "Rodamiento", "Retén"),
                full_row("Hidráulico", "Bomba", "Rodamiento", "Pista"),
                full_row("Eléctrico", "Tablero", "Contactor", "Bobina"),
            ],
        );

        assert_eq!(summary.systems_created, 2);
        assert_eq!(summary.subsystems_created, 2);
        assert_eq!(summary.items_created, 2);
        assert_eq!(summary.parts_created, 3);

        let systems = tax.systems_of(1);
        assert_eq!(systems.len(), 2);
        let hydraulic = systems.iter().find(|s| s.name == "Hidráulico").unwrap();
        let pumps = tax.subsystems_of(hydraulic.id);
        assert_eq!(pumps.len(), 1);
        let bearings = tax.items_of(pumps[0].id);
        assert_eq!(tax.parts_of(bearings[0].id).len(), 2);
    }

    #[test]
    fn test_blank_level_stops_descent() {
        let mut tax = Taxonomy::new();
        let importer = TaxonomyImporter::new(1);

        let row = TaxonomyRow {
            system: Some("Hidráulico".to_string()),
            subsystem: Some("  ".to_string()),
            item: Some("Ignored".to_string()),
            ..Default::default()
        };
        let summary = importer.import(&mut tax, vec![row]);

        assert_eq!(summary.systems_created, 1);
        assert_eq!(summary.subsystems_created, 0);
        assert_eq!(summary.items_created, 0);
    }

    #[test]
    fn test_reimport_is_idempotent() {
        let mut tax = Taxonomy::new();
        let importer = TaxonomyImporter::new(1);
        let rows = vec![full_row("Hidráulico", "Bomba", "Rodamiento", "Retén")];

        let first = importer.import(&mut tax, rows.clone());
        let second = importer.import(&mut tax, rows);

        assert_eq!(first.total_created(), 4);
        assert_eq!(second.total_created(), 0);
        assert_eq!(tax.len(), 4);
    }

    #[test]
    fn test_explicit_tags_from_rows() {
        let mut tax = Taxonomy::new();
        let importer = TaxonomyImporter::new(1);

        let mut row = full_row("Hidráulico", "Bomba", "Rodamiento", "Retén");
        row.system_tag = Some("HYD".to_string());
        importer.import(&mut tax, vec![row]);

        let systems = tax.systems_of(1);
        assert_eq!(systems[0].tag, "HYD");
        assert_eq!(tax.subsystems_of(systems[0].id)[0].tag, "HYD-BOMBA");
    }
}
