//! Maintenance taxonomy tree
//!
//! Four levels hang off an asset: system -> subsystem -> maintainable item
//! -> part. Tags are unique within a level; nodes created without an
//! explicit tag get a slug chained off the parent tag.

use crate::asset::AssetId;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

/// Identifier shared by all taxonomy nodes
pub type TaxonomyNodeId = i64;

/// Taxonomy level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaxonomyLevel {
    System,
    Subsystem,
    Item,
    Part,
}

impl TaxonomyLevel {
    /// Tag prefix used when a row carries no explicit tag
    pub fn tag_prefix(&self) -> &'static str {
        match self {
            TaxonomyLevel::System => "SYS",
            TaxonomyLevel::Subsystem => "SUB",
            TaxonomyLevel::Item => "ITEM",
            TaxonomyLevel::Part => "PAR",
        }
    }
}

impl fmt::Display for TaxonomyLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TaxonomyLevel::System => "system",
            TaxonomyLevel::Subsystem => "subsystem",
            TaxonomyLevel::Item => "item",
            TaxonomyLevel::Part => "part",
        };
        write!(f, "{name}")
    }
}

/// Top-level system of an asset
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct System {
    pub id: TaxonomyNodeId,
    pub asset: AssetId,
    pub tag: String,
    pub code: String,
    pub name: String,
}

/// Subsystem under a system
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subsystem {
    pub id: TaxonomyNodeId,
    pub system: TaxonomyNodeId,
    pub tag: String,
    pub code: String,
    pub name: String,
}

/// Maintainable item under a subsystem
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaintainableItem {
    pub id: TaxonomyNodeId,
    pub subsystem: TaxonomyNodeId,
    pub tag: String,
    pub code: String,
    pub name: String,
}

/// Part under a maintainable item
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Part {
    pub id: TaxonomyNodeId,
    pub item: TaxonomyNodeId,
    pub tag: String,
    pub code: String,
    pub name: String,
}

/// Upsert outcome: node id plus whether it was created
#[derive(Debug, Clone, Copy)]
pub struct Upserted {
    pub id: TaxonomyNodeId,
    pub created: bool,
}

/// Owned taxonomy forest for all assets
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct Taxonomy {
    systems: Vec<System>,
    subsystems: Vec<Subsystem>,
    items: Vec<MaintainableItem>,
    parts: Vec<Part>,
    next_id: TaxonomyNodeId,
}

impl Taxonomy {
    pub fn new() -> Self {
        Self {
            systems: Vec::new(),
            subsystems: Vec::new(),
            items: Vec::new(),
            parts: Vec::new(),
            next_id: 1,
        }
    }

    fn alloc_id(&mut self) -> TaxonomyNodeId {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Systems of an asset, ordered by tag
    pub fn systems_of(&self, asset: AssetId) -> Vec<&System> {
        let mut out: Vec<_> = self.systems.iter().filter(|s| s.asset == asset).collect();
        out.sort_by(|a, b| a.tag.cmp(&b.tag));
        out
    }

    /// Subsystems of a system, ordered by tag
    pub fn subsystems_of(&self, system: TaxonomyNodeId) -> Vec<&Subsystem> {
        let mut out: Vec<_> = self.subsystems.iter().filter(|s| s.system == system).collect();
        out.sort_by(|a, b| a.tag.cmp(&b.tag));
        out
    }

    /// Items of a subsystem, ordered by tag
    pub fn items_of(&self, subsystem: TaxonomyNodeId) -> Vec<&MaintainableItem> {
        let mut out: Vec<_> = self.items.iter().filter(|i| i.subsystem == subsystem).collect();
        out.sort_by(|a, b| a.tag.cmp(&b.tag));
        out
    }

    /// Parts of an item, ordered by tag
    pub fn parts_of(&self, item: TaxonomyNodeId) -> Vec<&Part> {
        let mut out: Vec<_> = self.parts.iter().filter(|p| p.item == item).collect();
        out.sort_by(|a, b| a.tag.cmp(&b.tag));
        out
    }

    /// Total node count across all levels
    pub fn len(&self) -> usize {
        self.systems.len() + self.subsystems.len() + self.items.len() + self.parts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Upsert a system of `asset` by case-insensitive name match
    pub fn upsert_system(
        &mut self,
        asset: AssetId,
        name: &str,
        code: Option<&str>,
        explicit_tag: Option<&str>,
    ) -> Upserted {
        let name = name.trim();
        let existing = self
            .systems
            .iter()
            .position(|s| s.asset == asset && s.name.eq_ignore_ascii_case(name));

        match existing {
            Some(pos) => {
                let (tag, id) = (self.systems[pos].tag.clone(), self.systems[pos].id);
                let new_tag = self.retag(TaxonomyLevel::System, &tag, explicit_tag, id);
                let node = &mut self.systems[pos];
                node.name = name.to_string();
                node.code = clean(code);
                node.tag = new_tag;
                Upserted { id, created: false }
            }
            None => {
                let id = self.alloc_id();
                let tag = self.fresh_tag(TaxonomyLevel::System, name, None, explicit_tag);
                debug!("Created taxonomy system {} for asset {}", tag, asset);
                self.systems.push(System {
                    id,
                    asset,
                    tag,
                    code: clean(code),
                    name: name.to_string(),
                });
                Upserted { id, created: true }
            }
        }
    }

    /// Upsert a subsystem of `system` by case-insensitive name match
    pub fn upsert_subsystem(
        &mut self,
        system: TaxonomyNodeId,
        name: &str,
        code: Option<&str>,
        explicit_tag: Option<&str>,
    ) -> Upserted {
        let name = name.trim();
        let parent_tag = self.systems.iter().find(|s| s.id == system).map(|s| s.tag.clone());
        let existing = self
            .subsystems
            .iter()
            .position(|s| s.system == system && s.name.eq_ignore_ascii_case(name));

        match existing {
            Some(pos) => {
                let (tag, id) = (self.subsystems[pos].tag.clone(), self.subsystems[pos].id);
                let new_tag = self.retag(TaxonomyLevel::Subsystem, &tag, explicit_tag, id);
                let node = &mut self.subsystems[pos];
                node.name = name.to_string();
                node.code = clean(code);
                node.tag = new_tag;
                Upserted { id, created: false }
            }
            None => {
                let id = self.alloc_id();
                let tag =
                    self.fresh_tag(TaxonomyLevel::Subsystem, name, parent_tag.as_deref(), explicit_tag);
                self.subsystems.push(Subsystem {
                    id,
                    system,
                    tag,
                    code: clean(code),
                    name: name.to_string(),
                });
                Upserted { id, created: true }
            }
        }
    }

    /// Upsert a maintainable item of `subsystem` by case-insensitive name match
    pub fn upsert_item(
        &mut self,
        subsystem: TaxonomyNodeId,
        name: &str,
        code: Option<&str>,
        explicit_tag: Option<&str>,
    ) -> Upserted {
        let name = name.trim();
        let parent_tag = self
            .subsystems
            .iter()
            .find(|s| s.id == subsystem)
            .map(|s| s.tag.clone());
        let existing = self
            .items
            .iter()
            .position(|i| i.subsystem == subsystem && i.name.eq_ignore_ascii_case(name));

        match existing {
            Some(pos) => {
                let (tag, id) = (self.items[pos].tag.clone(), self.items[pos].id);
                let new_tag = self.retag(TaxonomyLevel::Item, &tag, explicit_tag, id);
                let node = &mut self.items[pos];
                node.name = name.to_string();
                node.code = clean(code);
                node.tag = new_tag;
                Upserted { id, created: false }
            }
            None => {
                let id = self.alloc_id();
                let tag = self.fresh_tag(TaxonomyLevel::Item, name, parent_tag.as_deref(), explicit_tag);
                self.items.push(MaintainableItem {
                    id,
                    subsystem,
                    tag,
                    code: clean(code),
                    name: name.to_string(),
                });
                Upserted { id, created: true }
            }
        }
    }

    /// Upsert a part of `item` by case-insensitive name match
    pub fn upsert_part(
        &mut self,
        item: TaxonomyNodeId,
        name: &str,
        code: Option<&str>,
        explicit_tag: Option<&str>,
    ) -> Upserted {
        let name = name.trim();
        let parent_tag = self.items.iter().find(|i| i.id == item).map(|i| i.tag.clone());
        let existing = self
            .parts
            .iter()
            .position(|p| p.item == item && p.name.eq_ignore_ascii_case(name));

        match existing {
            Some(pos) => {
                let (tag, id) = (self.parts[pos].tag.clone(), self.parts[pos].id);
                let new_tag = self.retag(TaxonomyLevel::Part, &tag, explicit_tag, id);
                let node = &mut self.parts[pos];
                node.name = name.to_string();
                node.code = clean(code);
                node.tag = new_tag;
                Upserted { id, created: false }
            }
            None => {
                let id = self.alloc_id();
                let tag = self.fresh_tag(TaxonomyLevel::Part, name, parent_tag.as_deref(), explicit_tag);
                self.parts.push(Part {
                    id,
                    item,
                    tag,
                    code: clean(code),
                    name: name.to_string(),
                });
                Upserted { id, created: true }
            }
        }
    }

    /// Tag for a brand-new node: explicit tag if given, else prefix/parent + slug
    fn fresh_tag(
        &self,
        level: TaxonomyLevel,
        name: &str,
        parent_tag: Option<&str>,
        explicit_tag: Option<&str>,
    ) -> String {
        let explicit = explicit_tag.map(str::trim).filter(|t| !t.is_empty());
        let base = match explicit {
            Some(tag) => tag.to_string(),
            None => default_tag(level, name, parent_tag),
        };
        self.unique_tag(level, &base, None)
    }

    /// Tag for an existing node: only an explicit, differing tag triggers a retag
    fn retag(
        &self,
        level: TaxonomyLevel,
        current: &str,
        explicit_tag: Option<&str>,
        id: TaxonomyNodeId,
    ) -> String {
        match explicit_tag.map(str::trim).filter(|t| !t.is_empty() && *t != current) {
            Some(tag) => self.unique_tag(level, tag, Some(id)),
            None => current.to_string(),
        }
    }

    /// Disambiguate `base` within a level with -2, -3, ... suffixes
    fn unique_tag(&self, level: TaxonomyLevel, base: &str, ignore: Option<TaxonomyNodeId>) -> String {
        let base = base.trim();
        let base = if base.is_empty() { "TAG" } else { base };

        if !self.tag_taken(level, base, ignore) {
            return base.to_string();
        }
        let mut suffix = 2;
        loop {
            let candidate = format!("{base}-{suffix}");
            if !self.tag_taken(level, &candidate, ignore) {
                return candidate;
            }
            suffix += 1;
        }
    }

    fn tag_taken(&self, level: TaxonomyLevel, tag: &str, ignore: Option<TaxonomyNodeId>) -> bool {
        let hit = |id: TaxonomyNodeId, t: &str| t == tag && Some(id) != ignore;
        match level {
            TaxonomyLevel::System => self.systems.iter().any(|s| hit(s.id, &s.tag)),
            TaxonomyLevel::Subsystem => self.subsystems.iter().any(|s| hit(s.id, &s.tag)),
            TaxonomyLevel::Item => self.items.iter().any(|i| hit(i.id, &i.tag)),
            TaxonomyLevel::Part => self.parts.iter().any(|p| hit(p.id, &p.tag)),
        }
    }
}

fn clean(value: Option<&str>) -> String {
    value.map(str::trim).unwrap_or("").to_string()
}

/// Default tag for a node created without an explicit tag
fn default_tag(level: TaxonomyLevel, name: &str, parent_tag: Option<&str>) -> String {
    let slug = slugify(name);
    match (parent_tag, slug.is_empty()) {
        (Some(parent), false) => format!("{parent}-{slug}"),
        (Some(parent), true) => parent.to_string(),
        (None, false) => format!("{}-{slug}", level.tag_prefix()),
        (None, true) => level.tag_prefix().to_string(),
    }
}

/// Uppercase ASCII slug: accents folded, runs of other characters become '-'
pub fn slugify(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut pending_dash = false;
    for ch in value.trim().chars() {
        let folded = match ch {
            'á' | 'à' | 'ä' | 'â' | 'Á' | 'À' | 'Ä' | 'Â' => Some('a'),
            'é' | 'è' | 'ë' | 'ê' | 'É' | 'È' | 'Ë' | 'Ê' => Some('e'),
            'í' | 'ì' | 'ï' | 'î' | 'Í' | 'Ì' | 'Ï' | 'Î' => Some('i'),
            'ó' | 'ò' | 'ö' | 'ô' | 'Ó' | 'Ò' | 'Ö' | 'Ô' => Some('o'),
            'ú' | 'ù' | 'ü' | 'û' | 'Ú' | 'Ù' | 'Ü' | 'Û' => Some('u'),
            'ñ' | 'Ñ' => Some('n'),
            'ç' | 'Ç' => Some('c'),
            _ if ch.is_ascii_alphanumeric() => Some(ch),
            _ if ch.is_ascii() => {
                pending_dash = true;
                None
            }
            // Other non-ASCII is dropped without breaking the run
            _ => None,
        };
        if let Some(c) = folded {
            if pending_dash && !out.is_empty() {
                out.push('-');
            }
            pending_dash = false;
            out.push(c.to_ascii_uppercase());
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify_folds_accents() {
        assert_eq!(slugify("Sistema Hidráulico"), "SISTEMA-HIDRAULICO");
        assert_eq!(slugify("  bomba #2 / retén  "), "BOMBA-2-RETEN");
        assert_eq!(slugify(""), "");
    }

    #[test]
    fn test_default_tag_chains_parent() {
        assert_eq!(default_tag(TaxonomyLevel::System, "Prensa", None), "SYS-PRENSA");
        assert_eq!(
            default_tag(TaxonomyLevel::Subsystem, "Bomba", Some("SYS-PRENSA")),
            "SYS-PRENSA-BOMBA"
        );
        assert_eq!(default_tag(TaxonomyLevel::Part, "", Some("ITEM-X")), "ITEM-X");
    }

    #[test]
    fn test_upsert_is_idempotent_on_name() {
        let mut tax = Taxonomy::new();
        let first = tax.upsert_system(1, "Hidráulico", Some("S1"), None);
        let second = tax.upsert_system(1, "  hidráulico ", Some("S1"), None);
        assert!(first.created);
        assert!(!second.created);
        assert_eq!(first.id, second.id);
        assert_eq!(tax.systems_of(1).len(), 1);
    }

    #[test]
    fn test_tag_collisions_get_suffixes() {
        let mut tax = Taxonomy::new();
        tax.upsert_system(1, "Motor", None, None);
        // Same slug for a different asset collides at the level
        tax.upsert_system(2, "Motor", None, None);
        let tags: Vec<String> = tax
            .systems_of(1)
            .into_iter()
            .chain(tax.systems_of(2))
            .map(|s| s.tag.clone())
            .collect();
        assert_eq!(tags, vec!["SYS-MOTOR".to_string(), "SYS-MOTOR-2".to_string()]);
    }

    #[test]
    fn test_explicit_tag_retags_existing_node() {
        let mut tax = Taxonomy::new();
        tax.upsert_system(1, "Motor", None, None);
        tax.upsert_system(1, "Motor", None, Some("MTR-01"));
        assert_eq!(tax.systems_of(1)[0].tag, "MTR-01");
    }
}
