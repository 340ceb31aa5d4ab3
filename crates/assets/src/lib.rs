//! Asset Registry
//!
//! Physical assets (machines, molds), their families, the fault catalog,
//! and the four-level maintenance taxonomy:
//! system -> subsystem -> maintainable item -> part.

pub mod asset;
pub mod importer;
pub mod taxonomy;

pub use asset::{Asset, AssetFamily, AssetId, FamilyId, FaultCode, FaultId};
pub use importer::{ImportSummary, TaxonomyImporter, TaxonomyRow};
pub use taxonomy::{
    MaintainableItem, Part, Subsystem, System, Taxonomy, TaxonomyLevel, TaxonomyNodeId, Upserted,
};
