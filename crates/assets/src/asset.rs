//! Asset, family and fault-catalog records

use serde::{Deserialize, Serialize};

/// Asset identifier (repository-allocated)
pub type AssetId = i64;
/// Asset family identifier
pub type FamilyId = i64;
/// Fault catalog identifier
pub type FaultId = i64;

/// A physical asset under maintenance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Asset {
    pub id: AssetId,
    /// Unique registry code
    pub code: String,
    /// Plant asset number (free-form, not unique)
    pub asset_number: String,
    pub name: String,
    /// Weight in kg, when known
    pub weight: Option<f64>,
    /// Family for family-scoped checklist templates
    pub family: Option<FamilyId>,
}

impl Asset {
    /// Create an asset with no family assigned
    pub fn new(id: AssetId, code: impl Into<String>, asset_number: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id,
            code: code.into(),
            asset_number: asset_number.into(),
            name: name.into(),
            weight: None,
            family: None,
        }
    }

    /// Display label used in logs and listings
    pub fn label(&self) -> String {
        format!("{} - {}", self.code, self.name)
    }
}

/// Asset family (groups assets for family-scoped templates)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetFamily {
    pub id: FamilyId,
    /// Unique family name
    pub name: String,
}

/// Fault catalog entry (used by corrective orders and templates)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FaultCode {
    pub id: FaultId,
    /// Unique fault code
    pub code: String,
    pub name: String,
    pub description: String,
}

impl FaultCode {
    pub fn label(&self) -> String {
        format!("{} - {}", self.code, self.name)
    }
}
