//! The property hierarchy as a single ordered dependency chain.
//!
//! Every level depends on the one before it:
//! MTK → Complex → Building → Block → Property.

use crate::error::ValidationError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HierarchyLevel {
    Mtk,
    Complex,
    Building,
    Block,
    Property,
}

static CHAIN: [HierarchyLevel; 5] = [
    HierarchyLevel::Mtk,
    HierarchyLevel::Complex,
    HierarchyLevel::Building,
    HierarchyLevel::Block,
    HierarchyLevel::Property,
];

impl HierarchyLevel {
    /// All levels, root first.
    pub fn all() -> &'static [HierarchyLevel] {
        &CHAIN
    }

    pub fn index(&self) -> usize {
        match self {
            HierarchyLevel::Mtk => 0,
            HierarchyLevel::Complex => 1,
            HierarchyLevel::Building => 2,
            HierarchyLevel::Block => 3,
            HierarchyLevel::Property => 4,
        }
    }

    pub fn from_index(index: usize) -> Option<HierarchyLevel> {
        CHAIN.get(index).copied()
    }

    pub fn parent(&self) -> Option<HierarchyLevel> {
        self.index().checked_sub(1).and_then(Self::from_index)
    }

    pub fn child(&self) -> Option<HierarchyLevel> {
        Self::from_index(self.index() + 1)
    }

    /// Levels strictly below this one, nearest first.
    pub fn descendants(&self) -> &'static [HierarchyLevel] {
        &CHAIN[self.index() + 1..]
    }

    /// Levels strictly above this one, root first.
    pub fn ancestors(&self) -> &'static [HierarchyLevel] {
        &CHAIN[..self.index()]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            HierarchyLevel::Mtk => "mtk",
            HierarchyLevel::Complex => "complex",
            HierarchyLevel::Building => "building",
            HierarchyLevel::Block => "block",
            HierarchyLevel::Property => "property",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            HierarchyLevel::Mtk => "Management company",
            HierarchyLevel::Complex => "Residential complex",
            HierarchyLevel::Building => "Building",
            HierarchyLevel::Block => "Block",
            HierarchyLevel::Property => "Property",
        }
    }

    /// Query parameter a list request uses to scope by this level.
    pub fn param_name(&self) -> &'static str {
        match self {
            HierarchyLevel::Mtk => "mtk_id",
            HierarchyLevel::Complex => "complex_id",
            HierarchyLevel::Building => "building_id",
            HierarchyLevel::Block => "block_id",
            HierarchyLevel::Property => "property_id",
        }
    }
}

impl fmt::Display for HierarchyLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HierarchyLevel {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mtk" => Ok(HierarchyLevel::Mtk),
            "complex" | "complexes" => Ok(HierarchyLevel::Complex),
            "building" | "buildings" => Ok(HierarchyLevel::Building),
            "block" | "blocks" => Ok(HierarchyLevel::Block),
            "property" | "properties" => Ok(HierarchyLevel::Property),
            other => Err(ValidationError::InvalidValue {
                field: "hierarchy_level".to_string(),
                reason: format!("unknown level '{}'", other),
            }),
        }
    }
}
