//! Core entity structures

use crate::hierarchy::HierarchyLevel;
use crate::identity::{
    BlockId, BuildingId, ComplexId, EntityId, EntityIdType, MtkId, PropertyId, ResidentId,
};
use serde::{Deserialize, Serialize};

/// Management company - root of the hierarchy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mtk {
    pub id: MtkId,
    pub name: String,
    /// Taxpayer identification number.
    #[serde(default)]
    pub inn: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
}

/// Residential complex managed by an MTK.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Complex {
    pub id: ComplexId,
    pub mtk_id: MtkId,
    pub name: String,
    #[serde(default)]
    pub address: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Building {
    pub id: BuildingId,
    pub complex_id: ComplexId,
    pub name: String,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub floors: Option<u32>,
}

/// Block (entrance/section) of a building.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub id: BlockId,
    pub building_id: BuildingId,
    pub name: String,
    #[serde(default)]
    pub floors: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PropertyKind {
    Apartment,
    Commercial,
    Parking,
    Storage,
}

/// Unit/property inside a block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Property {
    pub id: PropertyId,
    pub block_id: BlockId,
    pub number: String,
    pub kind: PropertyKind,
    #[serde(default)]
    pub floor: Option<i32>,
    /// Area in square meters.
    #[serde(default)]
    pub area: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resident {
    pub id: ResidentId,
    pub property_id: PropertyId,
    pub full_name: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub is_owner: bool,
}

/// One page of a list endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Paginated<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u32,
    pub page_size: u32,
}

impl<T> Paginated<T> {
    pub fn total_pages(&self) -> u32 {
        if self.page_size == 0 {
            return 0;
        }
        let pages = self.total.div_ceil(u64::from(self.page_size));
        u32::try_from(pages).unwrap_or(u32::MAX)
    }

    pub fn has_next(&self) -> bool {
        self.page < self.total_pages()
    }

    /// Drop every item matching `pred`, keeping `total` consistent.
    pub fn remove_where<F>(&mut self, pred: F) -> usize
    where
        F: Fn(&T) -> bool,
    {
        let before = self.items.len();
        self.items.retain(|item| !pred(item));
        let removed = before - self.items.len();
        self.total = self.total.saturating_sub(removed as u64);
        removed
    }
}

/// Fully loaded entity at one level of the selection hierarchy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "level", content = "entity", rename_all = "snake_case")]
pub enum HierarchyEntity {
    Mtk(Mtk),
    Complex(Complex),
    Building(Building),
    Block(Block),
    Property(Property),
}

impl HierarchyEntity {
    pub fn level(&self) -> HierarchyLevel {
        match self {
            Self::Mtk(_) => HierarchyLevel::Mtk,
            Self::Complex(_) => HierarchyLevel::Complex,
            Self::Building(_) => HierarchyLevel::Building,
            Self::Block(_) => HierarchyLevel::Block,
            Self::Property(_) => HierarchyLevel::Property,
        }
    }

    pub fn id(&self) -> EntityId {
        match self {
            Self::Mtk(e) => e.id.as_i64(),
            Self::Complex(e) => e.id.as_i64(),
            Self::Building(e) => e.id.as_i64(),
            Self::Block(e) => e.id.as_i64(),
            Self::Property(e) => e.id.as_i64(),
        }
    }

    /// Id of the parent entity one level up, if any.
    pub fn parent_id(&self) -> Option<EntityId> {
        match self {
            Self::Mtk(_) => None,
            Self::Complex(e) => Some(e.mtk_id.as_i64()),
            Self::Building(e) => Some(e.complex_id.as_i64()),
            Self::Block(e) => Some(e.building_id.as_i64()),
            Self::Property(e) => Some(e.block_id.as_i64()),
        }
    }

    pub fn display_name(&self) -> &str {
        match self {
            Self::Mtk(e) => &e.name,
            Self::Complex(e) => &e.name,
            Self::Building(e) => &e.name,
            Self::Block(e) => &e.name,
            Self::Property(e) => &e.number,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_total_pages() {
        let page: Paginated<u8> = Paginated {
            items: vec![],
            total: 41,
            page: 1,
            page_size: 20,
        };
        assert_eq!(page.total_pages(), 3);
        assert!(page.has_next());

        let empty: Paginated<u8> = Paginated {
            items: vec![],
            total: 0,
            page: 1,
            page_size: 0,
        };
        assert_eq!(empty.total_pages(), 0);
    }

    #[test]
    fn test_remove_where_adjusts_total() {
        let mut page = Paginated {
            items: vec![1, 2, 3, 2],
            total: 10,
            page: 1,
            page_size: 4,
        };
        assert_eq!(page.remove_where(|v| *v == 2), 2);
        assert_eq!(page.items, vec![1, 3]);
        assert_eq!(page.total, 8);
    }

    #[test]
    fn test_hierarchy_entity_accessors() {
        let block = HierarchyEntity::Block(Block {
            id: BlockId::new(3),
            building_id: BuildingId::new(9),
            name: "B".to_string(),
            floors: None,
        });
        assert_eq!(block.level(), HierarchyLevel::Block);
        assert_eq!(block.id(), 3);
        assert_eq!(block.parent_id(), Some(9));
        assert_eq!(block.display_name(), "B");
    }
}
