//! Cacheable list resources and their fetchers.

use crate::api_client::RestClient;
use async_trait::async_trait;
use domus_core::{
    Block, Building, Complex, EntityId, EntityIdType, FetchError, HierarchyLevel, Mtk, Paginated,
    Property, QueryParams, Resident, Section, ValidationError,
};
use domus_query::{FetchRegistry, Fetcher, QueryClient, ResourceKey};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// The query client specialized to this API.
pub type DomusQueryClient = QueryClient<ResourceKind, ResourceData>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    MtkList,
    ComplexList,
    BuildingList,
    BlockList,
    PropertyList,
    ResidentList,
}

impl ResourceKey for ResourceKind {
    fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::MtkList => "mtk:list",
            ResourceKind::ComplexList => "complex:list",
            ResourceKind::BuildingList => "building:list",
            ResourceKind::BlockList => "block:list",
            ResourceKind::PropertyList => "properties:list",
            ResourceKind::ResidentList => "residents:list",
        }
    }

    fn all() -> &'static [Self] {
        &[
            ResourceKind::MtkList,
            ResourceKind::ComplexList,
            ResourceKind::BuildingList,
            ResourceKind::BlockList,
            ResourceKind::PropertyList,
            ResourceKind::ResidentList,
        ]
    }
}

impl ResourceKind {
    /// Collection path relative to the API base.
    pub fn path(&self) -> &'static str {
        match self {
            ResourceKind::MtkList => "mtk/",
            ResourceKind::ComplexList => "complexes/",
            ResourceKind::BuildingList => "buildings/",
            ResourceKind::BlockList => "blocks/",
            ResourceKind::PropertyList => "properties/",
            ResourceKind::ResidentList => "residents/",
        }
    }

    /// Hierarchy level the listed entities belong to; residents sit below
    /// the selectable chain.
    pub fn level(&self) -> Option<HierarchyLevel> {
        match self {
            ResourceKind::MtkList => Some(HierarchyLevel::Mtk),
            ResourceKind::ComplexList => Some(HierarchyLevel::Complex),
            ResourceKind::BuildingList => Some(HierarchyLevel::Building),
            ResourceKind::BlockList => Some(HierarchyLevel::Block),
            ResourceKind::PropertyList => Some(HierarchyLevel::Property),
            ResourceKind::ResidentList => None,
        }
    }

    pub fn for_level(level: HierarchyLevel) -> Self {
        match level {
            HierarchyLevel::Mtk => ResourceKind::MtkList,
            HierarchyLevel::Complex => ResourceKind::ComplexList,
            HierarchyLevel::Building => ResourceKind::BuildingList,
            HierarchyLevel::Block => ResourceKind::BlockList,
            HierarchyLevel::Property => ResourceKind::PropertyList,
        }
    }

    /// Selection levels that narrow this list: every level above it.
    pub fn scope_levels(&self) -> &'static [HierarchyLevel] {
        match self.level() {
            Some(level) => level.ancestors(),
            None => HierarchyLevel::all(),
        }
    }

    pub fn section(&self) -> Section {
        match self {
            ResourceKind::MtkList => Section::Mtk,
            ResourceKind::ComplexList => Section::Complexes,
            ResourceKind::BuildingList => Section::Buildings,
            ResourceKind::BlockList => Section::Blocks,
            ResourceKind::PropertyList => Section::Properties,
            ResourceKind::ResidentList => Section::Residents,
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResourceKind {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        ResourceKind::all()
            .iter()
            .copied()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| ValidationError::InvalidValue {
                field: "resource".to_string(),
                reason: format!("unknown resource '{}'", s),
            })
    }
}

/// One fetched page of any resource.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "resource", content = "page", rename_all = "snake_case")]
pub enum ResourceData {
    Mtks(Paginated<Mtk>),
    Complexes(Paginated<Complex>),
    Buildings(Paginated<Building>),
    Blocks(Paginated<Block>),
    Properties(Paginated<Property>),
    Residents(Paginated<Resident>),
}

impl ResourceData {
    pub fn kind(&self) -> ResourceKind {
        match self {
            ResourceData::Mtks(_) => ResourceKind::MtkList,
            ResourceData::Complexes(_) => ResourceKind::ComplexList,
            ResourceData::Buildings(_) => ResourceKind::BuildingList,
            ResourceData::Blocks(_) => ResourceKind::BlockList,
            ResourceData::Properties(_) => ResourceKind::PropertyList,
            ResourceData::Residents(_) => ResourceKind::ResidentList,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            ResourceData::Mtks(p) => p.items.len(),
            ResourceData::Complexes(p) => p.items.len(),
            ResourceData::Buildings(p) => p.items.len(),
            ResourceData::Blocks(p) => p.items.len(),
            ResourceData::Properties(p) => p.items.len(),
            ResourceData::Residents(p) => p.items.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn total(&self) -> u64 {
        match self {
            ResourceData::Mtks(p) => p.total,
            ResourceData::Complexes(p) => p.total,
            ResourceData::Buildings(p) => p.total,
            ResourceData::Blocks(p) => p.total,
            ResourceData::Properties(p) => p.total,
            ResourceData::Residents(p) => p.total,
        }
    }

    /// Ids on this page, in order.
    pub fn ids(&self) -> Vec<EntityId> {
        match self {
            ResourceData::Mtks(p) => p.items.iter().map(|e| e.id.as_i64()).collect(),
            ResourceData::Complexes(p) => p.items.iter().map(|e| e.id.as_i64()).collect(),
            ResourceData::Buildings(p) => p.items.iter().map(|e| e.id.as_i64()).collect(),
            ResourceData::Blocks(p) => p.items.iter().map(|e| e.id.as_i64()).collect(),
            ResourceData::Properties(p) => p.items.iter().map(|e| e.id.as_i64()).collect(),
            ResourceData::Residents(p) => p.items.iter().map(|e| e.id.as_i64()).collect(),
        }
    }

    /// The same page with item `id` removed.
    pub fn without_id(mut self, id: EntityId) -> Self {
        match &mut self {
            ResourceData::Mtks(p) => p.remove_where(|e| e.id.as_i64() == id),
            ResourceData::Complexes(p) => p.remove_where(|e| e.id.as_i64() == id),
            ResourceData::Buildings(p) => p.remove_where(|e| e.id.as_i64() == id),
            ResourceData::Blocks(p) => p.remove_where(|e| e.id.as_i64() == id),
            ResourceData::Properties(p) => p.remove_where(|e| e.id.as_i64() == id),
            ResourceData::Residents(p) => p.remove_where(|e| e.id.as_i64() == id),
        };
        self
    }
}

/// Fetches one page of `kind` through the REST client.
pub struct ListFetcher {
    rest: RestClient,
    kind: ResourceKind,
}

impl ListFetcher {
    pub fn new(rest: RestClient, kind: ResourceKind) -> Self {
        Self { rest, kind }
    }
}

#[async_trait]
impl Fetcher<ResourceData> for ListFetcher {
    async fn fetch(&self, params: &QueryParams) -> Result<ResourceData, FetchError> {
        let path = self.kind.path();
        let data = match self.kind {
            ResourceKind::MtkList => ResourceData::Mtks(self.rest.list(path, params).await?),
            ResourceKind::ComplexList => {
                ResourceData::Complexes(self.rest.list(path, params).await?)
            }
            ResourceKind::BuildingList => {
                ResourceData::Buildings(self.rest.list(path, params).await?)
            }
            ResourceKind::BlockList => ResourceData::Blocks(self.rest.list(path, params).await?),
            ResourceKind::PropertyList => {
                ResourceData::Properties(self.rest.list(path, params).await?)
            }
            ResourceKind::ResidentList => {
                ResourceData::Residents(self.rest.list(path, params).await?)
            }
        };
        Ok(data)
    }
}

/// Registry with a REST fetcher for every resource kind.
pub fn registry(rest: &RestClient) -> FetchRegistry<ResourceKind, ResourceData> {
    FetchRegistry::from_fn(|kind| {
        let fetcher: Arc<dyn Fetcher<ResourceData>> = match kind {
            ResourceKind::MtkList
            | ResourceKind::ComplexList
            | ResourceKind::BuildingList
            | ResourceKind::BlockList
            | ResourceKind::PropertyList
            | ResourceKind::ResidentList => Arc::new(ListFetcher::new(rest.clone(), kind)),
        };
        fetcher
    })
}
