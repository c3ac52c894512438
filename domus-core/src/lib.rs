//! Domus Core - Entity Types
//!
//! Pure data structures shared by every Domus crate: typed identifiers, the
//! property hierarchy, query parameters, and the permission table.
//! This crate contains ONLY data types - no I/O and no caching logic.

pub mod entities;
pub mod error;
pub mod hierarchy;
pub mod identity;
pub mod permissions;
pub mod query;

pub use entities::{
    Block, Building, Complex, HierarchyEntity, Mtk, Paginated, Property, PropertyKind, Resident,
};
pub use error::{FetchError, ValidationError};
pub use hierarchy::HierarchyLevel;
pub use identity::{
    BlockId, BuildingId, ComplexId, EntityId, EntityIdType, EpochMillis, MtkId, PropertyId,
    ResidentId, Timestamp,
};
pub use permissions::{Actions, PermissionGrant, PermissionTable, Role, Section};
pub use query::{Pagination, QueryParams};
