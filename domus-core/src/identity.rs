//! Identity types for Domus entities

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Raw numeric identifier as issued by the REST API.
pub type EntityId = i64;

/// Timestamp type using UTC timezone.
pub type Timestamp = DateTime<Utc>;

/// Milliseconds since the Unix epoch. Zero means "never".
pub type EpochMillis = i64;

/// Common behavior of the strongly-typed entity identifiers.
pub trait EntityIdType: Copy + Eq + std::hash::Hash + fmt::Debug + fmt::Display {
    /// Short entity name used in messages and query parameters.
    const ENTITY_NAME: &'static str;

    fn new(id: EntityId) -> Self;

    fn as_i64(&self) -> EntityId;
}

macro_rules! define_entity_id {
    ($(#[$meta:meta])* $name:ident, $entity:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(EntityId);

        impl EntityIdType for $name {
            const ENTITY_NAME: &'static str = $entity;

            fn new(id: EntityId) -> Self {
                Self(id)
            }

            fn as_i64(&self) -> EntityId {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}#{}", $entity, self.0)
            }
        }

        impl From<$name> for EntityId {
            fn from(id: $name) -> EntityId {
                id.0
            }
        }
    };
}

define_entity_id!(
    /// Management company (MTK) identifier.
    MtkId,
    "mtk"
);
define_entity_id!(
    /// Residential complex identifier.
    ComplexId,
    "complex"
);
define_entity_id!(BuildingId, "building");
define_entity_id!(BlockId, "block");
define_entity_id!(
    /// Unit/property identifier (apartment, parking space, ...).
    PropertyId,
    "property"
);
define_entity_id!(ResidentId, "resident");
