//! Domus Test Utilities
//!
//! Shared test infrastructure for the Domus workspace:
//! - Scripted fetchers and entity loaders
//! - Proptest generators for entity and query types
//! - Fixtures for a linked MTK → Property chain
//! - Assertions for query and selection results

pub use domus_core::{
    Block, BlockId, Building, BuildingId, Complex, ComplexId, EntityId, EntityIdType, FetchError,
    HierarchyEntity, HierarchyLevel, Mtk, MtkId, Paginated, Property, PropertyId, PropertyKind,
    QueryParams, Resident, ResidentId,
};
pub use domus_query::{EntityLoader, Fetcher, QueryError, RegistryError, SelectionError};

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Semaphore;

// ============================================================================
// MOCK COLLABORATORS
// ============================================================================

/// Fetcher returning a scripted result and counting its invocations.
///
/// With a gate attached, every call waits for a permit first, which lets a
/// test hold a fetch in flight while more callers pile up.
pub struct ScriptedFetcher<T> {
    result: Mutex<Result<T, FetchError>>,
    calls: AtomicUsize,
    params: Mutex<Vec<QueryParams>>,
    gate: Option<Arc<Semaphore>>,
}

impl<T: Clone + Send + 'static> ScriptedFetcher<T> {
    pub fn returning(value: T) -> Self {
        Self::with_result(Ok(value))
    }

    pub fn failing(error: FetchError) -> Self {
        Self::with_result(Err(error))
    }

    pub fn with_result(result: Result<T, FetchError>) -> Self {
        Self {
            result: Mutex::new(result),
            calls: AtomicUsize::new(0),
            params: Mutex::new(Vec::new()),
            gate: None,
        }
    }

    /// Block every call until `gate` hands out a permit.
    pub fn gated(mut self, gate: Arc<Semaphore>) -> Self {
        self.gate = Some(gate);
        self
    }

    pub fn set_result(&self, result: Result<T, FetchError>) {
        *self.result.lock().unwrap_or_else(|e| e.into_inner()) = result;
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Parameters of every call so far, in call order.
    pub fn seen_params(&self) -> Vec<QueryParams> {
        self.params.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

#[async_trait]
impl<T: Clone + Send + 'static> Fetcher<T> for ScriptedFetcher<T> {
    async fn fetch(&self, params: &QueryParams) -> Result<T, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.params
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(params.clone());
        if let Some(gate) = &self.gate {
            if let Err(err) = gate.acquire().await {
                return Err(FetchError::Aborted(err.to_string()));
            }
        }
        self.result
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

/// In-memory entity loader; unknown entities load as HTTP 404.
#[derive(Default)]
pub struct MockEntityLoader {
    entities: Mutex<HashMap<(HierarchyLevel, EntityId), HierarchyEntity>>,
    calls: AtomicUsize,
}

impl MockEntityLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entities(entities: impl IntoIterator<Item = HierarchyEntity>) -> Self {
        let loader = Self::new();
        for entity in entities {
            loader.insert(entity);
        }
        loader
    }

    pub fn insert(&self, entity: HierarchyEntity) {
        self.entities
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert((entity.level(), entity.id()), entity);
    }

    pub fn remove(&self, level: HierarchyLevel, id: EntityId) {
        self.entities
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(&(level, id));
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EntityLoader for MockEntityLoader {
    async fn load(
        &self,
        level: HierarchyLevel,
        id: EntityId,
    ) -> Result<HierarchyEntity, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.entities
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(&(level, id))
            .cloned()
            .ok_or_else(|| FetchError::Http {
                status: 404,
                message: format!("{} {} not found", level, id),
            })
    }
}

// ============================================================================
// PROPTEST GENERATORS
// ============================================================================

pub mod generators {
    //! Proptest strategies for Domus types.

    use super::*;
    use proptest::prelude::*;
    use serde_json::Value;

    pub fn arb_entity_id() -> impl Strategy<Value = EntityId> {
        1i64..10_000
    }

    pub fn arb_level() -> impl Strategy<Value = HierarchyLevel> {
        prop::sample::select(HierarchyLevel::all().to_vec())
    }

    pub fn arb_property_kind() -> impl Strategy<Value = PropertyKind> {
        prop_oneof![
            Just(PropertyKind::Apartment),
            Just(PropertyKind::Commercial),
            Just(PropertyKind::Parking),
            Just(PropertyKind::Storage),
        ]
    }

    /// A JSON scalar, including the blank values canonicalization drops.
    pub fn arb_param_value() -> impl Strategy<Value = Value> {
        prop_oneof![
            Just(Value::Null),
            Just(Value::String(String::new())),
            any::<bool>().prop_map(Value::from),
            (-1000i64..1000).prop_map(Value::from),
            "[a-z ]{1,12}".prop_map(Value::from),
        ]
    }

    pub fn arb_query_params() -> impl Strategy<Value = QueryParams> {
        prop::collection::btree_map("[a-z_]{1,10}", arb_param_value(), 0..6)
            .prop_map(|map| map.into_iter().collect())
    }

    pub fn arb_fetch_error() -> impl Strategy<Value = FetchError> {
        prop_oneof![
            (400u16..600, "[a-z ]{0,20}")
                .prop_map(|(status, message)| FetchError::Http { status, message }),
            "[a-z ]{1,20}".prop_map(FetchError::Transport),
            "[a-z ]{1,20}".prop_map(FetchError::Decode),
        ]
    }

    pub fn arb_mtk() -> impl Strategy<Value = Mtk> {
        (
            arb_entity_id(),
            "[A-Za-z ]{1,24}",
            prop::option::of("[0-9]{10}"),
        )
            .prop_map(|(id, name, inn)| Mtk {
                id: MtkId::new(id),
                name,
                inn,
                phone: None,
                address: None,
            })
    }

    pub fn arb_property(block_id: BlockId) -> impl Strategy<Value = Property> {
        (
            arb_entity_id(),
            1u32..500,
            arb_property_kind(),
            prop::option::of(-2i32..40),
            prop::option::of(10.0f64..300.0),
        )
            .prop_map(move |(id, number, kind, floor, area)| Property {
                id: PropertyId::new(id),
                block_id,
                number: number.to_string(),
                kind,
                floor,
                area,
            })
    }

    /// Any entity of the given level, with an arbitrary id.
    pub fn arb_entity_at(level: HierarchyLevel) -> impl Strategy<Value = HierarchyEntity> {
        (arb_entity_id(), arb_entity_id())
            .prop_map(move |(id, parent)| fixtures::entity(level, id, parent))
    }

    /// Sequences of `set_filter` calls: `None` clears the level.
    pub fn arb_selection_ops(
        max: usize,
    ) -> impl Strategy<Value = Vec<(HierarchyLevel, Option<EntityId>)>> {
        prop::collection::vec((arb_level(), prop::option::of(1i64..4)), 1..max)
    }
}

// ============================================================================
// TEST FIXTURES
// ============================================================================

pub mod fixtures {
    //! Pre-built entities for common scenarios.

    use super::*;

    pub fn mtk(id: EntityId) -> Mtk {
        Mtk {
            id: MtkId::new(id),
            name: format!("MTK {}", id),
            inn: Some("7701234567".to_string()),
            phone: None,
            address: None,
        }
    }

    pub fn complex(id: EntityId, mtk_id: EntityId) -> Complex {
        Complex {
            id: ComplexId::new(id),
            mtk_id: MtkId::new(mtk_id),
            name: format!("Complex {}", id),
            address: Some(format!("{} Park Lane", id)),
        }
    }

    pub fn building(id: EntityId, complex_id: EntityId) -> Building {
        Building {
            id: BuildingId::new(id),
            complex_id: ComplexId::new(complex_id),
            name: format!("Building {}", id),
            address: None,
            floors: Some(9),
        }
    }

    pub fn block(id: EntityId, building_id: EntityId) -> Block {
        Block {
            id: BlockId::new(id),
            building_id: BuildingId::new(building_id),
            name: format!("Block {}", id),
            floors: Some(9),
        }
    }

    pub fn property(id: EntityId, block_id: EntityId) -> Property {
        Property {
            id: PropertyId::new(id),
            block_id: BlockId::new(block_id),
            number: id.to_string(),
            kind: PropertyKind::Apartment,
            floor: Some(1),
            area: Some(54.5),
        }
    }

    pub fn resident(id: EntityId, property_id: EntityId) -> Resident {
        Resident {
            id: ResidentId::new(id),
            property_id: PropertyId::new(property_id),
            full_name: format!("Resident {}", id),
            phone: None,
            is_owner: id % 2 == 0,
        }
    }

    /// Entity at `level` with the given id and parent id.
    pub fn entity(level: HierarchyLevel, id: EntityId, parent: EntityId) -> HierarchyEntity {
        match level {
            HierarchyLevel::Mtk => HierarchyEntity::Mtk(mtk(id)),
            HierarchyLevel::Complex => HierarchyEntity::Complex(complex(id, parent)),
            HierarchyLevel::Building => HierarchyEntity::Building(building(id, parent)),
            HierarchyLevel::Block => HierarchyEntity::Block(block(id, parent)),
            HierarchyLevel::Property => HierarchyEntity::Property(property(id, parent)),
        }
    }

    /// MTK 1 → Complex 2 → Building 3 → Block 4 → Property 5.
    pub fn chain() -> Vec<HierarchyEntity> {
        HierarchyLevel::all()
            .iter()
            .enumerate()
            .map(|(i, level)| entity(*level, i as EntityId + 1, i as EntityId))
            .collect()
    }

    /// Every entity of a small tree: ids 1..=`fanout` at each level,
    /// all hanging off parent 1.
    pub fn tree(fanout: EntityId) -> Vec<HierarchyEntity> {
        HierarchyLevel::all()
            .iter()
            .flat_map(|level| (1..=fanout).map(move |id| entity(*level, id, 1)))
            .collect()
    }

    pub fn page<T>(items: Vec<T>, page: u32, page_size: u32, total: u64) -> Paginated<T> {
        Paginated {
            items,
            total,
            page,
            page_size,
        }
    }
}

// ============================================================================
// CUSTOM ASSERTIONS
// ============================================================================

pub mod assertions {
    //! Assertions for query and selection results.

    use super::*;

    /// Assert that a query failed with the given HTTP status.
    #[track_caller]
    pub fn assert_http_status<T: std::fmt::Debug>(result: &Result<T, QueryError>, status: u16) {
        match result {
            Err(QueryError::Fetch(err)) => {
                assert_eq!(err.status(), Some(status), "Wrong HTTP status: {:?}", err)
            }
            other => panic!("Expected HTTP {} error, got: {:?}", status, other),
        }
    }

    /// Assert that a query failed because no fetcher was registered for `key`.
    #[track_caller]
    pub fn assert_missing_fetcher<T: std::fmt::Debug>(result: &Result<T, QueryError>, key: &str) {
        match result {
            Err(QueryError::Registry(RegistryError::MissingFetcher { key: k })) => {
                assert_eq!(k, key, "Wrong key in MissingFetcher error")
            }
            other => panic!("Expected MissingFetcher for {}, got: {:?}", key, other),
        }
    }

    /// Assert that a selection failed to load `level`.
    #[track_caller]
    pub fn assert_load_failed(result: &Result<(), SelectionError>, level: HierarchyLevel) {
        match result {
            Err(SelectionError::Load { level: l, .. }) => {
                assert_eq!(*l, level, "Wrong level in Load error")
            }
            other => panic!("Expected Load error for {}, got: {:?}", level, other),
        }
    }
}
