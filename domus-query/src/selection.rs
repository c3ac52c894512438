//! Cascading selection across the property hierarchy.
//!
//! One [`SelectionState`] per [`HierarchyLevel`]. Clearing or replacing a
//! level clears every level below it; the chain is walked through
//! [`HierarchyLevel::descendants`] so no call site enumerates levels by hand.

use async_trait::async_trait;
use domus_core::{EntityId, FetchError, HierarchyEntity, HierarchyLevel, QueryParams};
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

const LEVELS: usize = 5;

/// Loads the full entity behind a selected id.
#[async_trait]
pub trait EntityLoader: Send + Sync {
    async fn load(&self, level: HierarchyLevel, id: EntityId)
        -> Result<HierarchyEntity, FetchError>;
}

#[async_trait]
impl<L: EntityLoader + ?Sized> EntityLoader for Arc<L> {
    async fn load(
        &self,
        level: HierarchyLevel,
        id: EntityId,
    ) -> Result<HierarchyEntity, FetchError> {
        (**self).load(level, id).await
    }
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum SelectionError {
    #[error("Failed to load {level} {id}: {source}")]
    Load {
        level: HierarchyLevel,
        id: EntityId,
        #[source]
        source: FetchError,
    },

    #[error("Loaded {got_level} {got_id} while selecting {level} {id}")]
    Mismatch {
        level: HierarchyLevel,
        id: EntityId,
        got_level: HierarchyLevel,
        got_id: EntityId,
    },
}

/// Selection at one level. Read-only outside the controller.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SelectionState {
    selected_id: Option<EntityId>,
    selected_entity: Option<HierarchyEntity>,
}

impl SelectionState {
    pub fn selected_id(&self) -> Option<EntityId> {
        self.selected_id
    }

    pub fn selected_entity(&self) -> Option<&HierarchyEntity> {
        self.selected_entity.as_ref()
    }

    pub fn is_selected(&self) -> bool {
        self.selected_id.is_some()
    }

    fn clear(&mut self) {
        self.selected_id = None;
        self.selected_entity = None;
    }
}

pub struct SelectionController<L> {
    loader: L,
    levels: [SelectionState; LEVELS],
}

impl<L: EntityLoader> SelectionController<L> {
    pub fn new(loader: L) -> Self {
        Self {
            loader,
            levels: Default::default(),
        }
    }

    pub fn loader(&self) -> &L {
        &self.loader
    }

    pub fn selection(&self, level: HierarchyLevel) -> &SelectionState {
        &self.levels[level.index()]
    }

    pub fn selected_id(&self, level: HierarchyLevel) -> Option<EntityId> {
        self.selection(level).selected_id
    }

    pub fn selected_entity(&self, level: HierarchyLevel) -> Option<&HierarchyEntity> {
        self.selection(level).selected_entity()
    }

    /// The root is always selectable; any other level once its parent is.
    pub fn is_enabled(&self, level: HierarchyLevel) -> bool {
        match level.parent() {
            Some(parent) => self.selection(parent).is_selected(),
            None => true,
        }
    }

    /// Select `id` at `level`, or clear the level when `id` is `None`.
    ///
    /// Selecting loads the full entity first; if the load fails nothing
    /// changes. Choosing a different id clears every level below, since
    /// their selections belonged to the old parent. Clearing always clears
    /// every level below.
    pub async fn set_filter(
        &mut self,
        level: HierarchyLevel,
        id: Option<EntityId>,
    ) -> Result<(), SelectionError> {
        let Some(id) = id else {
            self.clear_from(level);
            info!(level = %level, "selection cleared");
            return Ok(());
        };

        let entity = match self.loader.load(level, id).await {
            Ok(entity) => entity,
            Err(source) => {
                warn!(level = %level, id, error = %source, "selection load failed");
                return Err(SelectionError::Load { level, id, source });
            }
        };
        if entity.level() != level || entity.id() != id {
            return Err(SelectionError::Mismatch {
                level,
                id,
                got_level: entity.level(),
                got_id: entity.id(),
            });
        }

        if self.selected_id(level) != Some(id) {
            self.clear_descendants(level);
        }
        self.levels[level.index()] = SelectionState {
            selected_id: Some(id),
            selected_entity: Some(entity),
        };
        info!(level = %level, id, "selection set");
        Ok(())
    }

    /// Clear every level. Idempotent.
    pub fn clear_all_filters(&mut self) {
        for state in self.levels.iter_mut() {
            state.clear();
        }
        info!("all selections cleared");
    }

    /// Selected ids as list-request scope (`mtk_id`, `complex_id`, ...).
    pub fn scope_params(&self) -> QueryParams {
        let mut params = QueryParams::new();
        for level in HierarchyLevel::all() {
            params.insert_opt(level.param_name(), self.selected_id(*level));
        }
        params
    }

    /// Selected ids, root first.
    pub fn selected_ids(&self) -> Vec<(HierarchyLevel, EntityId)> {
        HierarchyLevel::all()
            .iter()
            .filter_map(|level| self.selected_id(*level).map(|id| (*level, id)))
            .collect()
    }

    /// Replace the selection by replaying `ids` root first.
    ///
    /// Stops at the first level that fails to load; levels restored before
    /// it stay selected. Returns how many levels were restored.
    pub async fn restore(
        &mut self,
        ids: &[(HierarchyLevel, EntityId)],
    ) -> Result<usize, SelectionError> {
        self.clear_all_filters();
        let mut ordered = ids.to_vec();
        ordered.sort_by_key(|(level, _)| level.index());
        let mut restored = 0;
        for (level, id) in ordered {
            self.set_filter(level, Some(id)).await?;
            restored += 1;
        }
        Ok(restored)
    }

    fn clear_from(&mut self, level: HierarchyLevel) {
        self.levels[level.index()].clear();
        self.clear_descendants(level);
    }

    fn clear_descendants(&mut self, level: HierarchyLevel) {
        for below in level.descendants() {
            self.levels[below.index()].clear();
        }
    }
}
