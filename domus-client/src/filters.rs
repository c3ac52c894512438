//! List filters: pagination, search and the hierarchy scope.

use crate::resources::ResourceKind;
use domus_core::{Pagination, QueryParams};

/// Filter state of one list view.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListFilter {
    pub pagination: Pagination,
    pub search: Option<String>,
    /// Extra resource-specific filters (`kind`, `is_owner`, ...).
    pub extra: QueryParams,
}

impl ListFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(mut self, pagination: Pagination) -> Self {
        self.pagination = pagination;
        self
    }

    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        let search = search.into();
        self.search = if search.trim().is_empty() {
            None
        } else {
            Some(search.trim().to_string())
        };
        self
    }

    pub fn with_extra(mut self, extra: QueryParams) -> Self {
        self.extra = extra;
        self
    }

    /// Request parameters for `kind`.
    ///
    /// Only the scope entries for levels above `kind` are kept, so a
    /// selected complex narrows the building list but not the complex list
    /// itself. Scope entries win over `extra` entries of the same name.
    pub fn params(&self, kind: ResourceKind, scope: &QueryParams) -> QueryParams {
        let mut params = self.extra.clone();
        if let Some(search) = &self.search {
            params.insert("search", search.clone());
        }
        self.pagination.apply(&mut params);
        for level in kind.scope_levels() {
            if let Some(value) = scope.get(level.param_name()) {
                params.insert(level.param_name(), value.clone());
            }
        }
        params
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domus_query::build_key;
    use domus_query::ResourceKey;
    use serde_json::json;

    fn scope() -> QueryParams {
        QueryParams::new()
            .with("mtk_id", 1)
            .with("complex_id", 2)
            .with("building_id", 3)
    }

    #[test]
    fn test_scope_is_limited_to_ancestors() {
        let params = ListFilter::new().params(ResourceKind::ComplexList, &scope());
        assert_eq!(params.get("mtk_id"), Some(&json!(1)));
        assert!(params.get("complex_id").is_none());

        let params = ListFilter::new().params(ResourceKind::MtkList, &scope());
        assert!(params.get("mtk_id").is_none());
        assert_eq!(params.get("page"), Some(&json!(1)));
    }

    #[test]
    fn test_blank_search_is_dropped() {
        let filter = ListFilter::new().with_search("   ");
        assert_eq!(filter.search, None);
        let filter = ListFilter::new().with_search(" north ");
        assert_eq!(filter.search.as_deref(), Some("north"));
    }

    #[test]
    fn test_selection_changes_key() {
        let filter = ListFilter::new();
        let kind = ResourceKind::BuildingList;
        let a = build_key(kind.as_str(), &filter.params(kind, &scope()));
        let b = build_key(
            kind.as_str(),
            &filter.params(kind, &QueryParams::new().with("mtk_id", 1).with("complex_id", 9)),
        );
        assert_ne!(a, b);
    }
}
