//! Query parameters for list requests.

use crate::error::ValidationError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Query parameters of a list request.
///
/// Keys are kept sorted, so two parameter sets built in different orders
/// compare and serialize identically.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QueryParams(BTreeMap<String, Value>);

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(key.into(), value.into());
    }

    /// Insert `value` when present, remove the key otherwise.
    pub fn insert_opt<V: Into<Value>>(&mut self, key: impl Into<String>, value: Option<V>) {
        let key = key.into();
        match value {
            Some(v) => {
                self.0.insert(key, v.into());
            }
            None => {
                self.0.remove(&key);
            }
        }
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.0.remove(key)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    /// Merge `other` into `self`; values from `other` win.
    pub fn extend(&mut self, other: QueryParams) {
        self.0.extend(other.0);
    }

    /// Parameters with null and empty-string values dropped.
    pub fn canonical(&self) -> BTreeMap<String, Value> {
        self.0
            .iter()
            .filter(|(_, value)| !is_blank(value))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// Flatten into `(key, value)` pairs for a URL query string.
    ///
    /// Arrays become comma-separated lists; blank values are skipped.
    pub fn to_query_pairs(&self) -> Vec<(String, String)> {
        self.canonical()
            .into_iter()
            .map(|(key, value)| {
                let rendered = match value {
                    Value::Array(items) => items
                        .iter()
                        .map(render_scalar)
                        .collect::<Vec<_>>()
                        .join(","),
                    other => render_scalar(&other),
                };
                (key, rendered)
            })
            .collect()
    }
}

impl FromIterator<(String, Value)> for QueryParams {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}

fn render_scalar(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Page selection for list endpoints. Pages are 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    pub page: u32,
    pub page_size: u32,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: 20,
        }
    }
}

impl Pagination {
    pub fn new(page: u32, page_size: u32) -> Result<Self, ValidationError> {
        if page == 0 {
            return Err(ValidationError::InvalidValue {
                field: "page".to_string(),
                reason: "pages start at 1".to_string(),
            });
        }
        if page_size == 0 {
            return Err(ValidationError::InvalidValue {
                field: "page_size".to_string(),
                reason: "must be > 0".to_string(),
            });
        }
        Ok(Self { page, page_size })
    }

    pub fn next(&self) -> Self {
        Self {
            page: self.page.saturating_add(1),
            ..*self
        }
    }

    pub fn previous(&self) -> Self {
        Self {
            page: self.page.saturating_sub(1).max(1),
            ..*self
        }
    }

    pub fn apply(&self, params: &mut QueryParams) {
        params.insert("page", self.page);
        params.insert("page_size", self.page_size);
    }
}
