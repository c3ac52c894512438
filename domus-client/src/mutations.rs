//! Create, update and delete calls that keep the query cache consistent.

use crate::api_client::{entity_path, ApiClientError, RestClient};
use crate::resources::{DomusQueryClient, ResourceKind};
use domus_core::EntityId;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::info;

#[derive(Clone)]
pub struct Mutations {
    rest: RestClient,
    query: DomusQueryClient,
}

impl Mutations {
    pub fn new(rest: RestClient, query: DomusQueryClient) -> Self {
        Self { rest, query }
    }

    /// POST a new entity. Every cached page of `kind` is invalidated.
    pub async fn create<T, B>(&self, kind: ResourceKind, body: &B) -> Result<T, ApiClientError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let created = self.rest.post(kind.path(), body).await?;
        self.invalidate(kind, "create");
        Ok(created)
    }

    /// PUT a full replacement of entity `id`.
    pub async fn replace<T, B>(
        &self,
        kind: ResourceKind,
        id: EntityId,
        body: &B,
    ) -> Result<T, ApiClientError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let updated = self.rest.put(&entity_path(kind.path(), id), body).await?;
        self.invalidate(kind, "replace");
        Ok(updated)
    }

    /// PATCH the given fields of entity `id`.
    pub async fn update<T, B>(
        &self,
        kind: ResourceKind,
        id: EntityId,
        body: &B,
    ) -> Result<T, ApiClientError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let updated = self.rest.patch(&entity_path(kind.path(), id), body).await?;
        self.invalidate(kind, "update");
        Ok(updated)
    }

    /// DELETE entity `id` and drop it from every cached page of `kind`
    /// without refetching. Returns how many cached pages were rewritten.
    pub async fn delete(&self, kind: ResourceKind, id: EntityId) -> Result<usize, ApiClientError> {
        self.rest.delete(&entity_path(kind.path(), id)).await?;
        let pages = self
            .query
            .mutate_resource(kind, |data| data.without_id(id));
        info!(resource = %kind, id, pages, "entity deleted");
        Ok(pages)
    }

    fn invalidate(&self, kind: ResourceKind, op: &'static str) {
        let keys = self.query.invalidate_resource(kind);
        info!(resource = %kind, op, keys, "cache invalidated after mutation");
    }
}
