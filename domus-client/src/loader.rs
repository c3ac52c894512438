//! Full-entity loads for the selection controller.

use crate::api_client::RestClient;
use crate::resources::ResourceKind;
use async_trait::async_trait;
use domus_core::{EntityId, FetchError, HierarchyEntity, HierarchyLevel};
use domus_query::EntityLoader;

#[async_trait]
impl EntityLoader for RestClient {
    async fn load(
        &self,
        level: HierarchyLevel,
        id: EntityId,
    ) -> Result<HierarchyEntity, FetchError> {
        let collection = ResourceKind::for_level(level).path();
        let entity = match level {
            HierarchyLevel::Mtk => HierarchyEntity::Mtk(self.get_entity(collection, id).await?),
            HierarchyLevel::Complex => {
                HierarchyEntity::Complex(self.get_entity(collection, id).await?)
            }
            HierarchyLevel::Building => {
                HierarchyEntity::Building(self.get_entity(collection, id).await?)
            }
            HierarchyLevel::Block => HierarchyEntity::Block(self.get_entity(collection, id).await?),
            HierarchyLevel::Property => {
                HierarchyEntity::Property(self.get_entity(collection, id).await?)
            }
        };
        Ok(entity)
    }
}
