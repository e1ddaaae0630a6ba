use std::collections::BTreeMap;
use std::future::Future;

use crate::error::ModstateResult;
use crate::types::{ContentEntity, EntityId};

/// Read access to the content entities whose moderation state is rebuilt.
pub trait EntityStore {
    /// Returns the ids of all entities with an id greater than or equal to `start_id`, in
    /// ascending order, truncated to `limit` ids when set.
    fn list_ids(
        &self,
        start_id: EntityId,
        limit: Option<u64>,
    ) -> impl Future<Output = ModstateResult<Vec<EntityId>>> + Send;

    /// Loads the entities with the given ids.
    ///
    /// Ids without an entity, for example because it was deleted after being listed, are absent
    /// from the returned map.
    fn load_entities(
        &self,
        ids: &[EntityId],
    ) -> impl Future<Output = ModstateResult<BTreeMap<EntityId, ContentEntity>>> + Send;
}
