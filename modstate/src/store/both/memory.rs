use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::error::{ErrorKind, ModstateResult};
use crate::store::entity::EntityStore;
use crate::store::moderation::ModerationStateStore;
use crate::types::{
    ContentEntity, EntityId, ModerationStateRecord, RecordId, RecordKey, SaveOutcome,
};
use crate::{bail, modstate_error};

#[derive(Debug, Default)]
struct Inner {
    entities: BTreeMap<EntityId, ContentEntity>,
    records: BTreeMap<RecordId, ModerationStateRecord>,
    last_record_id: u64,
}

impl Inner {
    fn next_record_id(&mut self) -> RecordId {
        self.last_record_id += 1;
        RecordId::new(self.last_record_id)
    }

    fn find(&self, key: &RecordKey) -> Option<&ModerationStateRecord> {
        // Records are keyed by id, so the first match is the one with the lowest id.
        self.records.values().find(|record| &record.key() == key)
    }
}

/// In-memory store for content entities and moderation state records.
///
/// Useful for tests and for rehearsing a rebuild over a known set of entities. Inserting a record
/// whose key already exists fails like the unique index of the Postgres store does.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a content entity.
    pub async fn insert_entity(&self, entity: ContentEntity) {
        let mut inner = self.inner.lock().await;
        inner.entities.insert(entity.id, entity);
    }

    /// Removes a content entity, returning it if it existed.
    pub async fn remove_entity(&self, id: EntityId) -> Option<ContentEntity> {
        let mut inner = self.inner.lock().await;
        inner.entities.remove(&id)
    }

    /// Stores `record` as is under a fresh id, without checking for an existing record with the
    /// same key. Used to seed pre-existing and duplicated data.
    pub async fn seed_record(&self, mut record: ModerationStateRecord) -> RecordId {
        let mut inner = self.inner.lock().await;
        let id = inner.next_record_id();
        record.id = Some(id);
        inner.records.insert(id, record);

        id
    }

    /// Returns all moderation state records ordered by id.
    pub async fn state_records(&self) -> Vec<ModerationStateRecord> {
        let inner = self.inner.lock().await;
        inner.records.values().cloned().collect()
    }

    pub async fn state_record(&self, id: RecordId) -> Option<ModerationStateRecord> {
        let inner = self.inner.lock().await;
        inner.records.get(&id).cloned()
    }
}

impl EntityStore for MemoryStore {
    async fn list_ids(&self, start_id: EntityId, limit: Option<u64>) -> ModstateResult<Vec<EntityId>> {
        let inner = self.inner.lock().await;

        let ids = inner.entities.range(start_id..).map(|(id, _)| *id);
        let ids = match limit {
            Some(limit) => ids.take(usize::try_from(limit).unwrap_or(usize::MAX)).collect(),
            None => ids.collect(),
        };

        Ok(ids)
    }

    async fn load_entities(
        &self,
        ids: &[EntityId],
    ) -> ModstateResult<BTreeMap<EntityId, ContentEntity>> {
        let inner = self.inner.lock().await;

        Ok(ids
            .iter()
            .filter_map(|id| inner.entities.get(id).map(|entity| (*id, entity.clone())))
            .collect())
    }
}

impl ModerationStateStore for MemoryStore {
    async fn find_state_record(
        &self,
        key: &RecordKey,
    ) -> ModstateResult<Option<ModerationStateRecord>> {
        let inner = self.inner.lock().await;

        Ok(inner.find(key).cloned())
    }

    async fn save_record(&self, record: &mut ModerationStateRecord) -> ModstateResult<SaveOutcome> {
        let mut inner = self.inner.lock().await;

        match record.id {
            None => {
                if let Some(existing) = inner.find(&record.key()) {
                    bail!(
                        ErrorKind::DuplicateStateRecord,
                        "A moderation state record already exists for this key",
                        format!(
                            "record {:?} already tracks {} {} revision {}",
                            existing.id,
                            record.content_entity_type_id,
                            record.content_entity_id,
                            record.content_entity_revision_id
                        )
                    );
                }

                let id = inner.next_record_id();
                record.id = Some(id);
                inner.records.insert(id, record.clone());

                Ok(SaveOutcome::Created)
            }
            Some(id) => {
                let Some(stored) = inner.records.get_mut(&id) else {
                    return Err(modstate_error!(
                        ErrorKind::InvalidState,
                        "Moderation state record to update does not exist",
                        format!("record {id}")
                    ));
                };
                *stored = record.clone();

                Ok(SaveOutcome::Updated)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::entity::{node, record_for};

    async fn store_with_ids(ids: &[u64]) -> MemoryStore {
        let store = MemoryStore::new();
        for id in ids {
            store.insert_entity(node(*id).build()).await;
        }
        store
    }

    #[tokio::test]
    async fn lists_ids_from_start_in_ascending_order() {
        let store = store_with_ids(&[14, 10, 3, 12, 11, 13]).await;

        let ids = store.list_ids(EntityId::new(10), None).await.unwrap();
        assert_eq!(ids, [10, 11, 12, 13, 14].map(EntityId::new));

        let ids = store.list_ids(EntityId::new(11), Some(2)).await.unwrap();
        assert_eq!(ids, [11, 12].map(EntityId::new));

        let ids = store.list_ids(EntityId::new(100), None).await.unwrap();
        assert!(ids.is_empty());
    }

    #[tokio::test]
    async fn load_skips_missing_entities() {
        let store = store_with_ids(&[1, 2]).await;

        let entities = store
            .load_entities(&[EntityId::new(1), EntityId::new(5)])
            .await
            .unwrap();

        assert_eq!(entities.len(), 1);
        assert!(entities.contains_key(&EntityId::new(1)));
    }

    #[tokio::test]
    async fn insert_then_update_keeps_the_id() {
        let store = MemoryStore::new();
        let mut record = record_for(&node(1).build(), "editorial", "draft");

        assert_eq!(
            store.save_record(&mut record).await.unwrap(),
            SaveOutcome::Created
        );
        let id = record.id.unwrap();

        record.moderation_state = "published".to_string();
        assert_eq!(
            store.save_record(&mut record).await.unwrap(),
            SaveOutcome::Updated
        );

        let stored = store.state_record(id).await.unwrap();
        assert_eq!(stored.moderation_state, "published");
        assert_eq!(store.state_records().await.len(), 1);
    }

    #[tokio::test]
    async fn inserting_a_duplicate_key_fails() {
        let store = MemoryStore::new();
        let entity = node(1).build();
        let mut first = record_for(&entity, "editorial", "draft");
        store.save_record(&mut first).await.unwrap();

        let mut second = record_for(&entity, "editorial", "published");
        let err = store.save_record(&mut second).await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::DuplicateStateRecord);
        assert!(second.id.is_none());
    }

    #[tokio::test]
    async fn find_returns_the_lowest_id_among_duplicates() {
        let store = MemoryStore::new();
        let entity = node(1).build();
        let first = store
            .seed_record(record_for(&entity, "editorial", "draft"))
            .await;
        store
            .seed_record(record_for(&entity, "editorial", "archived"))
            .await;

        let key = RecordKey::for_entity(&entity, "editorial");
        let found = store.find_state_record(&key).await.unwrap().unwrap();

        assert_eq!(found.id, Some(first));
        assert_eq!(found.moderation_state, "draft");
    }

    #[tokio::test]
    async fn updating_an_unknown_record_fails() {
        let store = MemoryStore::new();
        let mut record = record_for(&node(1).build(), "editorial", "draft");
        record.id = Some(RecordId::new(99));

        let err = store.save_record(&mut record).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidState);
    }
}
