use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::bail;
use crate::error::{ErrorKind, ModstateResult};
use crate::store::entity::EntityStore;
use crate::store::moderation::ModerationStateStore;
use crate::types::{ContentEntity, EntityId, ModerationStateRecord, RecordKey, SaveOutcome};

/// A failure that [`FaultyStore`] can be told to produce.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreFault {
    /// Selecting ids fails.
    ListIds,
    /// Loading any chunk of entities fails.
    LoadEntities,
    /// Looking up the record of the given entity fails.
    FindStateRecord(EntityId),
    /// Saving the record of the given entity fails.
    SaveRecord(EntityId),
}

/// Store wrapper failing the operations matching the injected [`StoreFault`]s and delegating
/// everything else to the wrapped store.
#[derive(Debug, Clone)]
pub struct FaultyStore<S> {
    inner: S,
    faults: Arc<Mutex<Vec<StoreFault>>>,
}

impl<S> FaultyStore<S> {
    pub fn wrap(inner: S) -> Self {
        Self {
            inner,
            faults: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub async fn inject(&self, fault: StoreFault) {
        self.faults.lock().await.push(fault);
    }

    /// Removes every injected fault.
    pub async fn clear(&self) {
        self.faults.lock().await.clear();
    }

    async fn has_fault(&self, fault: &StoreFault) -> bool {
        self.faults.lock().await.contains(fault)
    }
}

impl<S> EntityStore for FaultyStore<S>
where
    S: EntityStore + Sync,
{
    async fn list_ids(&self, start_id: EntityId, limit: Option<u64>) -> ModstateResult<Vec<EntityId>> {
        if self.has_fault(&StoreFault::ListIds).await {
            bail!(ErrorKind::SourceQueryFailed, "Injected id selection failure");
        }

        self.inner.list_ids(start_id, limit).await
    }

    async fn load_entities(
        &self,
        ids: &[EntityId],
    ) -> ModstateResult<BTreeMap<EntityId, ContentEntity>> {
        if self.has_fault(&StoreFault::LoadEntities).await {
            bail!(
                ErrorKind::SourceQueryFailed,
                "Injected entity load failure",
                format!("{} ids requested", ids.len())
            );
        }

        self.inner.load_entities(ids).await
    }
}

impl<S> ModerationStateStore for FaultyStore<S>
where
    S: ModerationStateStore + Sync,
{
    async fn find_state_record(
        &self,
        key: &RecordKey,
    ) -> ModstateResult<Option<ModerationStateRecord>> {
        if self
            .has_fault(&StoreFault::FindStateRecord(key.entity_id))
            .await
        {
            bail!(
                ErrorKind::SourceQueryFailed,
                "Injected record lookup failure",
                format!("entity {}", key.entity_id)
            );
        }

        self.inner.find_state_record(key).await
    }

    async fn save_record(&self, record: &mut ModerationStateRecord) -> ModstateResult<SaveOutcome> {
        if self
            .has_fault(&StoreFault::SaveRecord(record.content_entity_id))
            .await
        {
            bail!(
                ErrorKind::SourceQueryFailed,
                "Injected record save failure",
                format!("entity {}", record.content_entity_id)
            );
        }

        self.inner.save_record(record).await
    }
}
