use tracing::debug;

use crate::error::ModstateResult;
use crate::store::moderation::ModerationStateStore;
use crate::types::{ModerationStateRecord, RecordKey, SaveOutcome};

/// A [`ModerationStateStore`] wrapper that never writes.
///
/// Lookups go to the wrapped store, saves report the outcome they would have had. New records
/// keep an empty id.
#[derive(Debug, Clone)]
pub struct DryRunStore<S> {
    inner: S,
}

impl<S> DryRunStore<S> {
    pub fn wrap(inner: S) -> Self {
        Self { inner }
    }

    pub fn into_inner(self) -> S {
        self.inner
    }
}

impl<S> ModerationStateStore for DryRunStore<S>
where
    S: ModerationStateStore + Sync,
{
    async fn find_state_record(
        &self,
        key: &RecordKey,
    ) -> ModstateResult<Option<ModerationStateRecord>> {
        self.inner.find_state_record(key).await
    }

    async fn save_record(&self, record: &mut ModerationStateRecord) -> ModstateResult<SaveOutcome> {
        let outcome = if record.is_new() {
            SaveOutcome::Created
        } else {
            SaveOutcome::Updated
        };

        debug!(
            entity_id = %record.content_entity_id,
            moderation_state = %record.moderation_state,
            %outcome,
            "dry run, moderation state record not written"
        );

        Ok(outcome)
    }
}
