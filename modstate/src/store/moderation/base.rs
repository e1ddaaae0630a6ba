use std::future::Future;

use crate::error::ModstateResult;
use crate::types::{ModerationStateRecord, RecordKey, SaveOutcome};

/// Storage of moderation state records.
///
/// Implementations are not required to make a lookup followed by a save atomic. Writers running
/// concurrently with the rebuild can race past the lookup, the Postgres store rejects the
/// resulting duplicate through its unique index.
pub trait ModerationStateStore {
    /// Returns the record matching `key` exactly.
    ///
    /// If several records match, the one with the lowest id is returned.
    fn find_state_record(
        &self,
        key: &RecordKey,
    ) -> impl Future<Output = ModstateResult<Option<ModerationStateRecord>>> + Send;

    /// Inserts `record` when it has no id yet, assigning the new id, otherwise updates it in
    /// place.
    fn save_record(
        &self,
        record: &mut ModerationStateRecord,
    ) -> impl Future<Output = ModstateResult<SaveOutcome>> + Send;
}
