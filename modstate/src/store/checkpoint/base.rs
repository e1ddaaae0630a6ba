use std::future::Future;

use crate::batch::BatchContext;
use crate::error::ModstateResult;

/// Persistence of the [`BatchContext`] between chunks.
///
/// A stored context lets a later process continue the batch where the previous one stopped.
pub trait CheckpointStore {
    /// Returns the last stored context, if any.
    fn load(&self) -> impl Future<Output = ModstateResult<Option<BatchContext>>> + Send;

    /// Replaces the stored context with `context`.
    fn store(&self, context: &BatchContext) -> impl Future<Output = ModstateResult<()>> + Send;

    /// Removes the stored context. Clearing an empty store is not an error.
    fn clear(&self) -> impl Future<Output = ModstateResult<()>> + Send;
}
