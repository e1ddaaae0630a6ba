use std::sync::Arc;
use tokio::sync::Mutex;

use crate::batch::BatchContext;
use crate::error::ModstateResult;
use crate::store::checkpoint::CheckpointStore;

/// Keeps the batch context in memory, for runs that do not need to survive the process.
#[derive(Debug, Clone, Default)]
pub struct MemoryCheckpointStore {
    context: Arc<Mutex<Option<BatchContext>>>,
}

impl MemoryCheckpointStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CheckpointStore for MemoryCheckpointStore {
    async fn load(&self) -> ModstateResult<Option<BatchContext>> {
        Ok(self.context.lock().await.clone())
    }

    async fn store(&self, context: &BatchContext) -> ModstateResult<()> {
        *self.context.lock().await = Some(context.clone());
        Ok(())
    }

    async fn clear(&self) -> ModstateResult<()> {
        self.context.lock().await.take();
        Ok(())
    }
}
