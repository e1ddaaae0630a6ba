use modstate_config::shared::BatchConfig;
use tracing::{info, warn};

use crate::batch::{BatchContext, ChunkOutcome, Reconciler, effective_limit, on_finished};
use crate::concurrency::shutdown::{ShutdownRx, is_shutdown_requested};
use crate::error::ModstateResult;
use crate::store::checkpoint::CheckpointStore;
use crate::store::entity::EntityStore;
use crate::store::moderation::ModerationStateStore;
use crate::types::EntityId;
use crate::workflow::WorkflowResolver;

/// Selection, chunk size and write mode of one batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchParams {
    pub batch_size: usize,
    pub start_id: EntityId,
    /// Maximum number of ids to select. `None` and `Some(0)` both select every id.
    pub limit: Option<u64>,
    /// Whether the reconciler writes through a [`crate::store::moderation::DryRunStore`].
    ///
    /// Recorded in the checkpoint so that a dry run is never resumed as a real run.
    pub dry_run: bool,
}

impl From<&BatchConfig> for BatchParams {
    fn from(config: &BatchConfig) -> Self {
        Self {
            batch_size: config.size,
            start_id: EntityId::new(config.start_id),
            limit: effective_limit(config.limit),
            dry_run: config.dry_run,
        }
    }
}

/// What [`run_batch`] did.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchSummary {
    /// Number of selected entities.
    pub total: usize,
    /// Number of entities attempted, including the ones of a resumed checkpoint.
    pub processed: usize,
    /// Number of entities reconciled successfully.
    pub succeeded: usize,
    /// Number of chunks run by this call.
    pub chunks: usize,
    /// Whether a shutdown stopped the batch before it finished.
    pub interrupted: bool,
    /// Final message when the batch finished, last progress message otherwise.
    pub message: Option<String>,
}

impl BatchSummary {
    fn from_context(context: &BatchContext, chunks: usize, interrupted: bool) -> Self {
        let (total, processed) = context
            .cursor
            .as_ref()
            .map(|cursor| (cursor.total(), cursor.progress()))
            .unwrap_or((0, 0));

        Self {
            total,
            processed,
            succeeded: context.results.len(),
            chunks,
            interrupted,
            message: context.message.clone(),
        }
    }

    /// Number of attempted entities that were not reconciled.
    pub fn failed(&self) -> usize {
        self.processed.saturating_sub(self.succeeded)
    }
}

/// Restores the checkpointed context when it belongs to the same selection and write mode.
async fn restore_context<C>(checkpoints: &C, params: &BatchParams) -> ModstateResult<BatchContext>
where
    C: CheckpointStore,
{
    let fresh = BatchContext {
        dry_run: params.dry_run,
        ..BatchContext::default()
    };
    let limit = effective_limit(params.limit);

    match checkpoints.load().await? {
        Some(context) if context.can_resume(params.start_id, limit, params.dry_run) => {
            let progress = context.cursor.as_ref().map(|cursor| cursor.progress());
            info!(?progress, "resuming batch from checkpoint");

            Ok(context)
        }
        Some(context) => {
            warn!(
                start_id = %params.start_id,
                limit = ?limit,
                dry_run = params.dry_run,
                checkpoint_dry_run = context.dry_run,
                "checkpoint belongs to a different selection or write mode, starting a new batch"
            );
            checkpoints.clear().await?;

            Ok(fresh)
        }
        None => Ok(fresh),
    }
}

/// Runs chunks until the batch is finished or a shutdown is requested.
///
/// The context is checkpointed after every chunk and cleared once the batch finished, so a run
/// stopped by a shutdown or a crash continues where it stopped on the next call with the same
/// selection. Shutdown requests are only checked between chunks.
///
/// Returns an error when selecting the entities or persisting the checkpoint fails, failures of
/// single entities are only logged.
pub async fn run_batch<E, W, S, C>(
    reconciler: &Reconciler<E, W, S>,
    checkpoints: &C,
    params: BatchParams,
    shutdown_rx: ShutdownRx,
) -> ModstateResult<BatchSummary>
where
    E: EntityStore,
    W: WorkflowResolver,
    S: ModerationStateStore,
    C: CheckpointStore,
{
    let mut context = restore_context(checkpoints, &params).await?;
    let mut chunks = 0;

    while !context.is_finished() {
        if is_shutdown_requested(&shutdown_rx) {
            info!(
                progress = ?context.cursor.as_ref().map(|cursor| cursor.progress()),
                "shutdown requested, stopping the batch at the current checkpoint"
            );

            return Ok(BatchSummary::from_context(&context, chunks, true));
        }

        let outcome = match reconciler
            .reconcile_chunk(params.batch_size, params.start_id, params.limit, &mut context)
            .await
        {
            Ok(outcome) => outcome,
            Err(err) => {
                on_finished(false, &context.results);
                return Err(err);
            }
        };

        if let ChunkOutcome::Processed(report) = outcome {
            chunks += 1;
            if let Some(message) = &context.message {
                info!(failed = report.failed.len(), "{message}");
            }
        }

        checkpoints.store(&context).await?;
    }

    checkpoints.clear().await?;

    let mut summary = BatchSummary::from_context(&context, chunks, false);
    summary.message = Some(on_finished(true, &context.results));

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::BatchCursor;
    use crate::concurrency::shutdown::{ShutdownTx, create_shutdown_channel};
    use crate::error::ErrorKind;
    use crate::store::both::memory::MemoryStore;
    use crate::store::checkpoint::MemoryCheckpointStore;
    use crate::store::moderation::DryRunStore;
    use crate::test_utils::entity::{node, workflow};
    use crate::test_utils::faults::{FaultyStore, StoreFault};
    use crate::workflow::ConfiguredWorkflows;

    fn editorial() -> ConfiguredWorkflows {
        ConfiguredWorkflows::new(vec![workflow("editorial", None, &["article"])])
    }

    async fn store_with_nodes(ids: impl IntoIterator<Item = u64>) -> MemoryStore {
        let store = MemoryStore::new();
        for id in ids {
            store.insert_entity(node(id).build()).await;
        }
        store
    }

    fn params(batch_size: usize, start_id: u64) -> BatchParams {
        BatchParams {
            batch_size,
            start_id: EntityId::new(start_id),
            limit: None,
            dry_run: false,
        }
    }

    /// Checkpoint store requesting a shutdown after the first stored chunk.
    struct ShutdownAfterFirstChunk {
        inner: MemoryCheckpointStore,
        tx: ShutdownTx,
    }

    impl CheckpointStore for ShutdownAfterFirstChunk {
        async fn load(&self) -> ModstateResult<Option<BatchContext>> {
            self.inner.load().await
        }

        async fn store(&self, context: &BatchContext) -> ModstateResult<()> {
            self.inner.store(context).await?;
            let _ = self.tx.shutdown();
            Ok(())
        }

        async fn clear(&self) -> ModstateResult<()> {
            self.inner.clear().await
        }
    }

    #[tokio::test]
    async fn runs_every_chunk_and_clears_the_checkpoint() {
        let store = store_with_nodes(10..=14).await;
        let reconciler = Reconciler::new(store.clone(), editorial(), store.clone());
        let checkpoints = MemoryCheckpointStore::new();
        let (_tx, rx) = create_shutdown_channel();

        let summary = run_batch(&reconciler, &checkpoints, params(2, 10), rx)
            .await
            .unwrap();

        assert_eq!(summary.total, 5);
        assert_eq!(summary.processed, 5);
        assert_eq!(summary.succeeded, 5);
        assert_eq!(summary.chunks, 3);
        assert!(!summary.interrupted);
        assert_eq!(summary.message.as_deref(), Some("5 entities processed."));
        assert!(checkpoints.load().await.unwrap().is_none());
        assert_eq!(store.state_records().await.len(), 5);
    }

    #[tokio::test]
    async fn empty_selection_finishes_without_chunks() {
        let store = store_with_nodes([1, 2]).await;
        let reconciler = Reconciler::new(store.clone(), editorial(), store.clone());
        let (_tx, rx) = create_shutdown_channel();

        let summary = run_batch(&reconciler, &MemoryCheckpointStore::new(), params(2, 100), rx)
            .await
            .unwrap();

        assert_eq!(summary.chunks, 0);
        assert_eq!(summary.total, 0);
        assert_eq!(summary.message.as_deref(), Some("0 entities processed."));
    }

    #[tokio::test]
    async fn shutdown_keeps_the_checkpoint_for_the_next_run() {
        let store = store_with_nodes(1..=5).await;
        let reconciler = Reconciler::new(store.clone(), editorial(), store.clone());
        let (tx, rx) = create_shutdown_channel();
        let checkpoints = ShutdownAfterFirstChunk {
            inner: MemoryCheckpointStore::new(),
            tx,
        };

        let summary = run_batch(&reconciler, &checkpoints, params(2, 0), rx)
            .await
            .unwrap();

        assert!(summary.interrupted);
        assert_eq!(summary.chunks, 1);
        assert_eq!(summary.processed, 2);
        assert_eq!(
            summary.message.as_deref(),
            Some("Processed 2 of 5 entities.")
        );

        let checkpoint = checkpoints.inner.load().await.unwrap().unwrap();
        assert_eq!(checkpoint.results, [1, 2].map(EntityId::new));

        let (_tx, rx) = create_shutdown_channel();
        let summary = run_batch(&reconciler, &checkpoints.inner, params(2, 0), rx)
            .await
            .unwrap();

        assert!(!summary.interrupted);
        assert_eq!(summary.chunks, 2);
        assert_eq!(summary.processed, 5);
        assert_eq!(summary.succeeded, 5);
        assert_eq!(store.state_records().await.len(), 5);
        assert!(checkpoints.inner.load().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn checkpoint_of_another_selection_is_discarded() {
        let store = store_with_nodes(1..=3).await;
        let reconciler = Reconciler::new(store.clone(), editorial(), store.clone());
        let checkpoints = MemoryCheckpointStore::new();

        let stale = BatchContext {
            cursor: Some(BatchCursor::new(
                EntityId::new(100),
                None,
                vec![EntityId::new(100)],
            )),
            ..BatchContext::default()
        };
        checkpoints.store(&stale).await.unwrap();

        let (_tx, rx) = create_shutdown_channel();
        let summary = run_batch(&reconciler, &checkpoints, params(10, 1), rx)
            .await
            .unwrap();

        assert_eq!(summary.total, 3);
        assert_eq!(summary.succeeded, 3);
    }

    #[tokio::test]
    async fn interrupted_dry_run_is_not_resumed_by_a_real_run() {
        let store = store_with_nodes(1..=4).await;
        let dry_reconciler =
            Reconciler::new(store.clone(), editorial(), DryRunStore::wrap(store.clone()));
        let (tx, rx) = create_shutdown_channel();
        let checkpoints = ShutdownAfterFirstChunk {
            inner: MemoryCheckpointStore::new(),
            tx,
        };
        let dry_params = BatchParams {
            dry_run: true,
            ..params(2, 1)
        };

        let summary = run_batch(&dry_reconciler, &checkpoints, dry_params, rx)
            .await
            .unwrap();
        assert!(summary.interrupted);
        assert_eq!(summary.processed, 2);
        assert!(store.state_records().await.is_empty());
        assert!(checkpoints.inner.load().await.unwrap().unwrap().dry_run);

        let reconciler = Reconciler::new(store.clone(), editorial(), store.clone());
        let (_tx, rx) = create_shutdown_channel();
        let summary = run_batch(&reconciler, &checkpoints.inner, params(2, 1), rx)
            .await
            .unwrap();

        assert!(!summary.interrupted);
        assert_eq!(summary.total, 4);
        assert_eq!(summary.succeeded, 4);
        assert_eq!(summary.chunks, 2);
        assert_eq!(store.state_records().await.len(), 4);
        assert!(checkpoints.inner.load().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn zero_limit_resumes_a_checkpoint_without_limit() {
        let store = store_with_nodes(1..=5).await;
        let reconciler = Reconciler::new(store.clone(), editorial(), store.clone());
        let (tx, rx) = create_shutdown_channel();
        let checkpoints = ShutdownAfterFirstChunk {
            inner: MemoryCheckpointStore::new(),
            tx,
        };
        let zero_limit = BatchParams {
            limit: Some(0),
            ..params(2, 1)
        };

        let summary = run_batch(&reconciler, &checkpoints, zero_limit, rx)
            .await
            .unwrap();
        assert!(summary.interrupted);
        assert_eq!(summary.total, 5);

        let (_tx, rx) = create_shutdown_channel();
        let summary = run_batch(&reconciler, &checkpoints.inner, params(2, 1), rx)
            .await
            .unwrap();

        assert_eq!(summary.chunks, 2);
        assert_eq!(summary.succeeded, 5);
    }

    #[tokio::test]
    async fn failed_entities_are_reported_in_the_summary() {
        let store = store_with_nodes(1..=3).await;
        store.insert_entity(node(4).bundle("page").build()).await;
        let reconciler = Reconciler::new(store.clone(), editorial(), store.clone());
        let (_tx, rx) = create_shutdown_channel();

        let summary = run_batch(&reconciler, &MemoryCheckpointStore::new(), params(3, 0), rx)
            .await
            .unwrap();

        assert_eq!(summary.processed, 4);
        assert_eq!(summary.failed(), 1);
        assert_eq!(summary.message.as_deref(), Some("3 entities processed."));
    }

    #[tokio::test]
    async fn selection_failure_aborts_the_batch() {
        let store = store_with_nodes(1..=3).await;
        let faulty = FaultyStore::wrap(store.clone());
        faulty.inject(StoreFault::ListIds).await;
        let reconciler = Reconciler::new(faulty, editorial(), store);
        let checkpoints = MemoryCheckpointStore::new();
        let (_tx, rx) = create_shutdown_channel();

        let err = run_batch(&reconciler, &checkpoints, params(3, 0), rx)
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::SourceQueryFailed);
        assert!(checkpoints.load().await.unwrap().is_none());
    }

    #[test]
    fn params_follow_the_batch_config() {
        let config = BatchConfig {
            size: 25,
            start_id: 7,
            limit: Some(100),
            dry_run: true,
        };

        assert_eq!(
            BatchParams::from(&config),
            BatchParams {
                batch_size: 25,
                start_id: EntityId::new(7),
                limit: Some(100),
                dry_run: true,
            }
        );
    }

    #[test]
    fn zero_limit_in_the_config_selects_every_id() {
        let config = BatchConfig {
            size: 25,
            start_id: 0,
            limit: Some(0),
            dry_run: false,
        };

        assert_eq!(BatchParams::from(&config).limit, None);
    }
}
