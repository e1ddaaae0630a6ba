use modstate::batch::Reconciler;
use modstate::concurrency::shutdown::{ShutdownRx, ShutdownTx, create_shutdown_channel};
use modstate::runner::{BatchParams, BatchSummary, run_batch};
use modstate::store::both::postgres::PostgresStore;
use modstate::store::checkpoint::{CheckpointStore, FileCheckpointStore, MemoryCheckpointStore};
use modstate::store::moderation::DryRunStore;
use modstate::workflow::ConfiguredWorkflows;
use modstate_config::shared::{
    BatchConfig, CheckpointConfig, PgConnectionConfig, RebuildConfig, WorkflowConfig,
};
use tokio::signal::unix::{SignalKind, signal};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::migrations::migrate_moderation_store;

/// Runs the rebuild described by `rebuild_config` until it finishes or is interrupted.
///
/// Applies the migrations of the moderation state table, connects the Postgres store and drives
/// the batch with the configured checkpoint store. SIGINT and SIGTERM stop the batch after the
/// chunk in progress.
pub async fn start_rebuild_with_config(rebuild_config: RebuildConfig) -> anyhow::Result<()> {
    info!("starting moderation state rebuild");

    log_config(&rebuild_config);

    migrate_moderation_store(&rebuild_config.database).await?;
    let store = PostgresStore::connect(&rebuild_config.database).await?;
    let workflows = ConfiguredWorkflows::from_config(&rebuild_config.workflows);

    let (shutdown_tx, shutdown_rx) = create_shutdown_channel();
    let shutdown_handle = spawn_shutdown_listener(shutdown_tx);

    // Static dispatch over the checkpoint and dry run variants, each combination is its own
    // instantiation of the runner.
    let params = BatchParams::from(&rebuild_config.batch);
    let result = match &rebuild_config.checkpoint {
        CheckpointConfig::Memory => {
            let checkpoints = MemoryCheckpointStore::new();
            run(store, workflows, &checkpoints, params, shutdown_rx).await
        }
        CheckpointConfig::File { path } => {
            let checkpoints = FileCheckpointStore::new(path.clone());
            run(store, workflows, &checkpoints, params, shutdown_rx).await
        }
    };

    // The listener is only useful while the batch runs.
    shutdown_handle.abort();
    let _ = shutdown_handle.await;

    let summary = result?;
    log_summary(&summary);

    info!("moderation state rebuild completed");

    Ok(())
}

async fn run<C>(
    store: PostgresStore,
    workflows: ConfiguredWorkflows,
    checkpoints: &C,
    params: BatchParams,
    shutdown_rx: ShutdownRx,
) -> anyhow::Result<BatchSummary>
where
    C: CheckpointStore,
{
    let summary = if params.dry_run {
        warn!("dry run enabled, moderation state records will not be written");

        let reconciler = Reconciler::new(store.clone(), workflows, DryRunStore::wrap(store));
        run_batch(&reconciler, checkpoints, params, shutdown_rx).await?
    } else {
        let reconciler = Reconciler::new(store.clone(), workflows, store);
        run_batch(&reconciler, checkpoints, params, shutdown_rx).await?
    };

    Ok(summary)
}

/// Listens for SIGINT and SIGTERM and turns the first one received into a shutdown request.
fn spawn_shutdown_listener(shutdown_tx: ShutdownTx) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut sigterm = match signal(SignalKind::terminate()) {
            Ok(sigterm) => sigterm,
            Err(err) => {
                warn!("failed to register SIGTERM handler: {err}");
                if tokio::signal::ctrl_c().await.is_ok() {
                    info!("SIGINT (Ctrl+C) received, stopping after the current chunk");
                    request_shutdown(&shutdown_tx);
                }
                return;
            }
        };

        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("SIGINT (Ctrl+C) received, stopping after the current chunk");
            }
            _ = sigterm.recv() => {
                info!("SIGTERM received, stopping after the current chunk");
            }
        }

        request_shutdown(&shutdown_tx);
    })
}

fn request_shutdown(shutdown_tx: &ShutdownTx) {
    if let Err(err) = shutdown_tx.shutdown() {
        warn!("failed to send shutdown signal: {:?}", err);
    }
}

fn log_summary(summary: &BatchSummary) {
    if summary.interrupted {
        info!(
            processed = summary.processed,
            total = summary.total,
            "rebuild interrupted, run it again with the same selection to resume"
        );
        return;
    }

    if summary.failed() > 0 {
        warn!(
            failed = summary.failed(),
            total = summary.total,
            "some entities could not be reconciled, see the errors above"
        );
    }

    info!(
        processed = summary.processed,
        succeeded = summary.succeeded,
        total = summary.total,
        chunks = summary.chunks,
        final_message = summary.message.as_deref(),
        "rebuild summary"
    );
}

fn log_config(config: &RebuildConfig) {
    log_pg_connection_config(&config.database);
    log_batch_config(&config.batch);
    log_checkpoint_config(&config.checkpoint);
    for workflow in &config.workflows {
        log_workflow_config(workflow);
    }
}

fn log_pg_connection_config(config: &PgConnectionConfig) {
    debug!(
        host = config.host,
        port = config.port,
        dbname = config.name,
        username = config.username,
        tls_enabled = config.tls.enabled,
        "postgres connection config",
    );
}

fn log_batch_config(config: &BatchConfig) {
    debug!(
        size = config.size,
        start_id = config.start_id,
        limit = config.limit,
        dry_run = config.dry_run,
        "batch config"
    );
}

fn log_checkpoint_config(config: &CheckpointConfig) {
    match config {
        CheckpointConfig::Memory => debug!("using memory checkpoint config"),
        CheckpointConfig::File { path } => {
            debug!(path = %path.display(), "using file checkpoint config")
        }
    }
}

fn log_workflow_config(config: &WorkflowConfig) {
    debug!(
        id = config.id,
        states = ?config.states,
        default_moderation_state = config.default_moderation_state.as_deref(),
        bundles = ?config.bundles,
        "workflow config"
    );
}
