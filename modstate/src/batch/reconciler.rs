use std::time::Instant;
use tracing::{debug, error, info};

use crate::batch::{BatchContext, BatchCursor, effective_limit, progress_message};
use crate::error::{ErrorKind, ModstateError, ModstateResult};
use crate::store::entity::EntityStore;
use crate::store::moderation::ModerationStateStore;
use crate::types::{
    ContentEntity, EntityId, ModerationStateRecord, PUBLISHED_STATE, RecordId, RecordKey,
    SaveOutcome, Workflow,
};
use crate::workflow::WorkflowResolver;
use crate::{bail, modstate_error};

/// Result of reconciling one entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityReconciliation {
    pub entity_id: EntityId,
    /// Id of the saved record, `None` when nothing was written (dry run).
    pub record_id: Option<RecordId>,
    pub outcome: SaveOutcome,
    pub moderation_state: String,
}

/// An entity whose reconciliation failed.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityFailure {
    pub entity_id: EntityId,
    pub error: ModstateError,
}

/// What a single chunk did.
#[derive(Debug, Clone, PartialEq)]
pub struct ChunkReport {
    pub reconciled: Vec<EntityReconciliation>,
    pub failed: Vec<EntityFailure>,
    pub progress: usize,
    pub total: usize,
    pub finished: f64,
}

impl ChunkReport {
    /// Number of ids consumed by the chunk.
    pub fn attempted(&self) -> usize {
        self.reconciled.len() + self.failed.len()
    }
}

/// Outcome of [`Reconciler::reconcile_chunk`].
#[derive(Debug, Clone, PartialEq)]
pub enum ChunkOutcome {
    /// The selection is empty, there is nothing to reconcile.
    NothingToDo,
    /// A chunk was processed.
    Processed(ChunkReport),
}

/// Moderation state the record of `entity` must hold under `workflow`.
///
/// Published entities are always `published`, every other entity gets the initial state of the
/// workflow regardless of its moderation history.
pub fn target_moderation_state(workflow: &Workflow, entity: &ContentEntity) -> String {
    if entity.published {
        return PUBLISHED_STATE.to_string();
    }

    workflow.initial_state(entity).to_string()
}

/// Brings moderation state records in line with the content entities.
#[derive(Debug, Clone)]
pub struct Reconciler<E, W, S> {
    entities: E,
    workflows: W,
    states: S,
}

impl<E, W, S> Reconciler<E, W, S>
where
    E: EntityStore,
    W: WorkflowResolver,
    S: ModerationStateStore,
{
    pub fn new(entities: E, workflows: W, states: S) -> Self {
        Self {
            entities,
            workflows,
            states,
        }
    }

    /// Reconciles the next chunk of at most `batch_size` entities.
    ///
    /// On the first call the ids `>= start_id` (at most `limit` of them, a zero limit selects
    /// them all) are selected and cached in `context`; following calls reuse them. Failures of single entities are logged and
    /// counted as processed, they never abort the chunk. After the call `context.finished` holds
    /// the fraction of the batch done and `context.message` a progress message.
    ///
    /// Returns an error only when the selection query fails or `batch_size` is zero.
    #[tracing::instrument(skip(self, context))]
    pub async fn reconcile_chunk(
        &self,
        batch_size: usize,
        start_id: EntityId,
        limit: Option<u64>,
        context: &mut BatchContext,
    ) -> ModstateResult<ChunkOutcome> {
        if batch_size == 0 {
            bail!(
                ErrorKind::InvalidBatchSize,
                "Batch size must be greater than zero"
            );
        }

        let limit = effective_limit(limit);
        let mut cursor = match context.cursor.take() {
            Some(cursor) => cursor,
            None => {
                let ids = self.entities.list_ids(start_id, limit).await?;
                if ids.is_empty() {
                    info!("no entities selected, nothing to reconcile");
                    context.finished = 1.0;

                    return Ok(ChunkOutcome::NothingToDo);
                }

                info!(total = ids.len(), "selected entities for reconciliation");
                BatchCursor::new(start_id, limit, ids)
            }
        };

        let chunk = cursor.next_chunk(batch_size).to_vec();
        let mut reconciled = Vec::with_capacity(chunk.len());
        let mut failed = Vec::new();

        if !chunk.is_empty() {
            let started = Instant::now();
            let loaded = self.entities.load_entities(&chunk).await;

            for entity_id in chunk {
                let result = match &loaded {
                    Ok(entities) => match entities.get(&entity_id) {
                        Some(entity) => self.reconcile_entity(entity).await,
                        None => Err(modstate_error!(
                            ErrorKind::EntityNotFound,
                            "Entity could not be loaded",
                            format!("entity {entity_id} no longer exists")
                        )),
                    },
                    Err(err) => Err(err.clone()),
                };

                match result {
                    Ok(reconciliation) => {
                        context.results.push(entity_id);
                        reconciled.push(reconciliation);
                    }
                    Err(err) => {
                        error!(
                            %entity_id,
                            attempt = cursor.progress() + 1,
                            total = cursor.total(),
                            elapsed_secs = started.elapsed().as_secs_f64(),
                            error = %err,
                            "failed to reconcile entity"
                        );
                        failed.push(EntityFailure {
                            entity_id,
                            error: err,
                        });
                    }
                }

                cursor.advance(1);
            }
        }

        let report = ChunkReport {
            reconciled,
            failed,
            progress: cursor.progress(),
            total: cursor.total(),
            finished: cursor.fraction(),
        };

        context.finished = report.finished;
        context.message = Some(progress_message(report.progress, report.total));
        context.cursor = Some(cursor);

        info!(
            progress = report.progress,
            total = report.total,
            failed = report.failed.len(),
            finished = report.finished,
            "chunk reconciled"
        );

        Ok(ChunkOutcome::Processed(report))
    }

    /// Creates or updates the moderation state record of `entity`.
    pub async fn reconcile_entity(
        &self,
        entity: &ContentEntity,
    ) -> ModstateResult<EntityReconciliation> {
        // Unmoderated entities are not skipped, resolving their workflow below fails instead and
        // the entity shows up as a failure.
        if !self.workflows.is_moderated(entity) {
            info!(entity_id = %entity.id, "entity is not moderated");
        }

        let workflow = self.workflows.workflow_for_entity(entity)?;

        let key = RecordKey::for_entity(entity, &workflow.id);
        let mut record = match self.states.find_state_record(&key).await? {
            Some(record) => {
                debug!(
                    entity_id = %entity.id,
                    record_id = ?record.id,
                    moderation_state = %record.moderation_state,
                    "moderation state record exists"
                );
                record
            }
            None => {
                debug!(
                    entity_id = %entity.id,
                    "moderation state record does not exist"
                );
                ModerationStateRecord::new_for_entity(entity, &workflow.id)
            }
        };

        let moderation_state = target_moderation_state(&workflow, entity);
        record.content_entity_revision_id = entity.revision_id;
        record.moderation_state = moderation_state.clone();

        let outcome = self.states.save_record(&mut record).await?;
        match outcome {
            SaveOutcome::Created => {
                debug!(entity_id = %entity.id, "created moderation state record")
            }
            SaveOutcome::Updated => {
                debug!(entity_id = %entity.id, "updated moderation state record")
            }
        }

        info!(
            entity_id = %entity.id,
            %moderation_state,
            status = entity.status_label(),
            "saved entity moderation state"
        );

        Ok(EntityReconciliation {
            entity_id: entity.id,
            record_id: record.id,
            outcome,
            moderation_state,
        })
    }
}
