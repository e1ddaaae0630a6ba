#![allow(dead_code)]

use modstate::batch::{BatchContext, ChunkOutcome, ChunkReport, Reconciler};
use modstate::error::ModstateResult;
use modstate::store::entity::EntityStore;
use modstate::store::moderation::ModerationStateStore;
use modstate::types::{ContentEntity, EntityId, NODE_ENTITY_TYPE, Workflow};
use modstate::workflow::{ConfiguredWorkflows, WorkflowResolver};
use std::collections::{BTreeMap, BTreeSet};

pub fn article(id: u64, published: bool) -> ContentEntity {
    ContentEntity {
        id: EntityId::new(id),
        entity_type: NODE_ENTITY_TYPE.to_string(),
        bundle: "article".to_string(),
        owner_id: 1,
        revision_id: id * 10,
        langcode: "en".to_string(),
        published,
    }
}

/// Workflow moderating articles, entering content in `initial_state` when set.
pub fn editorial(initial_state: Option<&str>) -> ConfiguredWorkflows {
    let mut states = vec!["draft".to_string(), "published".to_string()];
    if let Some(state) = initial_state
        && !states.iter().any(|known| known == state)
    {
        states.push(state.to_string());
    }

    ConfiguredWorkflows::new(vec![Workflow {
        id: "editorial".to_string(),
        states,
        default_moderation_state: initial_state.map(str::to_string),
        bundles: BTreeMap::from([(
            NODE_ENTITY_TYPE.to_string(),
            BTreeSet::from(["article".to_string()]),
        )]),
    }])
}

/// Runs chunks until the context is finished, returning the report of each processed chunk.
pub async fn drain<E, W, S>(
    reconciler: &Reconciler<E, W, S>,
    batch_size: usize,
    start_id: u64,
    limit: Option<u64>,
    context: &mut BatchContext,
) -> ModstateResult<Vec<ChunkReport>>
where
    E: EntityStore,
    W: WorkflowResolver,
    S: ModerationStateStore,
{
    let mut reports = Vec::new();
    while !context.is_finished() {
        match reconciler
            .reconcile_chunk(batch_size, EntityId::new(start_id), limit, context)
            .await?
        {
            ChunkOutcome::Processed(report) => reports.push(report),
            ChunkOutcome::NothingToDo => break,
        }
    }

    Ok(reports)
}
