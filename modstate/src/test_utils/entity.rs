use std::collections::{BTreeMap, BTreeSet};

use crate::types::{
    ContentEntity, DRAFT_STATE, EntityId, ModerationStateRecord, NODE_ENTITY_TYPE,
    PUBLISHED_STATE, Workflow,
};

/// Bundle given to entities built with [`node`] unless overridden.
pub const DEFAULT_BUNDLE: &str = "article";

/// Builder for test nodes.
#[derive(Debug, Clone)]
pub struct NodeBuilder {
    entity: ContentEntity,
}

/// Starts building an unpublished `article` node with id `id`.
///
/// The revision id defaults to `id * 10` so that revisions of different nodes never collide.
pub fn node(id: u64) -> NodeBuilder {
    NodeBuilder {
        entity: ContentEntity {
            id: EntityId::new(id),
            entity_type: NODE_ENTITY_TYPE.to_string(),
            bundle: DEFAULT_BUNDLE.to_string(),
            owner_id: 1,
            revision_id: id * 10,
            langcode: "en".to_string(),
            published: false,
        },
    }
}

impl NodeBuilder {
    pub fn bundle(mut self, bundle: &str) -> Self {
        self.entity.bundle = bundle.to_string();
        self
    }

    pub fn published(mut self, published: bool) -> Self {
        self.entity.published = published;
        self
    }

    pub fn revision(mut self, revision_id: u64) -> Self {
        self.entity.revision_id = revision_id;
        self
    }

    pub fn owner(mut self, owner_id: u64) -> Self {
        self.entity.owner_id = owner_id;
        self
    }

    pub fn langcode(mut self, langcode: &str) -> Self {
        self.entity.langcode = langcode.to_string();
        self
    }

    pub fn build(self) -> ContentEntity {
        self.entity
    }
}

/// Builds a workflow moderating the given node bundles.
///
/// The workflow knows the `draft`, `published` and `archived` states plus the default state when
/// it is a different one.
pub fn workflow(id: &str, default_moderation_state: Option<&str>, bundles: &[&str]) -> Workflow {
    let mut states = vec![
        DRAFT_STATE.to_string(),
        PUBLISHED_STATE.to_string(),
        "archived".to_string(),
    ];
    if let Some(default) = default_moderation_state
        && !states.iter().any(|state| state == default)
    {
        states.push(default.to_string());
    }

    let bundles: BTreeSet<String> = bundles.iter().map(|bundle| bundle.to_string()).collect();

    Workflow {
        id: id.to_string(),
        states,
        default_moderation_state: default_moderation_state.map(str::to_string),
        bundles: BTreeMap::from([(NODE_ENTITY_TYPE.to_string(), bundles)]),
    }
}

/// Builds an unsaved record tracking the current revision of `entity` in `state`.
pub fn record_for(entity: &ContentEntity, workflow: &str, state: &str) -> ModerationStateRecord {
    let mut record = ModerationStateRecord::new_for_entity(entity, workflow);
    record.content_entity_revision_id = entity.revision_id;
    record.moderation_state = state.to_string();

    record
}
