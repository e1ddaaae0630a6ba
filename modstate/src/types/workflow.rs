use modstate_config::shared::WorkflowConfig;
use std::collections::{BTreeMap, BTreeSet};

use crate::types::ContentEntity;

/// Moderation state of published content.
pub const PUBLISHED_STATE: &str = "published";

/// Initial moderation state when a workflow does not configure one.
pub const DRAFT_STATE: &str = "draft";

/// A moderation workflow: its states and the bundles it moderates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Workflow {
    pub id: String,
    pub states: Vec<String>,
    pub default_moderation_state: Option<String>,
    /// Moderated bundles keyed by entity type id.
    pub bundles: BTreeMap<String, BTreeSet<String>>,
}

impl Workflow {
    /// Returns whether this workflow moderates the bundle of `entity`.
    pub fn applies_to(&self, entity: &ContentEntity) -> bool {
        self.bundles
            .get(&entity.entity_type)
            .is_some_and(|bundles| bundles.contains(&entity.bundle))
    }

    /// State given to `entity` when it enters this workflow.
    pub fn initial_state(&self, _entity: &ContentEntity) -> &str {
        self.default_moderation_state
            .as_deref()
            .unwrap_or(DRAFT_STATE)
    }
}

impl From<&WorkflowConfig> for Workflow {
    fn from(config: &WorkflowConfig) -> Self {
        Self {
            id: config.id.clone(),
            states: config.states.clone(),
            default_moderation_state: config.default_moderation_state.clone(),
            bundles: config.bundles.clone(),
        }
    }
}
