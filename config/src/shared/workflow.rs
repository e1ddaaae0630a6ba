use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet, HashSet};

use crate::shared::ValidationError;

/// State every workflow must know about, published entities are forced into it.
const PUBLISHED_STATE: &str = "published";

/// A moderation workflow and the content it applies to.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct WorkflowConfig {
    /// Machine name of the workflow, e.g. `editorial`.
    pub id: String,
    /// Moderation states defined by the workflow.
    pub states: Vec<String>,
    /// State given to entities entering the workflow. Falls back to `draft` when unset.
    #[serde(default)]
    pub default_moderation_state: Option<String>,
    /// Bundles under moderation, keyed by entity type id.
    pub bundles: BTreeMap<String, BTreeSet<String>>,
}

impl WorkflowConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        let invalid = |reason: &str| ValidationError::InvalidWorkflow {
            workflow: self.id.clone(),
            reason: reason.to_string(),
        };

        if self.id.is_empty() {
            return Err(invalid("id cannot be empty"));
        }

        if !self.states.iter().any(|state| state == PUBLISHED_STATE) {
            return Err(invalid("states must include `published`"));
        }

        if let Some(default_state) = &self.default_moderation_state
            && !self.states.contains(default_state)
        {
            return Err(invalid(
                "default_moderation_state must be one of the workflow states",
            ));
        }

        if self.bundles.values().all(BTreeSet::is_empty) {
            return Err(invalid("at least one bundle must be moderated"));
        }

        Ok(())
    }
}

/// Validates every workflow and checks that ids are unique.
pub fn validate_workflows(workflows: &[WorkflowConfig]) -> Result<(), ValidationError> {
    if workflows.is_empty() {
        return Err(ValidationError::NoWorkflows);
    }

    let mut seen = HashSet::new();
    for workflow in workflows {
        workflow.validate()?;

        if !seen.insert(workflow.id.as_str()) {
            return Err(ValidationError::DuplicateWorkflow(workflow.id.clone()));
        }
    }

    Ok(())
}
