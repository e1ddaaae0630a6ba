use modstate_config::shared::WorkflowConfig;

use crate::bail;
use crate::error::{ErrorKind, ModstateResult};
use crate::types::{ContentEntity, Workflow};
use crate::workflow::WorkflowResolver;

/// Resolves workflows from a fixed, configured list.
///
/// When more than one workflow covers the same bundle, the first one in configuration order wins.
#[derive(Debug, Clone, Default)]
pub struct ConfiguredWorkflows {
    workflows: Vec<Workflow>,
}

impl ConfiguredWorkflows {
    pub fn new(workflows: Vec<Workflow>) -> Self {
        Self { workflows }
    }

    pub fn from_config(configs: &[WorkflowConfig]) -> Self {
        Self::new(configs.iter().map(Workflow::from).collect())
    }

    fn find(&self, entity: &ContentEntity) -> Option<&Workflow> {
        self.workflows
            .iter()
            .find(|workflow| workflow.applies_to(entity))
    }
}

impl WorkflowResolver for ConfiguredWorkflows {
    fn is_moderated(&self, entity: &ContentEntity) -> bool {
        self.find(entity).is_some()
    }

    fn workflow_for_entity(&self, entity: &ContentEntity) -> ModstateResult<Workflow> {
        match self.find(entity) {
            Some(workflow) => Ok(workflow.clone()),
            None => bail!(
                ErrorKind::WorkflowNotFound,
                "No workflow moderates the entity",
                format!(
                    "{} {} has bundle `{}` which is not attached to any workflow",
                    entity.entity_type, entity.id, entity.bundle
                )
            ),
        }
    }
}
