use crate::error::ModstateResult;
use crate::types::{ContentEntity, Workflow};

/// Decides which moderation workflow, if any, governs an entity.
pub trait WorkflowResolver {
    /// Returns whether any workflow moderates `entity`.
    fn is_moderated(&self, entity: &ContentEntity) -> bool;

    /// Returns the workflow moderating `entity`.
    ///
    /// Fails with [`crate::error::ErrorKind::WorkflowNotFound`] when the entity is not
    /// moderated.
    fn workflow_for_entity(&self, entity: &ContentEntity) -> ModstateResult<Workflow>;
}
