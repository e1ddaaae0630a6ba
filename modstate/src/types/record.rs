use std::fmt;

use crate::types::{ContentEntity, EntityId};

/// Identifier of a persisted moderation state record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RecordId(u64);

impl RecordId {
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    pub const fn into_inner(self) -> u64 {
        self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// The tuple identifying a moderation state record.
///
/// At most one record exists per key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RecordKey {
    pub entity_type: String,
    pub entity_id: EntityId,
    pub revision_id: u64,
    pub langcode: String,
    pub workflow: String,
}

impl RecordKey {
    /// Key of the record tracking the current revision of `entity` under `workflow`.
    pub fn for_entity(entity: &ContentEntity, workflow: &str) -> Self {
        Self {
            entity_type: entity.entity_type.clone(),
            entity_id: entity.id,
            revision_id: entity.revision_id,
            langcode: entity.langcode.clone(),
            workflow: workflow.to_string(),
        }
    }
}

/// The persisted moderation status of one entity revision under one workflow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModerationStateRecord {
    /// `None` until the record has been inserted.
    pub id: Option<RecordId>,
    pub content_entity_type_id: String,
    pub content_entity_id: EntityId,
    pub content_entity_revision_id: u64,
    pub langcode: String,
    pub workflow: String,
    pub moderation_state: String,
    pub owner_id: u64,
}

impl ModerationStateRecord {
    /// Builds an unsaved record for `entity` under `workflow`.
    ///
    /// The revision and the state are left for the caller to fill in.
    pub fn new_for_entity(entity: &ContentEntity, workflow: &str) -> Self {
        Self {
            id: None,
            content_entity_type_id: entity.entity_type.clone(),
            content_entity_id: entity.id,
            content_entity_revision_id: 0,
            langcode: entity.langcode.clone(),
            workflow: workflow.to_string(),
            moderation_state: String::new(),
            owner_id: entity.owner_id,
        }
    }

    pub fn key(&self) -> RecordKey {
        RecordKey {
            entity_type: self.content_entity_type_id.clone(),
            entity_id: self.content_entity_id,
            revision_id: self.content_entity_revision_id,
            langcode: self.langcode.clone(),
            workflow: self.workflow.clone(),
        }
    }

    pub fn is_new(&self) -> bool {
        self.id.is_none()
    }
}

/// What saving a moderation state record did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    Created,
    Updated,
}

impl fmt::Display for SaveOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SaveOutcome::Created => f.write_str("created"),
            SaveOutcome::Updated => f.write_str("updated"),
        }
    }
}
