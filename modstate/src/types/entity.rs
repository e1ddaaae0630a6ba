use serde::{Deserialize, Serialize};
use std::fmt;

/// Entity type id of content nodes.
pub const NODE_ENTITY_TYPE: &str = "node";

/// Identifier of a content entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(u64);

impl EntityId {
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    pub const fn into_inner(self) -> u64 {
        self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A content entity whose moderation state is rebuilt.
///
/// Entities are owned by the content store and only read here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentEntity {
    pub id: EntityId,
    /// Entity type id, e.g. `node`.
    pub entity_type: String,
    /// Bundle of the entity, e.g. `article`. Workflows are attached to bundles.
    pub bundle: String,
    pub owner_id: u64,
    /// Id of the current revision.
    pub revision_id: u64,
    pub langcode: String,
    pub published: bool,
}

impl ContentEntity {
    /// Human readable publication status used in logs.
    pub fn status_label(&self) -> &'static str {
        if self.published { "Published" } else { "Draft" }
    }
}
