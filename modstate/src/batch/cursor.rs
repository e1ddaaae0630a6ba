use serde::{Deserialize, Serialize};

use crate::types::EntityId;

/// Normalizes a selection limit, a limit of zero selects every id like no limit does.
pub fn effective_limit(limit: Option<u64>) -> Option<u64> {
    limit.filter(|limit| *limit > 0)
}

/// Pagination state of a batch: the selected ids and how many of them were processed.
///
/// The ids are selected once, on the first chunk, and reused by every following chunk so that
/// entities created during the run do not shift the pages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchCursor {
    start_id: EntityId,
    limit: Option<u64>,
    ids: Vec<EntityId>,
    progress: usize,
}

impl BatchCursor {
    pub fn new(start_id: EntityId, limit: Option<u64>, ids: Vec<EntityId>) -> Self {
        Self {
            start_id,
            limit,
            ids,
            progress: 0,
        }
    }

    /// Number of ids processed so far, whether they succeeded or not.
    pub fn progress(&self) -> usize {
        self.progress
    }

    pub fn total(&self) -> usize {
        self.ids.len()
    }

    /// Returns the next `batch_size` unprocessed ids, fewer when the end is near.
    pub fn next_chunk(&self, batch_size: usize) -> &[EntityId] {
        let start = self.progress.min(self.ids.len());
        let end = start.saturating_add(batch_size).min(self.ids.len());

        &self.ids[start..end]
    }

    /// Marks `count` more ids as processed.
    pub fn advance(&mut self, count: usize) {
        self.progress = self.progress.saturating_add(count).min(self.ids.len());
    }

    pub fn is_complete(&self) -> bool {
        self.progress >= self.ids.len()
    }

    /// Fraction of the selected ids processed so far, `1.0` for an empty selection.
    pub fn fraction(&self) -> f64 {
        if self.ids.is_empty() {
            return 1.0;
        }

        self.progress as f64 / self.ids.len() as f64
    }

    /// Returns whether this cursor was built for the selection `start_id`/`limit`.
    pub fn matches_selection(&self, start_id: EntityId, limit: Option<u64>) -> bool {
        self.start_id == start_id && self.limit == limit
    }
}

/// Everything a driver threads through the chunks of one batch.
///
/// The context is serializable so that it can be checkpointed and resumed in another process.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchContext {
    /// Pagination state, `None` until the first chunk selected the ids.
    pub cursor: Option<BatchCursor>,
    /// Ids of the entities reconciled successfully.
    pub results: Vec<EntityId>,
    /// Fraction of the batch done, `1.0` once finished.
    pub finished: f64,
    /// Progress message for the last chunk.
    pub message: Option<String>,
    /// Whether the chunks so far ran without writing records.
    #[serde(default)]
    pub dry_run: bool,
}

impl BatchContext {
    pub fn is_finished(&self) -> bool {
        self.finished >= 1.0
    }

    /// Returns whether this context can continue a batch selecting `start_id`/`limit` in the
    /// given dry run mode.
    ///
    /// The ids a dry run went through have no record written, so a dry run context never
    /// continues a real run and the other way around. A context that has not selected ids yet
    /// matches any selection.
    pub fn can_resume(&self, start_id: EntityId, limit: Option<u64>, dry_run: bool) -> bool {
        self.dry_run == dry_run
            && self
                .cursor
                .as_ref()
                .is_none_or(|cursor| cursor.matches_selection(start_id, limit))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cursor(ids: &[u64]) -> BatchCursor {
        BatchCursor::new(
            EntityId::new(0),
            None,
            ids.iter().copied().map(EntityId::new).collect(),
        )
    }

    #[test]
    fn chunks_walk_the_ids_in_order() {
        let mut cursor = cursor(&[10, 11, 12, 13, 14]);

        assert_eq!(cursor.next_chunk(2), [10, 11].map(EntityId::new));
        cursor.advance(2);
        assert_eq!(cursor.next_chunk(2), [12, 13].map(EntityId::new));
        cursor.advance(2);
        assert_eq!(cursor.next_chunk(2), [14].map(EntityId::new));
        cursor.advance(1);
        assert!(cursor.next_chunk(2).is_empty());
        assert!(cursor.is_complete());
    }

    #[test]
    fn zero_limit_means_no_limit() {
        assert_eq!(effective_limit(Some(0)), None);
        assert_eq!(effective_limit(Some(3)), Some(3));
        assert_eq!(effective_limit(None), None);
    }

    #[test]
    fn progress_never_exceeds_total() {
        let mut cursor = cursor(&[1, 2, 3]);
        cursor.advance(10);

        assert_eq!(cursor.progress(), 3);
        assert_eq!(cursor.fraction(), 1.0);
    }

    #[test]
    fn fraction_tracks_progress() {
        let mut cursor = cursor(&[1, 2, 3, 4]);
        assert_eq!(cursor.fraction(), 0.0);

        cursor.advance(1);
        assert_eq!(cursor.fraction(), 0.25);

        assert_eq!(BatchCursor::new(EntityId::new(0), None, vec![]).fraction(), 1.0);
    }

    #[test]
    fn context_resumes_the_same_selection_only() {
        let mut context = BatchContext::default();
        assert!(context.can_resume(EntityId::new(5), Some(10), false));

        context.cursor = Some(BatchCursor::new(EntityId::new(5), Some(10), vec![]));
        assert!(context.can_resume(EntityId::new(5), Some(10), false));
        assert!(!context.can_resume(EntityId::new(5), None, false));
        assert!(!context.can_resume(EntityId::new(6), Some(10), false));
    }

    #[test]
    fn dry_run_context_never_resumes_a_real_run() {
        let context = BatchContext {
            cursor: Some(BatchCursor::new(EntityId::new(0), None, vec![])),
            dry_run: true,
            ..BatchContext::default()
        };

        assert!(context.can_resume(EntityId::new(0), None, true));
        assert!(!context.can_resume(EntityId::new(0), None, false));
        assert!(!BatchContext::default().can_resume(EntityId::new(0), None, true));
    }

    #[test]
    fn checkpoint_without_dry_run_flag_is_a_real_run() {
        let json = r#"{"cursor":null,"results":[],"finished":0.0,"message":null}"#;
        let context: BatchContext = serde_json::from_str(json).unwrap();

        assert!(!context.dry_run);
    }

    #[test]
    fn context_survives_json() {
        let mut context = BatchContext {
            cursor: Some(cursor(&[1, 2, 3])),
            results: vec![EntityId::new(1)],
            finished: 0.0,
            message: None,
            dry_run: true,
        };
        if let Some(cursor) = context.cursor.as_mut() {
            cursor.advance(1);
        }

        let json = serde_json::to_string(&context).unwrap();
        let decoded: BatchContext = serde_json::from_str(&json).unwrap();

        assert_eq!(decoded, context);
        assert_eq!(decoded.cursor.unwrap().progress(), 1);
    }
}
