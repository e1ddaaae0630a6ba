//! Rebuilds content moderation state records for content entities.
//!
//! The crate pages through content entities in ascending id order, resolves the moderation
//! workflow of each entity and inserts or updates the companion moderation state record so that
//! it matches the entity's current revision and publication status.
//!
//! The work is split in chunks driven by [`batch::Reconciler::reconcile_chunk`]; all the state
//! needed to resume lives in [`batch::BatchContext`], which [`runner::run_batch`] persists
//! through a [`store::checkpoint::CheckpointStore`] between chunks.

pub mod batch;
pub mod concurrency;
pub mod error;
mod macros;
pub mod runner;
pub mod store;
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
pub mod types;
pub mod workflow;
