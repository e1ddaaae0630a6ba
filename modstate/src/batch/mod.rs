//! Chunked, resumable reconciliation of moderation state records.
//!
//! A batch is driven by calling [`Reconciler::reconcile_chunk`] repeatedly with the same
//! [`BatchContext`] until [`BatchContext::is_finished`] returns true, then reporting the result
//! with [`on_finished`].

mod cursor;
mod progress;
mod reconciler;

pub use cursor::*;
pub use progress::*;
pub use reconciler::*;
