//! Core data types shared by the stores, the workflow resolution and the batch reconciler.

mod entity;
mod record;
mod workflow;

pub use entity::*;
pub use record::*;
pub use workflow::*;
