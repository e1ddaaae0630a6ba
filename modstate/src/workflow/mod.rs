//! Resolution of the moderation workflow that applies to a content entity.

mod configured;
mod resolver;

pub use configured::ConfiguredWorkflows;
pub use resolver::WorkflowResolver;
