use thiserror::Error;

/// Errors that can occur during configuration validation.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// TLS is enabled but no trusted root certificates are provided.
    #[error("Invalid TLS config: `trusted_root_certs` must be set when `enabled` is true")]
    MissingTrustedRootCerts,

    /// The batch size must allow at least one entity per chunk.
    #[error("Invalid batch config: `size` must be greater than 0")]
    ZeroBatchSize,

    /// No moderation workflows configured.
    #[error("At least one workflow must be configured")]
    NoWorkflows,

    /// Two workflows share the same id.
    #[error("Duplicate workflow id: {0}")]
    DuplicateWorkflow(String),

    /// Invalid workflow configuration.
    #[error("Invalid workflow `{workflow}`: {reason}")]
    InvalidWorkflow { workflow: String, reason: String },

    /// Invalid checkpoint configuration.
    #[error("Invalid checkpoint configuration: {0}")]
    InvalidCheckpoint(String),
}
