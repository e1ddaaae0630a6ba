use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::shared::ValidationError;

/// Where the batch context is persisted between chunks.
///
/// Persisting the context lets an interrupted run resume from the last completed chunk instead of
/// selecting and reconciling every entity again.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type")]
pub enum CheckpointConfig {
    /// The context lives only for the duration of the process.
    #[default]
    Memory,
    /// The context is written as JSON to `path` after every chunk.
    File { path: PathBuf },
}

impl CheckpointConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        match self {
            CheckpointConfig::Memory => Ok(()),
            CheckpointConfig::File { path } => {
                if path.as_os_str().is_empty() {
                    return Err(ValidationError::InvalidCheckpoint(
                        "checkpoint file path cannot be empty".to_string(),
                    ));
                }

                if path.is_dir() {
                    return Err(ValidationError::InvalidCheckpoint(format!(
                        "checkpoint path {} is a directory",
                        path.display()
                    )));
                }

                Ok(())
            }
        }
    }
}
