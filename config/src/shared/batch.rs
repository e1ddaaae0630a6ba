use serde::{Deserialize, Serialize};

use crate::shared::ValidationError;

/// Default number of entities reconciled per chunk.
const DEFAULT_BATCH_SIZE: usize = 50;

/// Selection and chunking of the entities to rebuild.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct BatchConfig {
    /// Number of entities reconciled per chunk.
    #[serde(default = "default_batch_size")]
    pub size: usize,
    /// Smallest entity id to select (inclusive).
    #[serde(default)]
    pub start_id: u64,
    /// Maximum number of entity ids to select, all of them when unset or zero.
    #[serde(default)]
    pub limit: Option<u64>,
    /// When set, moderation state records are looked up but never written.
    #[serde(default)]
    pub dry_run: bool,
}

fn default_batch_size() -> usize {
    DEFAULT_BATCH_SIZE
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            size: DEFAULT_BATCH_SIZE,
            start_id: 0,
            limit: None,
            dry_run: false,
        }
    }
}

impl BatchConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.size == 0 {
            return Err(ValidationError::ZeroBatchSize);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_take_defaults() {
        let config: BatchConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.size, DEFAULT_BATCH_SIZE);
        assert_eq!(config.start_id, 0);
        assert_eq!(config.limit, None);
        assert!(!config.dry_run);
    }

    #[test]
    fn zero_size_is_rejected() {
        let config = BatchConfig {
            size: 0,
            ..BatchConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ValidationError::ZeroBatchSize)
        ));

    }

    #[test]
    fn zero_limit_is_accepted() {
        let config = BatchConfig {
            limit: Some(0),
            ..BatchConfig::default()
        };
        assert!(config.validate().is_ok());
    }
}
