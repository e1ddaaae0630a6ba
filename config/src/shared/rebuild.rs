use serde::Deserialize;

use crate::load::Config;
use crate::shared::{
    BatchConfig, CheckpointConfig, PgConnectionConfig, ValidationError, WorkflowConfig,
    validate_workflows,
};

/// Configuration for the moderation state rebuild job.
///
/// The [`RebuildConfig`] is deserialized from the layered configuration files and passed to the
/// job at startup.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct RebuildConfig {
    /// Database holding the content and the moderation state tables.
    pub database: PgConnectionConfig,
    /// Entity selection and chunking.
    #[serde(default)]
    pub batch: BatchConfig,
    /// Moderation workflows and the bundles they apply to.
    pub workflows: Vec<WorkflowConfig>,
    /// Persistence of the batch context between chunks.
    #[serde(default)]
    pub checkpoint: CheckpointConfig,
}

impl Config for RebuildConfig {
    const LIST_PARSE_KEYS: &'static [&'static str] = &[];
}

impl RebuildConfig {
    /// Validates the loaded [`RebuildConfig`].
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] for the first invalid section.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.database.tls.validate()?;
        self.batch.validate()?;
        validate_workflows(&self.workflows)?;
        self.checkpoint.validate()?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONFIG: &str = r#"{
        "database": {
            "host": "localhost",
            "port": 5432,
            "name": "drupal",
            "username": "postgres",
            "password": "secret"
        },
        "batch": { "size": 25, "start_id": 100, "limit": 1000 },
        "workflows": [
            {
                "id": "editorial",
                "states": ["draft", "published"],
                "bundles": { "node": ["article", "page"] }
            }
        ],
        "checkpoint": { "type": "file", "path": "/tmp/modstate-checkpoint.json" }
    }"#;

    #[test]
    fn deserializes_and_validates() {
        let config: RebuildConfig = serde_json::from_str(CONFIG).unwrap();

        assert_eq!(config.batch.size, 25);
        assert_eq!(config.batch.start_id, 100);
        assert_eq!(config.batch.limit, Some(1000));
        assert!(!config.database.tls.enabled);
        assert!(matches!(config.checkpoint, CheckpointConfig::File { .. }));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn password_is_redacted_in_debug_output() {
        let config: RebuildConfig = serde_json::from_str(CONFIG).unwrap();

        let debug = format!("{:?}", config.database);
        assert!(!debug.contains("secret"));
    }

    #[test]
    fn tls_without_certificates_is_rejected() {
        let mut config: RebuildConfig = serde_json::from_str(CONFIG).unwrap();
        config.database.tls.enabled = true;

        assert!(matches!(
            config.validate(),
            Err(ValidationError::MissingTrustedRootCerts)
        ));
    }
}
