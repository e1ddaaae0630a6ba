use clap::Args;
use modstate_config::load_config;
use modstate_config::shared::{BatchConfig, RebuildConfig};

/// Batch settings that can be overridden from the command line.
#[derive(Debug, Default, Clone, Args)]
pub struct CliOverrides {
    /// Smallest node id to reconcile.
    #[arg(long)]
    pub start_id: Option<u64>,

    /// Maximum number of nodes to reconcile.
    #[arg(long)]
    pub limit: Option<u64>,

    /// Number of nodes reconciled per chunk.
    #[arg(long)]
    pub batch_size: Option<usize>,

    /// Look up the moderation state records without writing them.
    #[arg(long)]
    pub dry_run: bool,
}

impl CliOverrides {
    fn apply(&self, batch: &mut BatchConfig) {
        if let Some(start_id) = self.start_id {
            batch.start_id = start_id;
        }
        if let Some(limit) = self.limit {
            batch.limit = Some(limit);
        }
        if let Some(batch_size) = self.batch_size {
            batch.size = batch_size;
        }
        if self.dry_run {
            batch.dry_run = true;
        }
    }
}

/// Loads the [`RebuildConfig`], applies the command line overrides and validates the result.
pub fn load_rebuild_config(overrides: &CliOverrides) -> anyhow::Result<RebuildConfig> {
    let mut config = load_config::<RebuildConfig>()?;
    overrides.apply(&mut config.batch);
    config.validate()?;

    Ok(config)
}
