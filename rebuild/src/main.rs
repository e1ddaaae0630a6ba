use clap::Parser;
use modstate_config::shared::RebuildConfig;
use modstate_telemetry::init_tracing_with_run_id;
use tracing::error;
use uuid::Uuid;

use crate::config::{CliOverrides, load_rebuild_config};
use crate::core::start_rebuild_with_config;

mod config;
mod core;
mod migrations;

/// Rebuilds the content moderation state records of every node.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    #[command(flatten)]
    overrides: CliOverrides,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load the rebuild config, command line flags win over the configuration files.
    let rebuild_config = load_rebuild_config(&cli.overrides)?;

    // Every log line of this run carries the same id.
    let run_id = Uuid::new_v4().to_string();
    let _log_flusher = init_tracing_with_run_id(env!("CARGO_BIN_NAME"), Some(run_id))?;

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(async_main(rebuild_config))?;

    Ok(())
}

async fn async_main(rebuild_config: RebuildConfig) -> anyhow::Result<()> {
    if let Err(err) = start_rebuild_with_config(rebuild_config).await {
        error!("an error occurred in the rebuild: {err}");

        return Err(err);
    }

    Ok(())
}
