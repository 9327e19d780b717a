// Command-line entry point. The library in lib.rs holds everything else.

mod cli;

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

use image_lint_staged::{
    BatchSummary, ConfigLoader, ImageInput, Minifier, NativeCodec, OptimizerError, PoolGuard,
};

use crate::cli::Cli;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_file(false)
        .with_line_number(false)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_target(false)
        .with_ansi(true)
        .with_writer(std::io::stdout)
        .compact()
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            if !already_reported(&err) {
                error!("🔴 {:#}", err);
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut loader = ConfigLoader::new().overrides(cli.overrides());
    if let Some(path) = &cli.config {
        loader = loader.explicit(path.clone());
    }
    let (config, source) = loader.load_with_source().context("Failed to load configuration")?;
    debug!("Using config from {:?}", source);

    // shuts the pool down on every exit path
    let guard = PoolGuard::acquire(cli.jobs);
    let minifier = Minifier::with_parts(config, guard.pool(), Arc::new(NativeCodec));

    let inputs: Vec<ImageInput> = cli.files.into_iter().map(ImageInput::Path).collect();
    info!("Optimizing {} files...", inputs.len());

    let outcomes = minifier.run_all_outcomes(&inputs).await?;
    let summary = BatchSummary::from_outcomes(&outcomes);
    debug!("Summary: {:?}", summary);

    drop(guard);
    Ok(())
}

/// Escalated encode failures were logged by the minifier when they happened.
fn already_reported(err: &anyhow::Error) -> bool {
    matches!(
        err.downcast_ref::<OptimizerError>(),
        Some(OptimizerError::Fatal { .. })
    )
}
