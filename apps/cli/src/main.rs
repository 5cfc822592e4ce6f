//! storypulse CLI — article engagement acquisition and training pipeline.
//!
//! Crawls tag archive pages into per-target raw files, loads them into the
//! article store, and runs the transform/train stages that produce a
//! binary engagement classifier.

mod commands;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli).await
}
