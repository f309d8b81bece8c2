//! Lumen CLI — command-line client for the Lumen search engine.
//!
//! Manages indexes, documents, settings, and searches against a running
//! Lumen server.

mod commands;
mod config;

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
