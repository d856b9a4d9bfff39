//! Stepsampler CLI
//!
//! Command-line front end for the stepsampler audio pipeline.

use clap::Parser;
use env_logger::Env;
use log::debug;

use stepsampler::cli::{commands, Cli, Commands};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logger
    let default_filter = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(default_filter)).init();

    debug!("Stepsampler v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Commands::Process(args) => commands::process(&args),
        Commands::Inspect { file } => commands::inspect(&file),
    }
}
