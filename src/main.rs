//! bigip-explode - BIG-IP configuration explosion
//!
//! Command line entry point. Logs go to stderr, filtered by `RUST_LOG`
//! (default `warn`, `debug` with `--verbose`).

use clap::Parser;
use tracing::Level;
use tracing_subscriber::EnvFilter;

use bigip_explode::cli::{Cli, Commands};
use bigip_explode::commands;

fn init_tracing(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::WARN };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(level.into()))
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Explode(args) => commands::explode::run(args, cli.verbose),
        Commands::Completions(args) => commands::completions::run(args),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
