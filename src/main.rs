// src/main.rs

use anyhow::Result;
use clap::Parser;
use tracing::debug;

mod cli;
mod commands;

use cli::{Cli, Commands};
use commands::PkgsOptions;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so stdout only carries command output
    let default_level = if cli.debug { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    debug!("Trees: {:?}", cli.tree);
    let specs_file = cli.specs_file.as_deref();

    match cli.command {
        Commands::Clean { backend, dry_run } => {
            commands::cmd_clean(&cli.tree, specs_file, &backend, dry_run)
        }
        Commands::Pkgs {
            backend,
            availables,
            missings: _,
            build_ordered,
            build_ordered_with_resolve,
            filter,
            limit,
            json,
        } => {
            let opts = PkgsOptions {
                availables,
                build_ordered,
                with_resolve: build_ordered_with_resolve,
                filters: filter,
                limit,
                json,
            };
            commands::cmd_pkgs(&cli.tree, specs_file, &backend, &opts)
        }
    }
}
