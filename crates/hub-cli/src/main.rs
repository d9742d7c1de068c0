//! hubsync CLI
//!
//! Pulls, pushes and installs hub apps and drivers against a local tree.

mod cli;
mod commands;
mod context;
mod error;

use clap::Parser;
use colored::Colorize;
use hub_core::{CodeType, ResourceType};
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands};
use commands::Output;
use context::Context;
use error::{CliError, Result};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let outcome = tokio::select! {
        result = run(cli) => result,
        _ = tokio::signal::ctrl_c() => Err(CliError::user("interrupted; manifest left unchanged")),
    };

    if let Err(e) = outcome {
        eprintln!("{}: {}", "error".red().bold(), e);
        std::process::exit(1);
    }
}

/// Log to stderr; `RUST_LOG` overrides the verbosity flag.
fn init_tracing(verbose: bool) {
    let default = if verbose { "hub=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(verbose)
        .init();
}

async fn run(cli: Cli) -> Result<()> {
    let output = Output {
        json: cli.json,
        verbose: cli.verbose,
    };

    // Arguments are validated before any configuration or network access
    match cli.command {
        Commands::Pull { kind, id } => {
            let scope = commands::parse_scope(kind.as_deref(), id.as_deref())?;
            let ctx = Context::load(cli.root)?;
            commands::run_pull(&ctx, scope, output).await
        }
        Commands::Push { kind, id } => {
            let scope = commands::parse_scope(kind.as_deref(), id.as_deref())?;
            let ctx = Context::load(cli.root)?;
            commands::run_push(&ctx, scope, output).await
        }
        Commands::Install { kind, path } => {
            let kind: CodeType = kind.parse()?;
            let ctx = Context::load(cli.root)?;
            commands::run_install(&ctx, kind, &path, output).await
        }
        Commands::List { kind } => {
            let kind: ResourceType = kind.parse()?;
            let ctx = Context::load(cli.root)?;
            commands::run_list(&ctx, kind, cli.json).await
        }
    }
}
