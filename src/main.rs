// Operator CLI driving application workflow passes
use clap::{Parser, Subcommand};
use color_eyre::eyre::Result;
use std::io::stderr;
use tokio::sync::watch;
use tracing::{debug, info};
use tracing_subscriber::{fmt, prelude::*, registry, EnvFilter};

mod cmd;
mod config;
mod manifest;

use cmd::run::RunArgs;
use cmd::validate::ValidateArgs;

#[derive(Parser, Debug)]
#[command(author, version, about = "Application workflow runner", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose output - shows more detailed logs
    #[arg(short, long, default_value_t = false, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Validates an application manifest and its rendered objects offline.
    Validate(ValidateArgs),
    /// Runs workflow passes for an application against the cluster.
    Run(RunArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();

    // RUST_LOG wins; otherwise this crate at info/debug and noisy dependencies capped
    let default_level = if cli.verbose { "debug" } else { "info" };
    let default_directives = format!(
        "appflow={level},appflow_workflow={level},appflow_crd={level},kube=warn,tower=warn,hyper=warn,rustls=warn,h2=warn",
        level = default_level
    );
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directives));
    registry()
        .with(filter)
        .with(fmt::layer().with_writer(stderr))
        .init();
    debug!("Logger initialized");

    let (shutdown_tx, shutdown_rx) = watch::channel(());
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Ctrl+C received, sending shutdown signal...");
            let _ = shutdown_tx.send(());
        }
    });

    match cli.command {
        Commands::Validate(args) => cmd::validate::run_validate(args),
        Commands::Run(args) => cmd::run::run_workflow(args, shutdown_rx).await,
    }
}
