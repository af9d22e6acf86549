//! fraud-baseline - Main Entry Point

use clap::Parser;
use fraud_baseline::cli::{cmd_run, Cli};

fn main() -> anyhow::Result<()> {
    // Diagnostics go to stderr; stdout carries only the reports
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "fraud_baseline=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    cmd_run(&cli)
}
