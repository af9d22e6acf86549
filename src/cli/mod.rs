//! Command-line interface
//!
//! `fraud-baseline [--data PATH] [--smote true|false]` runs both models and
//! prints one report block per model to stdout.

use anyhow::Context;
use clap::Parser;
use colored::*;
use std::io::IsTerminal;
use std::path::PathBuf;
use tracing::warn;

use crate::config::{BaselineConfig, DEFAULT_DATA_PATH};
use crate::pipeline::{run, ModelRun};

#[derive(Parser, Debug)]
#[command(name = "fraud-baseline")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Baseline fraud classifiers with optional SMOTE oversampling")]
#[command(long_about = None)]
pub struct Cli {
    /// Input CSV with a `Class` label column (1 = fraud, 0 = legit)
    #[arg(long, default_value = DEFAULT_DATA_PATH)]
    pub data: PathBuf,

    /// Oversample the training split with SMOTE: true/false
    #[arg(long, default_value = "false")]
    pub smote: String,
}

impl Cli {
    /// Run configuration for these arguments
    pub fn config(&self) -> BaselineConfig {
        BaselineConfig::new().with_data_path(self.data.clone())
    }

    /// SMOTE switch; see [`parse_smote_flag`]
    pub fn use_smote(&self) -> bool {
        parse_smote_flag(&self.smote)
    }
}

/// `true` in any letter case enables SMOTE. Any other value disables it;
/// values other than `false` are reported with a warning.
pub fn parse_smote_flag(value: &str) -> bool {
    if value.eq_ignore_ascii_case("true") {
        return true;
    }
    if !value.eq_ignore_ascii_case("false") {
        warn!(value, "Unrecognized --smote value, treating as false");
    }
    false
}

/// Render one report block: blank line, header, metrics
pub fn render_run(run: &ModelRun, color: bool) -> String {
    let header = run.header();
    let header = if color {
        header.white().bold().to_string()
    } else {
        header
    };
    format!("\n{}\n{}", header, run.report)
}

/// Execute a parsed command line
pub fn cmd_run(cli: &Cli) -> anyhow::Result<()> {
    let config = cli.config();
    let use_smote = cli.use_smote();

    let runs = run(&config, use_smote)
        .with_context(|| format!("baseline run on {} failed", config.data_path.display()))?;

    let color = std::io::stdout().is_terminal();
    for model_run in &runs {
        println!("{}", render_run(model_run, color));
    }

    Ok(())
}
