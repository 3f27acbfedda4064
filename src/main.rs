//! Policat - cloud governance policy catalog extractor
//!
//! Rebuilds the policy/initiative report tables from the landing-zone
//! archetype manifests, their assignment files, and the AzAdvertizer
//! definition catalog.

use anyhow::Result;
use clap::{Parser, Subcommand};
use policat::{
    config::PolicatConfig,
    pipeline::Extractor,
    report::JsonReportSink,
    sources::{AdvertizerSource, GithubSource},
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "policat")]
#[command(version)]
#[command(about = "Cloud governance policy catalog extractor")]
struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "POLICAT_CONFIG")]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a full extraction and write the report
    Extract {
        /// Output file path (overrides the configured one)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Repository slug to read manifests from (overrides config)
        #[arg(long)]
        repo: Option<String>,
    },

    /// Show configuration
    Config {
        /// Show default configuration
        #[arg(long)]
        default: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("policat={}", log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = if let Some(config_path) = &cli.config {
        let content = std::fs::read_to_string(config_path)?;
        toml::from_str(&content)?
    } else {
        PolicatConfig::default()
    };

    match cli.command {
        Commands::Extract { output, repo } => {
            run_extract(config, output, repo).await?;
        }
        Commands::Config { default } => {
            show_config(if default { None } else { Some(&config) })?;
        }
    }

    Ok(())
}

async fn run_extract(
    mut config: PolicatConfig,
    output: Option<PathBuf>,
    repo: Option<String>,
) -> Result<()> {
    if let Some(output) = output {
        config.report.output = output;
    }
    if let Some(repo) = repo {
        config.github.repo = repo;
    }

    tracing::info!(
        repo = %config.github.repo,
        output = %config.report.output.display(),
        "Starting catalog extraction"
    );

    let github = Arc::new(GithubSource::new(config.github.clone(), &config.http)?);
    let advertizer = Arc::new(AdvertizerSource::new(
        config.advertizer.clone(),
        &config.http,
    )?);
    let sink = Arc::new(JsonReportSink::new(config.report.output.clone()));

    let extractor = Extractor::new(github.clone(), github, advertizer, sink);
    let summary = extractor.run().await?;

    tracing::info!(
        scopes = summary.scopes,
        references = summary.references,
        records = summary.records,
        initiative_rows = summary.initiative_rows,
        policy_rows = summary.policy_rows,
        placeholders = summary.placeholders,
        "Extraction complete"
    );

    Ok(())
}

fn show_config(config: Option<&PolicatConfig>) -> Result<()> {
    let config = config.cloned().unwrap_or_default();
    let toml = toml::to_string_pretty(&config)?;
    println!("{}", toml);
    Ok(())
}
