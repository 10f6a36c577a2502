use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};

use linklens::analyze::Analyzer;
use linklens::config::AppConfig;
use linklens::fetch::HttpFetcher;

#[derive(Parser)]
#[command(name = "linklens", about = "Structured previews for event links")]
struct Cli {
    /// Config file (default: config.json in the data directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the analyze and message endpoints
    Serve,
    /// Analyze one link and print the result as JSON
    Analyze { url: String },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();
    let config = AppConfig::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Serve => linklens::run(config).await,
        Commands::Analyze { url } => {
            let fetcher =
                HttpFetcher::from_config(&config).context("unable to build http client")?;
            let result = Analyzer::new(fetcher).analyze_event(&url).await;
            println!("{}", serde_json::to_string_pretty(&result)?);
            Ok(())
        }
    }
}
