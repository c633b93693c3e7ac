use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;

use strava_notion_client::config::{NotionConfig, StravaConfig};
use strava_notion_client::notion::ReqwestNotionClient;
use strava_notion_client::strava::ReqwestStravaClient;
use strava_notion_sync::middleware::LoggingMiddleware;
use strava_notion_sync::settings::Overrides;
use strava_notion_sync::{FieldMapping, Settings, SyncRunner};

#[derive(Parser)]
#[command(name = "strava-notion-sync")]
#[command(version, about = "Sync Strava activities into a Notion training log", long_about = None)]
struct Cli {
    /// YAML field mapping; built-in defaults when omitted
    #[arg(short, long, env = "STRAVA_NOTION_CONFIG")]
    config: Option<PathBuf>,

    /// Lookback window in days (overrides DAYS_BACK)
    #[arg(short, long)]
    days_back: Option<u32>,

    /// Compute and log every change without writing to Notion
    #[arg(long)]
    dry_run: bool,

    /// Refresh metrics on records that already exist
    #[arg(long)]
    update_existing: bool,

    /// Print the summary as JSON
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    // A missing .env is the normal case outside local runs.
    let _ = dotenvy::dotenv();

    let log_env = std::env::var("STRAVA_NOTION_LOG_LEVEL")
        .or_else(|_| std::env::var("RUST_LOG"))
        .unwrap_or_else(|_| "info".to_string());
    let env_filter = tracing_subscriber::EnvFilter::try_new(&log_env)
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .compact()
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .with_target(false)
        .with_env_filter(env_filter)
        .init();
    tracing::debug!("strava-notion-sync: log filter: {}", log_env);

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("sync aborted: {:#}", e);
            eprintln!("error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let mapping = match &cli.config {
        Some(path) => FieldMapping::load(path)
            .with_context(|| format!("loading field mapping from {}", path.display()))?,
        None => FieldMapping::default(),
    };
    let settings = Settings::from_env(mapping)
        .context("reading sync settings")?
        .with_overrides(&Overrides {
            lookback_days: cli.days_back,
            dry_run: cli.dry_run,
            update_existing: cli.update_existing,
        })
        .context("applying command-line overrides")?;

    let strava = ReqwestStravaClient::new(StravaConfig::from_env().context("reading Strava credentials")?)
        .context("building Strava client")?;
    let notion = ReqwestNotionClient::new(NotionConfig::from_env().context("reading Notion credentials")?)
        .context("building Notion client")?;

    let runner = SyncRunner::new(
        Arc::new(strava),
        Arc::new(LoggingMiddleware::new(notion)),
        settings,
    );
    let report = runner.run().await?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{report}");
    }
    Ok(())
}
