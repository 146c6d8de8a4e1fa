mod check_config_cmd;
mod config;
mod upload_cmd;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use photodrop_audit::CsvAuditLog;
use photodrop_channels::{ChannelAdapter, TelegramAdapter};
use photodrop_config::{config_dir, config_file_path, load_and_prepare, validate, PhotodropConfig};
use photodrop_core::Hosting;
use photodrop_orchestrator::Orchestrator;
use tracing::{error, info, warn};

#[derive(Parser)]
#[command(name = "photodrop")]
#[command(about = "Telegram bot that uploads photos to anonymous image hosts")]
#[command(version)]
struct Cli {
    /// Config file (default: $PHOTODROP_CONFIG_DIR/photodrop.yaml or ~/.photodrop/photodrop.yaml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the Telegram bot
    Run,
    /// Upload one file through a hosting adapter and print the link
    Upload {
        #[arg(long)]
        hosting: Hosting,
        file: PathBuf,
    },
    /// Print the effective (redacted) config and validation results
    CheckConfig,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let path = cli
        .config
        .unwrap_or_else(|| config_file_path(&config_dir()));
    let config = load_and_prepare(&path)
        .await
        .with_context(|| format!("Failed to load config from {}", path.display()))?;

    init_logging(&config);

    match cli.command {
        Commands::Run => run_bot(config, &path).await,
        Commands::Upload { hosting, file } => upload_cmd::run(&config, hosting, &file).await,
        Commands::CheckConfig => check_config_cmd::run(&config, &path),
    }
}

fn init_logging(config: &PhotodropConfig) {
    let logging = config.logging.clone().unwrap_or_default();
    photodrop_logging::init_logger(
        logging.dir.as_deref().unwrap_or("logs"),
        logging.level.as_deref().unwrap_or("info"),
        logging.json.unwrap_or(false),
    );
}

async fn run_bot(config: PhotodropConfig, path: &Path) -> Result<()> {
    let report = validate(&config);
    for warning in &report.warnings {
        warn!(path = %warning.path, message = %warning.message, "Config warning");
    }
    for err in &report.errors {
        error!(path = %err.path, message = %err.message, "Config error");
    }
    if !report.is_valid() {
        bail!("{} config error(s) in {}", report.errors.len(), path.display());
    }

    let token = config
        .bot_token()
        .context("telegram.botToken is not set")?
        .to_string();

    let audit_path = config
        .audit
        .as_ref()
        .and_then(|a| a.path.clone())
        .unwrap_or_else(|| photodrop_config::defaults::DEFAULT_AUDIT_PATH.to_string());
    let audit = Arc::new(CsvAuditLog::open(&audit_path)?);

    let registry = config::build_registry(&config)?;
    let orchestrator_config = config::orchestrator_config(&config.batching());

    info!(
        config = %path.display(),
        audit = %audit_path,
        album_delay_ms = orchestrator_config.album_delay.as_millis() as u64,
        hostings = ?registry.list(),
        "Starting photodrop"
    );

    let telegram = TelegramAdapter::new(token);
    let orchestrator = Orchestrator::new(orchestrator_config, registry, audit, telegram.messenger());

    telegram.start(orchestrator).await?;
    info!(channel = telegram.name(), "Shut down");
    Ok(())
}
