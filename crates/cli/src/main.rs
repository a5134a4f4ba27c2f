use anyhow::Context;
use arb_engine_core::validation::is_valid_wallet_address;
use arb_engine_core::{AppConfig, ConfigLoader, ConfigWatcher, WithdrawalSettings};
use arb_engine_orchestrator::{
    CheckRegistry, EngineBuilder, EngineError, EngineHandle, HistoryStore, PreflightValidator,
    SimulatedProbe, SimulatedSignalSource, SimulatedTransferExecutor,
};
use arb_engine_web_api::ApiServer;
use clap::{Parser, Subcommand};
use std::path::Path;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "arb-engine")]
#[command(about = "Arbitrage engine activation pipeline", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the engine with the web API
    Run {
        /// Config file path
        #[arg(short, long, default_value = "config/Config.toml")]
        config: String,
        /// Listen address (overrides server.host/server.port)
        #[arg(short, long, env = "ARB_ENGINE_ADDR")]
        addr: Option<String>,
        /// Reload withdrawal settings when the config file changes
        #[arg(long)]
        watch: bool,
        /// Optional log file path (logs to file instead of stderr)
        #[arg(long)]
        log_file: Option<String>,
    },
    /// Run the preflight checks once and print the report
    Preflight {
        /// Config file path
        #[arg(short, long, default_value = "config/Config.toml")]
        config: String,
    },
    /// Validate a withdrawal wallet address
    CheckAddress {
        /// Address to validate (0x followed by 40 hex digits)
        address: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match &cli.command {
        Commands::Run {
            log_file: Some(path),
            ..
        } => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)?;
            tracing_subscriber::fmt()
                .with_env_filter(
                    tracing_subscriber::EnvFilter::try_from_default_env()
                        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
                )
                .with_writer(std::sync::Mutex::new(file))
                .init();
        }
        _ => {
            tracing_subscriber::fmt()
                .with_env_filter(
                    tracing_subscriber::EnvFilter::try_from_default_env()
                        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
                )
                .init();
        }
    }

    match cli.command {
        Commands::Run {
            config,
            addr,
            watch,
            log_file: _,
        } => {
            run_engine(&config, addr, watch).await?;
        }
        Commands::Preflight { config } => {
            run_preflight_once(&config).await?;
        }
        Commands::CheckAddress { address } => {
            check_address(&address)?;
        }
    }

    Ok(())
}

/// Loads the given file if present, otherwise defaults plus `APP_` overrides.
fn load_config(config_path: &str) -> anyhow::Result<AppConfig> {
    if Path::new(config_path).exists() {
        ConfigLoader::load_from(config_path)
    } else {
        tracing::warn!(
            "Config file {} not found, using defaults and environment",
            config_path
        );
        ConfigLoader::load()
    }
}

fn simulated_registry(config: &AppConfig) -> anyhow::Result<CheckRegistry> {
    CheckRegistry::from_descriptors(
        &config.preflight.checks,
        SimulatedProbe::factory(&config.simulation),
    )
    .context("Invalid preflight check list")
}

async fn open_history_store(config: &AppConfig) -> anyhow::Result<Option<HistoryStore>> {
    if !config.database.enabled {
        tracing::info!("Withdrawal history persistence disabled");
        return Ok(None);
    }

    let db_url = &config.database.url;
    if let Some(file_path) = db_url.strip_prefix("sqlite://") {
        if let Some(parent) = Path::new(file_path).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).with_context(|| {
                    format!("Cannot create database directory {}", parent.display())
                })?;
            }
        }
    }

    tracing::info!("Opening withdrawal history at: {}", db_url);
    let store = HistoryStore::new(db_url, config.database.max_connections).await?;
    Ok(Some(store))
}

async fn run_engine(config_path: &str, addr: Option<String>, watch: bool) -> anyhow::Result<()> {
    tracing::info!("Starting engine with config: {}", config_path);

    let config = load_config(config_path)?;
    let registry = simulated_registry(&config)?;

    let mut builder = EngineBuilder::new(
        &config,
        registry,
        Arc::new(SimulatedSignalSource::new(&config.simulation)),
        Arc::new(SimulatedTransferExecutor::new(&config.simulation)),
    );
    if let Some(store) = open_history_store(&config).await? {
        builder = builder.store(store);
    }
    let engine = builder.spawn().await?;

    if watch && Path::new(config_path).exists() {
        spawn_config_reload(config_path, config.withdrawal.clone(), engine.clone());
    }

    let addr = addr.unwrap_or_else(|| config.server.addr());
    let server = ApiServer::new(engine.clone());

    tokio::select! {
        result = server.serve(&addr) => {
            result?;
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Received Ctrl+C, shutting down engine");
        }
    }

    if let Err(e) = engine.shutdown().await {
        tracing::warn!("Engine already stopped: {}", e);
    }

    Ok(())
}

/// Forwards withdrawal settings from the edited config file to the engine.
/// Other sections need a restart to take effect.
fn spawn_config_reload(config_path: &str, initial: WithdrawalSettings, engine: EngineHandle) {
    let (watcher, mut rx) = ConfigWatcher::new(config_path, initial);

    tokio::spawn(async move {
        if let Err(e) = watcher.watch().await {
            tracing::error!("Config watcher stopped: {e:#}");
        }
    });

    tokio::spawn(async move {
        while rx.changed().await.is_ok() {
            let update = rx.borrow_and_update().to_update();
            match engine.update_withdrawal_config(update).await {
                Ok(applied) => {
                    tracing::info!(
                        "Withdrawal settings reloaded (enabled={}, threshold={})",
                        applied.is_enabled,
                        applied.threshold_amount
                    );
                }
                Err(EngineError::Closed) => break,
                Err(e) => {
                    tracing::error!("Rejected reloaded withdrawal settings: {}", e);
                }
            }
        }
    });
}

async fn run_preflight_once(config_path: &str) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    let validator =
        PreflightValidator::new(simulated_registry(&config)?, config.preflight.probe_timeout());

    let report = validator.run(|_| {}).await;
    println!("{}", serde_json::to_string_pretty(&report)?);

    if !report.verdict.critical_passed {
        anyhow::bail!("Critical preflight checks failed");
    }
    Ok(())
}

fn check_address(address: &str) -> anyhow::Result<()> {
    if is_valid_wallet_address(address) {
        println!("{address} is a valid wallet address");
        Ok(())
    } else {
        anyhow::bail!("{address} is not a valid wallet address")
    }
}
