use std::sync::Arc;

use {
    clap::Parser,
    tracing::{error, info},
    tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt},
};

use {
    qren_config::{FleetConfig, resolve_data_dir},
    qren_discord::DiscordConnector,
    qren_fleet::Fleet,
    qren_store::{JsonFileBackend, SharedState, StoreBackend},
};

#[derive(Parser)]
#[command(name = "qren", about = "Qren — multi-bot Discord fleet")]
struct Cli {
    /// Log level (trace, debug, info, warn, error).
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Output logs as JSON instead of human-readable.
    #[arg(long, default_value_t = false)]
    json_logs: bool,

    /// Address the liveness endpoint binds to (overrides config value).
    #[arg(long)]
    bind: Option<String>,

    /// Port the liveness endpoint listens on.
    #[arg(long, env = "PORT")]
    port: Option<u16>,

    /// Directory the JSON stores live in.
    #[arg(long, env = "QREN_DATA_DIR")]
    data_dir: Option<std::path::PathBuf>,
}

fn init_telemetry(cli: &Cli) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));
    let registry = tracing_subscriber::registry().with(filter);

    if cli.json_logs {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer()).init();
    }
}

/// Log panics instead of letting them fall through silently; panics inside
/// spawned tasks are contained by the task boundary and the process keeps
/// running.
fn install_panic_logger() {
    std::panic::set_hook(Box::new(|info| {
        error!("unhandled panic: {info}");
    }));
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        let mut sigterm = match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(sigterm) => sigterm,
            Err(e) => {
                error!(error = %e, "failed to install SIGTERM handler");
                let _ = tokio::signal::ctrl_c().await;
                return;
            },
        };
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {},
            _ = sigterm.recv() => {},
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_telemetry(&cli);
    install_panic_logger();

    let mut config = FleetConfig::from_env();
    if let Some(bind) = cli.bind {
        config.bind = bind;
    }
    if let Some(port) = cli.port {
        config.port = port;
    }
    if cli.data_dir.is_some() {
        config.data_dir = cli.data_dir;
    }

    // Stores load before any connection starts serving.
    let data_dir = resolve_data_dir(config.data_dir.clone());
    info!(data_dir = %data_dir.display(), "loading stores");
    let backend: Arc<dyn StoreBackend> = Arc::new(JsonFileBackend::new(&data_dir));
    let state = Arc::new(SharedState::load(backend)?);

    let connector = Arc::new(DiscordConnector::new());
    let fleet = Fleet::start(qren_bots::identities(), connector, state)?;
    info!(
        connections = fleet.connections().len(),
        skipped = fleet.skipped().len(),
        "fleet started"
    );

    let status = fleet.status();
    let bind = config.bind.clone();
    let port = config.port;
    tokio::spawn(async move {
        if let Err(e) = qren_liveness::serve(&bind, port, status).await {
            error!(error = %e, "liveness endpoint failed");
        }
    });

    shutdown_signal().await;
    info!("shutdown signal received");
    fleet.shutdown();
    Ok(())
}
