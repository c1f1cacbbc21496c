//! ser-ensemble - speech emotion recognition service
//!
//! Loads the three ONNX classifiers once, then serves `POST /api/predict`.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};

use ser_common::config::resolve_config_path;
use ser_common::logging::init_tracing;
use ser_ensemble::config::ServiceConfig;
use ser_ensemble::ensemble::EnsemblePipeline;
use ser_ensemble::AppState;

#[derive(Debug, Parser)]
#[command(name = "ser-ensemble", version, about = "Speech emotion recognition ensemble service")]
struct Args {
    /// Config file (TOML)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Port to listen on
    #[arg(long, env = "SER_PORT")]
    port: Option<u16>,

    /// Address to bind
    #[arg(long = "bind", env = "SER_BIND")]
    bind_address: Option<String>,

    /// Directory containing the model files
    #[arg(long, env = "SER_MODEL_DIR")]
    model_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config_path = resolve_config_path(args.config.as_deref());
    let mut config = ServiceConfig::load(config_path.as_deref())
        .context("Failed to load configuration")?;
    config.apply_overrides(args.port, args.bind_address, args.model_dir);
    config.validate().context("Invalid configuration")?;

    init_tracing(&config.logging).context("Failed to initialise logging")?;

    info!("Starting ser-ensemble (speech emotion recognition)");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));
    match &config_path {
        Some(path) => info!("Config: {}", path.display()),
        None => warn!("No config file found, using built-in defaults"),
    }
    info!("Model directory: {}", config.model_dir.display());

    // Models are loaded once and shared by every request
    let model_config = config.clone();
    let pipeline = tokio::task::spawn_blocking(move || EnsemblePipeline::load(&model_config))
        .await
        .context("Model loading task failed")?
        .context("Failed to load models")?;
    info!(
        sequence_length = pipeline.sequence_length(),
        "Ensemble ready"
    );

    let address = config.listen_address();
    let state = AppState::new(pipeline, config);
    let app = ser_ensemble::build_router(state);

    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind {}", address))?;
    info!("Listening on http://{}", address);
    info!("Upload page: http://{}/api/", address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
