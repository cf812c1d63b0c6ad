//! edugen-ai - structured model-invocation service
//!
//! Serves the task catalog, video enrichment and media generation over
//! HTTP. Each request runs under its own deadline; shutdown cancels every
//! in-flight call, including operation polling.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use edugen_ai::config::ServiceSettings;
use edugen_ai::enrich::YouTubeSearchClient;
use edugen_ai::model::GeminiClient;
use edugen_ai::{AppState, Backends, PipelineOptions};
use edugen_common::config::{load_toml_config, resolve_config_path};
use edugen_common::events::EventBus;

const MODULE_NAME: &str = "edugen-ai";

/// Command-line arguments for edugen-ai
#[derive(Parser, Debug)]
#[command(name = "edugen-ai")]
#[command(about = "Structured model-invocation service for edugen")]
#[command(version)]
struct Args {
    /// TOML config file (overrides EDUGEN_CONFIG and the default location)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Address to bind (overrides server.bind_address)
    #[arg(short, long, env = "EDUGEN_AI_BIND")]
    bind: Option<String>,

    /// Port to listen on (overrides server.port)
    #[arg(short, long, env = "EDUGEN_AI_PORT")]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config_path = resolve_config_path(args.config.as_deref(), MODULE_NAME);
    let toml_config = match &config_path {
        Some(path) => load_toml_config(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => Default::default(),
    };

    // Initialize tracing: RUST_LOG wins over the configured level
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| toml_config.logging.level.as_str().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(
        "Starting {} v{} ({}, {} build)",
        MODULE_NAME,
        env!("CARGO_PKG_VERSION"),
        env!("EDUGEN_GIT_HASH"),
        env!("EDUGEN_BUILD_PROFILE")
    );
    match &config_path {
        Some(path) => info!("Config: {}", path.display()),
        None => warn!("No config directory on this platform; using defaults"),
    }

    let settings = ServiceSettings::resolve(&toml_config);
    let bind_address = args.bind.unwrap_or_else(|| settings.bind_address.clone());
    let port = args.port.unwrap_or(settings.port);

    let gemini = Arc::new(
        GeminiClient::new(settings.gemini.clone()).context("Failed to build Gemini client")?,
    );
    let youtube = Arc::new(
        YouTubeSearchClient::new(settings.search_base_url.clone(), settings.youtube_api_key.clone())
            .context("Failed to build YouTube client")?,
    );
    info!(
        text_model = %settings.gemini.text_model,
        speech_model = %settings.gemini.speech_model,
        video_model = %settings.gemini.video_model,
        "Model backend configured"
    );

    let event_bus = EventBus::new(100);
    let backends = Backends {
        model: gemini.clone(),
        operations: gemini,
        search: youtube,
    };
    let state = AppState::new(backends, PipelineOptions::from(&settings), event_bus)
        .context("Failed to build task catalog")?;
    info!("Task catalog loaded: {} tasks", state.tasks.len());

    let shutdown = state.shutdown.clone();
    let app = edugen_ai::build_router(state);

    let addr: SocketAddr = format!("{}:{}", bind_address, port)
        .parse()
        .with_context(|| format!("Invalid bind address {}:{}", bind_address, port))?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;
    info!("Listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown))
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Wait for Ctrl+C or SIGTERM, then cancel in-flight pipeline calls
async fn shutdown_signal(shutdown: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }

    shutdown.cancel();
}
