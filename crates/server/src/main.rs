use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cinebridge_core::searcher::providers;
use cinebridge_core::{
    load_config, validate_config, CinemetaClient, LibrqbitEngine, MetadataCatalog, ProgressHub,
    QuotaEnforcer, SanitizedConfig, SessionManager, SourceAggregator, SubtitleAggregator,
    TorrentEngine,
};
use cinebridge_server::api::settings::apply_settings;
use cinebridge_server::{create_router, AppState};

/// Application version
const VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // An explicitly named config file must exist
    let (config_path, required) = match std::env::var("CINEBRIDGE_CONFIG") {
        Ok(path) => (PathBuf::from(path), true),
        Err(_) => (PathBuf::from("config.toml"), false),
    };

    info!("cinebridge {} loading configuration from {:?}", VERSION, config_path);
    let config = load_config(&config_path, required)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;

    validate_config(&config).context("Configuration validation failed")?;

    let config_json = serde_json::to_string(&SanitizedConfig::from(&config)).unwrap_or_default();
    let config_hash = format!("{:x}", Sha256::digest(config_json.as_bytes()));
    info!(
        config_hash = &config_hash[..16],
        download_path = %config.engine.download_path.display(),
        "Configuration loaded successfully"
    );

    // Torrent providers
    let providers = providers::from_config(&config.providers)
        .context("Failed to build torrent providers")?;
    info!(
        "Source providers: {}",
        providers
            .iter()
            .map(|p| p.kind().as_str())
            .collect::<Vec<_>>()
            .join(", ")
    );
    let aggregator = SourceAggregator::new(providers);

    // Embedded BitTorrent engine
    let engine: Arc<dyn TorrentEngine> = Arc::new(
        LibrqbitEngine::new(&config.engine)
            .await
            .context("Failed to initialize torrent engine")?,
    );
    info!("Torrent engine initialized: {}", engine.name());

    let sessions = Arc::new(SessionManager::new(
        engine,
        ProgressHub::default(),
        &config.stream,
    ));
    let quota = Arc::new(QuotaEnforcer::new(
        config.engine.download_path.clone(),
        config.cache.limit_bytes,
    ));

    let subtitles = SubtitleAggregator::from_config(&config.subtitles, &config.providers)
        .context("Failed to build subtitle backends")?;
    info!("Subtitle backends: {}", subtitles.provider_count());

    let catalog: Arc<dyn MetadataCatalog> = Arc::new(
        CinemetaClient::new(&config.catalog).context("Failed to build metadata catalog")?,
    );

    let addr = SocketAddr::new(config.server.host, config.server.port);
    let state = Arc::new(AppState::new(
        config,
        aggregator,
        Arc::clone(&sessions),
        Arc::clone(&quota),
        subtitles,
        catalog,
    ));

    // User settings override the configured cache and upload limits
    match apply_settings(&state).await {
        Ok(settings) => info!(
            cache_limit = settings.cache_limit_bytes,
            upload_limit = settings.upload_limit_bytes_per_sec,
            "User settings applied"
        ),
        Err(e) => warn!("Ignoring unreadable user settings: {}", e),
    }

    let app = create_router(state);

    info!("Starting server on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    // Sessions must be gone before the quota pass touches their files
    info!("Server shutting down...");
    sessions.shutdown().await;

    match quota.enforce_quota().await {
        Ok(report) => info!(
            removed = report.removed.len(),
            reclaimed = report.reclaimed(),
            "Exit quota pass complete"
        ),
        Err(e) => warn!("Exit quota pass failed: {}", e),
    }

    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
