use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::signal;
use tracing::{debug, error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use sigint_core::{
    load_config, validate_config, DiscoveredSignal, DiscoveryCallback, GpsFix, Medium,
    ProcessAudioBackend, SignalOrchestrator, SystemRunner,
};
use sigint_server::{api::create_router, ingest::create_ingest_system, state::AppState};

/// Buffer size for the ingest queue
const INGEST_BUFFER_SIZE: usize = 2000;

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

    // Determine config path
    let config_path = std::env::var("SIGINT_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.toml"));

    // Load configuration
    info!("Loading configuration from {:?}", config_path);
    let config = load_config(&config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;

    // Validate configuration
    validate_config(&config).context("Configuration validation failed")?;

    info!("Configuration loaded successfully");
    info!("Identity path: {:?}", config.node.identity_path);
    info!("Auto-install: {}", config.capabilities.auto_install);

    // Discovery forwarding
    let (callback, forwarder_handle): (DiscoveryCallback, _) = match &config.ingest {
        Some(ingest_config) => {
            let (handle, forwarder) = create_ingest_system(ingest_config, INGEST_BUFFER_SIZE);
            let task = tokio::spawn(forwarder.run());
            (handle.callback(), Some(task))
        }
        None => {
            info!("No ingest endpoint configured, discoveries are only logged");
            let callback: DiscoveryCallback =
                Arc::new(|signal: &DiscoveredSignal, medium: Medium, _gps: Option<&GpsFix>| {
                    debug!(%medium, ?signal, "Discovery");
                });
            (callback, None)
        }
    };

    let orchestrator = Arc::new(SignalOrchestrator::new(
        config.clone(),
        Arc::new(SystemRunner::new()),
        Arc::new(ProcessAudioBackend::new()),
        callback,
    ));

    let report = orchestrator.start().await;
    info!(
        "Scanner started ({} of {} tools available)",
        report.tools.iter().filter(|t| t.available).count(),
        report.tools.len()
    );

    // Create app state
    let state = Arc::new(AppState::new(config.clone(), Arc::clone(&orchestrator)));

    // Create router
    let app = create_router(state);

    // Start server
    let addr = SocketAddr::new(config.server.host, config.server.port);
    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Stopping scanner...");
    orchestrator.stop().await;
    info!("Scanner stopped");

    // The orchestrator holds the last ingest handle through its callback.
    // Dropping it closes the queue so the forwarder flushes and exits.
    drop(orchestrator);
    if let Some(task) = forwarder_handle {
        let _ = task.await;
        info!("Ingest forwarder stopped");
    }

    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
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
