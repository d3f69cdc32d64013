use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use firefly_core::{
    config_path_from_env, load_config, validate_config, write_json, Config, FireflyApp,
    ServerConfig,
};
use firefly_server::api::create_router;
use firefly_server::metrics::MetricsObserver;
use firefly_server::state::AppState;

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
    // Logs go to stderr so one-shot output on stdout stays clean
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config_path = config_path_from_env();

    info!(version = VERSION, "Loading configuration from {:?}", config_path);
    let config = load_config(&config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;

    validate_config(&config).context("Configuration validation failed")?;

    info!("Configuration loaded successfully");
    info!("Vocabulary: {:?}", config.sources.vocabulary);
    info!("Locators: {:?}", config.sources.locators);

    let shutdown = CancellationToken::new();

    match config.server.clone() {
        Some(server) => serve(config, server, shutdown).await,
        None => run_once(config, shutdown).await,
    }
}

/// Count once and print the top tokens to stdout.
async fn run_once(config: Config, shutdown: CancellationToken) -> Result<()> {
    let app = FireflyApp::new(config).context("Failed to create application")?;

    let signal_token = shutdown.clone();
    tokio::spawn(async move {
        shutdown_signal().await;
        info!("Shutdown signal received, cancelling run");
        signal_token.cancel();
    });

    let report = app.run(&shutdown).await.context("Run failed")?;

    write_json(&report, std::io::stdout().lock()).context("Failed to write result")?;

    info!(
        run_id = %report.summary.run_id,
        duration_ms = report.summary.duration_ms(),
        cancelled = report.summary.cancelled,
        "Run finished"
    );
    Ok(())
}

/// Serve the HTTP API until a shutdown signal arrives.
async fn serve(config: Config, server: ServerConfig, shutdown: CancellationToken) -> Result<()> {
    let app = FireflyApp::with_observer(config, Arc::new(MetricsObserver::default()))
        .context("Failed to create application")?;

    let state = Arc::new(AppState::new(app, shutdown.clone()));
    let router = create_router(state);

    let addr = SocketAddr::new(server.host, server.port);
    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    // Run server with graceful shutdown; in-flight runs are cancelled first
    axum::serve(listener, router)
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            info!("Server shutting down...");
            shutdown.cancel();
        })
        .await
        .context("Server error")?;

    info!("Server stopped");
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
