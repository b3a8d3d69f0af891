use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use codehint::api::{create_router, AppState};
use codehint::config::{Config, LogFormat};
use codehint::llm::ProviderChain;

#[derive(Parser)]
#[command(name = "codehint")]
#[command(about = "Hint and explanation backend for the LeetCode AI Assistant extension")]
struct Args {
    /// Address to bind, overrides CODEHINT_HOST
    #[arg(long)]
    host: Option<String>,

    /// Port to bind, overrides CODEHINT_PORT
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    dotenvy::dotenv().ok();

    let mut config = Config::from_env();
    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }

    init_tracing(config.server.log_format);

    if config.providers.is_empty() {
        tracing::warn!(
            "LLM_MODEL is not set - hint and explain requests will fail until a provider is configured"
        );
    }
    for provider in &config.providers {
        tracing::info!("Initializing LLM provider: {}...", provider.model);
    }
    let chain = ProviderChain::from_configs(&config.providers);
    for status in chain.status() {
        if !status.available {
            tracing::warn!(provider = %status.name, "LLM provider unavailable");
        }
    }

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let state = AppState::new(config, chain);
    let app = create_router(state);

    tracing::info!("Codehint starting on http://{}", addr);
    tracing::info!("  Health check: http://{}/health", addr);
    tracing::info!("  API docs:     http://{}/api/docs", addr);
    tracing::info!("  OpenAPI spec: http://{}/api/openapi.json", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Codehint stopped");
    Ok(())
}

fn init_tracing(format: LogFormat) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "codehint=info,tower_http=debug".into());

    let (pretty, json) = match format {
        LogFormat::Pretty => (Some(tracing_subscriber::fmt::layer()), None),
        LogFormat::Json => (None, Some(tracing_subscriber::fmt::layer().json())),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(pretty)
        .with(json)
        .init();
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
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

    tracing::info!("Shutdown signal received, draining connections...");
}
