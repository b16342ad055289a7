//! SupportDesk Server
//!
//! Customer-support assistant: triage of inbound messages and grounded
//! reply composition over HTTP.

use anyhow::Result;
use clap::Parser;
use metrics_exporter_prometheus::PrometheusHandle;
use std::net::SocketAddr;
use supportdesk_server::{create_router, AppState, Settings};
use tokio::signal;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "supportdesk-server")]
#[command(about = "SupportDesk triage and reply service", long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "supportdesk.yaml")]
    config: String,

    /// Listen address (overrides configuration)
    #[arg(short = 'l', long)]
    listen: Option<String>,

    /// Listen port (overrides configuration)
    #[arg(short = 'P', long)]
    port: Option<u16>,

    /// Use heuristic triage and template replies
    #[arg(long)]
    dummy: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.verbose);

    info!("Starting SupportDesk server");

    let mut settings = Settings::load(&cli.config)?;
    if let Some(listen) = cli.listen {
        settings.listen = listen;
    }
    if let Some(port) = cli.port {
        settings.port = port;
    }
    if cli.dummy {
        settings.use_dummy_ai = true;
    }
    info!("Configuration loaded (mode: {})", settings.mode());
    info!("Model: {} via {}", settings.openai_model, settings.openai_base_url);
    if !settings.use_dummy_ai && !settings.has_api_key() {
        warn!("OPENAI_API_KEY is not set; triage and reply requests will fail");
    }

    let metrics_handle = init_metrics()?;

    let addr: SocketAddr = format!("{}:{}", settings.listen, settings.port).parse()?;
    let state = AppState::from_settings(settings, Some(metrics_handle))?;
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

/// Listen for shutdown signals (SIGTERM, SIGINT)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {}", e);
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
                warn!("Failed to install SIGTERM handler: {}", e);
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

    warn!("Shutdown signal received, stopping server...");
}

/// Initialize tracing/logging
fn init_tracing(verbose: bool) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = if verbose {
        EnvFilter::new("supportdesk=debug,tower_http=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("supportdesk=info"))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Initialize metrics exporter and return handle for rendering
fn init_metrics() -> Result<PrometheusHandle> {
    use metrics_exporter_prometheus::PrometheusBuilder;

    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| anyhow::anyhow!("Failed to install metrics: {}", e))?;

    metrics::describe_counter!(
        "supportdesk_requests_total",
        "Total number of requests by endpoint"
    );
    metrics::describe_counter!(
        "supportdesk_errors_total",
        "Total number of failed requests by endpoint and error kind"
    );
    metrics::describe_histogram!(
        "supportdesk_stage_latency_us",
        metrics::Unit::Microseconds,
        "Pipeline stage latency in microseconds"
    );

    info!("Metrics exporter initialized");
    Ok(handle)
}
