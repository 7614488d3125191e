//! newscheck Server
//!
//! Serves the fake news detector over HTTP and provides offline tooling for
//! model artifacts.

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use metrics_exporter_prometheus::PrometheusHandle;
use newscheck_classifiers::{ArtifactFormat, Detector};
use newscheck_server::{build_router, AppState, ServerConfig};
use std::net::SocketAddr;
use std::path::PathBuf;
use tokio::signal;
use tracing::{error, info, warn};

#[derive(Parser, Debug)]
#[command(name = "newscheck-server")]
#[command(about = "Fake news detection API", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP server (default)
    Serve(ServeArgs),

    /// Train the fallback model and write it as an artifact
    ExportFallback {
        /// Output artifact path
        #[arg(short, long)]
        output: PathBuf,

        /// Artifact format (plain or compressed), inferred from the extension if omitted
        #[arg(short, long)]
        format: Option<ArtifactFormat>,
    },

    /// Re-encode an artifact between plain and compressed formats
    Convert {
        /// Input artifact path
        #[arg(short, long)]
        input: PathBuf,

        /// Output artifact path
        #[arg(short, long)]
        output: PathBuf,
    },
}

#[derive(Args, Debug, Default)]
struct ServeArgs {
    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Listen address
    #[arg(short, long)]
    listen: Option<String>,

    /// Listen port
    #[arg(short = 'P', long)]
    port: Option<u16>,

    /// Model artifact to try before the default locations
    #[arg(short, long)]
    model: Option<PathBuf>,

    /// Serve the static default response instead of training a fallback model
    #[arg(long)]
    no_fallback: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.verbose);

    match cli.command.unwrap_or(Command::Serve(ServeArgs::default())) {
        Command::Serve(args) => serve(args).await,
        Command::ExportFallback { output, format } => {
            newscheck_server::commands::export_fallback(&output, format)?;
            info!("Fallback model written to {}", output.display());
            Ok(())
        }
        Command::Convert { input, output } => {
            newscheck_server::commands::convert(&input, &output)?;
            info!("Converted {} -> {}", input.display(), output.display());
            Ok(())
        }
    }
}

async fn serve(args: ServeArgs) -> Result<()> {
    info!("Starting newscheck server");

    let mut config = ServerConfig::load(args.config.as_deref())?;
    if let Some(listen) = args.listen {
        config.listen = listen;
    }
    if let Some(port) = args.port {
        config.port = port;
    }
    if let Some(model) = args.model {
        config.detector = config.detector.with_model_path(model);
    }
    if args.no_fallback {
        config.detector.fallback.enabled = false;
    }
    info!("Configuration loaded successfully");
    info!("Model candidates: {}", config.detector.model_paths.len());

    let detector_config = config.detector.clone();
    let detector = match tokio::task::spawn_blocking(move || Detector::new(&detector_config)).await? {
        Ok(detector) => {
            info!(mode = ?detector.mode(), shape = detector.shape(), "✓ Detector initialized");
            Some(detector)
        }
        Err(e) => {
            error!(error = %e, "✗ Detector unavailable, serving default responses");
            None
        }
    };

    let mut state = AppState::new(detector);
    if config.metrics.enabled {
        state = state.with_metrics(init_metrics()?);
    }

    let app = build_router(state, &config.cors);

    let addr: SocketAddr = config.bind_address().parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            shutdown_signal().await;
            warn!("Shutdown signal received, stopping server...");
        })
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

/// Listen for shutdown signals (SIGTERM, SIGINT)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
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
                error!(error = %e, "Failed to install SIGTERM handler");
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

/// Initialize tracing/logging
fn init_tracing(verbose: bool) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = if verbose {
        EnvFilter::new("newscheck=debug,tower_http=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("newscheck=info"))
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
        "newscheck_requests_total",
        "Total number of requests by endpoint"
    );
    metrics::describe_counter!(
        "newscheck_predictions_total",
        "Total number of predictions by class"
    );
    metrics::describe_counter!(
        "newscheck_inference_failures_total",
        "Predictions that fell back to the default result"
    );
    metrics::describe_histogram!(
        "newscheck_prediction_latency_us",
        metrics::Unit::Microseconds,
        "Per-text prediction latency in microseconds"
    );

    info!("Metrics exporter initialized");
    Ok(handle)
}
