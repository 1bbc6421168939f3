//! Vehicle diagnostics chat server
//!
//! # Usage
//!
//! ```bash
//! # Serve on 0.0.0.0:5000 with ./data/dtc_dataset.csv
//! cargo run --release
//!
//! # Custom table and port
//! PORT=8080 ./vehicle-diag --dtc-table /srv/dtc.csv
//! ```
//!
//! # Environment Variables
//!
//! - `COHERE_API_KEY`: chat API credential (also read from `.env`); without
//!   it replies come from the built-in template
//! - `PORT`: listen port (default: 5000)
//! - `DIAG_CONFIG`: path to a `diag_config.toml`
//! - `DIAG_CORS_ORIGINS`: comma-separated allowed origins (default: any)
//! - `RUST_LOG`: logging level (default: info)

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use vehicle_diag::api::{create_app, AppState};
use vehicle_diag::config::{self, defaults, AssistantConfig};
use vehicle_diag::{ChatService, CohereBackend, DtcTable, LlmBackend};

// ============================================================================
// CLI Arguments
// ============================================================================

#[derive(Parser, Debug)]
#[command(name = "vehicle-diag")]
#[command(about = "Vehicle diagnostics chat assistant")]
#[command(version)]
struct CliArgs {
    /// Override the server address (default: "0.0.0.0:5000")
    #[arg(short, long)]
    addr: Option<String>,

    /// Path to the DTC table CSV
    #[arg(long, value_name = "PATH")]
    dtc_table: Option<PathBuf>,

    /// Path to a diag_config.toml (takes precedence over DIAG_CONFIG)
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

/// Listen address: `--addr`, else the configured address with its port
/// replaced by `PORT` when that is a valid port number.
fn resolve_addr(cli_addr: Option<String>, configured: &str, port_env: Option<&str>) -> String {
    if let Some(addr) = cli_addr {
        return addr;
    }
    match port_env.map(str::trim).and_then(|p| p.parse::<u16>().ok()) {
        Some(port) => {
            let host = configured
                .rsplit_once(':')
                .map_or(configured, |(host, _)| host);
            format!("{host}:{port}")
        }
        None => configured.to_string(),
    }
}

fn load_config(path: Option<&PathBuf>) -> Result<AssistantConfig> {
    match path {
        Some(p) => AssistantConfig::load_from_file(p)
            .with_context(|| format!("Failed to load config {}", p.display())),
        None => Ok(AssistantConfig::load()),
    }
}

fn build_llm_backend(cfg: &AssistantConfig) -> Result<Option<Arc<dyn LlmBackend>>> {
    match CohereBackend::from_env(&cfg.llm).context("Failed to build chat API client")? {
        Some(backend) => {
            info!(model = backend.model(), "LLM backend: Cohere");
            Ok(Some(Arc::new(backend)))
        }
        None => {
            warn!(
                "{} not set, replies will use the built-in template",
                defaults::API_KEY_ENV_VAR
            );
            Ok(None)
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    if let Ok(path) = dotenvy::dotenv() {
        info!(path = %path.display(), "Loaded environment from .env");
    }

    let args = CliArgs::parse();

    let mut assistant_config = load_config(args.config.as_ref())?;
    if let Some(table) = args.dtc_table {
        assistant_config.dtc.table_path = table;
    }
    config::init(assistant_config);
    let cfg = config::get();

    let port_env = std::env::var(defaults::PORT_ENV_VAR).ok();
    let server_addr = resolve_addr(args.addr, &cfg.server.addr, port_env.as_deref());

    info!("Vehicle Diagnostics Assistant v{}", env!("CARGO_PKG_VERSION"));

    // Missing table or code column aborts startup
    let dtc = DtcTable::load(&cfg.dtc.table_path)
        .with_context(|| format!("Failed to load DTC table {}", cfg.dtc.table_path.display()))?;

    let llm = build_llm_backend(cfg)?;
    let chat = ChatService::new(Arc::new(dtc), llm, cfg.thresholds);
    let app = create_app(AppState::new(Arc::new(chat)));

    let listener = tokio::net::TcpListener::bind(&server_addr)
        .await
        .with_context(|| format!("Failed to bind to {server_addr}"))?;
    info!("HTTP server listening on {}", server_addr);

    // Graceful shutdown via Ctrl+C
    let cancel_token = CancellationToken::new();
    let shutdown_token = cancel_token.clone();
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        info!("Received Ctrl+C, initiating shutdown...");
        shutdown_token.cancel();
    });

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            cancel_token.cancelled().await;
        })
        .await
        .context("HTTP server error")?;

    info!("Server stopped");
    Ok(())
}
