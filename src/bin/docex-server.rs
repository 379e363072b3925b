//! HTTP server binary for docex-serve.
//!
//! A thin shim over the library crate: loads `.env` and settings, installs
//! logging, optionally warms the pipeline up, then hands over to
//! [`docex_serve::server::serve`].

use anyhow::{Context, Result};
use clap::Parser;
use docex_serve::logging::{init_logging, LogFormat};
use docex_serve::server::{serve, AppState};
use docex_serve::{ServiceSettings, VlmMode};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(
    name = "docex-server",
    version,
    about = "Document extraction API with VLM support",
    long_about = "Serve document extraction over HTTP: PDF, image, Markdown and text uploads \
in, Markdown, tables, JSON, HTML or plain text out. Embedded pictures can be described by a \
local or remote vision-language model.",
    color = clap::ColorChoice::Auto
)]
struct Cli {
    /// Host to bind the server to.
    #[arg(long, env = "DOCEX_HOST", default_value = "0.0.0.0")]
    host: String,

    /// Port to bind the server to.
    #[arg(long, env = "DOCEX_PORT", default_value_t = 8000)]
    port: u16,

    /// Log level filter (overridden by RUST_LOG). Defaults to debug when the
    /// DEBUG setting is on, info otherwise.
    #[arg(long, env = "DOCEX_LOG_LEVEL")]
    log_level: Option<String>,

    /// Log format: pretty or json.
    #[arg(long, env = "DOCEX_LOG_FORMAT", default_value = "pretty")]
    log_format: LogFormat,

    /// Run one warmup extraction before accepting traffic.
    #[arg(long, env = "DOCEX_WARMUP")]
    warmup: bool,

    /// VLM mode used by the startup warmup: none, local or api.
    #[arg(long, env = "DOCEX_WARMUP_VLM_MODE", default_value = "none")]
    warmup_vlm_mode: VlmMode,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let settings = ServiceSettings::load().context("Failed to load settings")?;

    let level = cli
        .log_level
        .clone()
        .unwrap_or_else(|| if settings.debug { "debug" } else { "info" }.to_string());
    init_logging(&level, cli.log_format);
    info!("Loaded settings: {:?}", settings);

    let state = AppState::new(Arc::new(settings));

    if cli.warmup {
        match state.extractor.warmup(cli.warmup_vlm_mode, None).await {
            Ok(()) => info!("Startup warmup finished"),
            Err(e) => warn!("Startup warmup failed, continuing: {}", e),
        }
    }

    let addr: SocketAddr = format!("{}:{}", cli.host, cli.port)
        .parse()
        .with_context(|| format!("Invalid bind address {}:{}", cli.host, cli.port))?;
    serve(addr, state)
        .await
        .with_context(|| format!("Server on {} failed", addr))
}
