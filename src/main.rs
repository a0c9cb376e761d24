//! Lector · Reading Passage & Questions Backend
//!
//! - Axum HTTP API
//! - Passages calibrated to a Gunning Fog band (English) or generated in one shot
//! - Ollama (local) and Groq (hosted) text providers
//!
//! Important env variables:
//!   PORT                 : u16 (default 8000)
//!   DEFAULT_PROVIDER     : "ollama" (default) or "groq"
//!   OLLAMA_HOST          : default "http://localhost:11434"
//!   OLLAMA_MODEL         : default "gemma3:12b"
//!   GROQ_API_KEY         : required for Groq requests
//!   GROQ_BASE_URL        : default "https://api.groq.com/openai/v1"
//!   GROQ_MODEL           : default "llama-3.1-8b-instant"
//!   MAX_ITERATIONS       : calibration attempt cap (default 10)
//!   REQUEST_TIMEOUT_SECS : per provider call (default 120)
//!   APP_CONFIG_PATH      : path to TOML config (settings + prompts)
//!   LOG_LEVEL            : tracing filter, e.g. "debug" or full directives
//!   LOG_FORMAT           : "pretty" (default) or "json"

mod telemetry;
mod util;
mod domain;
mod config;
mod error;
mod readability;
mod prompts;
mod providers;
mod calibration;
mod passages;
mod questions;
mod catalog;
mod state;
mod protocol;
mod routes;

use std::{net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;
use tracing::{info, instrument, warn};

use crate::routes::build_router;
use crate::state::AppState;

#[instrument(level = "info", skip_all)]
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
  dotenv::dotenv().ok();
  telemetry::init_tracing();

  // Settings + shared HTTP client. Providers are built per request.
  let state = Arc::new(AppState::from_env()?);

  let app = build_router(state.clone());

  let addr: SocketAddr = std::env::var("PORT")
    .ok()
    .and_then(|p| p.parse::<u16>().ok())
    .map(|port| SocketAddr::from(([0, 0, 0, 0], port)))
    .unwrap_or_else(|| SocketAddr::from(([0, 0, 0, 0], 8000)));

  let listener = TcpListener::bind(addr).await?;
  info!(target: "lector_backend", %addr, "HTTP server listening");
  axum::serve(listener, app)
    .with_graceful_shutdown(shutdown_signal())
    .await?;
  info!(target: "lector_backend", "Server stopped");
  Ok(())
}

async fn shutdown_signal() {
  if let Err(e) = tokio::signal::ctrl_c().await {
    warn!(target: "lector_backend", error = %e, "Could not install ctrl-c handler");
    std::future::pending::<()>().await;
  }
  info!(target: "lector_backend", "Shutdown signal received");
}
