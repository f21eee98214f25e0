//! History RAG · chat & quiz front end
//!
//! - Axum HTTP + WebSocket server; one in-memory session per browser tab
//! - Talks to the RAG backend (`/api/v1/chat`, `/api/v1/generate_quiz`) over HTTP
//! - Static browser shell (./static/index.html) that draws the server-pushed view
//!
//! Important env variables:
//!   PORT                 : u16 (default 3000)
//!   RAG_BACKEND_URL      : default "http://127.0.0.1:8000"
//!   RAG_TIMEOUT_SECS     : per-request timeout towards the backend (default 60)
//!   FRONTEND_CONFIG_PATH : path to TOML config (backend, quiz limits, greeting)
//!   LOG_LEVEL            : tracing filter, e.g. "debug" or full directives
//!   LOG_FORMAT           : "pretty" (default) or "json"

mod telemetry;
mod config;
mod contract;
mod client;
mod domain;
mod conversation;
mod quiz;
mod session;
mod view;
mod state;
mod protocol;
mod routes;
#[cfg(test)]
mod testing;

use std::{net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;
use tracing::info;

use crate::config::AppConfig;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
  telemetry::init_tracing();

  let config = AppConfig::load();
  let addr = SocketAddr::from(([0, 0, 0, 0], config.port));

  let state = Arc::new(AppState::new(config)?);
  let app = build_router(state);

  let listener = TcpListener::bind(addr).await?;
  info!(target: "rag_frontend", %addr, "HTTP server listening");
  axum::serve(listener, app)
    .with_graceful_shutdown(shutdown_signal())
    .await?;
  Ok(())
}

async fn shutdown_signal() {
  if let Err(e) = tokio::signal::ctrl_c().await {
    tracing::error!(target: "rag_frontend", error = %e, "Failed to listen for ctrl-c");
    std::future::pending::<()>().await;
  }
  info!(target: "rag_frontend", "Shutdown requested");
}
