//! AcePrep · Exam Prep Backend
//!
//! - Axum HTTP + WebSocket API
//! - In-memory identity/profile stores and question pool
//! - Static SPA fallback (./static/index.html)
//!
//! Important env variables:
//!   PORT               : u16 (default 3000)
//!   QUESTION_BANK_PATH : path to TOML question bank (questions + exams)
//!   ADMIN_EMAIL        : with ADMIN_PASSWORD, bootstraps an admin account
//!   ADMIN_PASSWORD     : see above
//!   LOG_LEVEL          : tracing filter, e.g. "debug" or full directives
//!   LOG_FORMAT         : "pretty" (default) or "json"

use std::{net::SocketAddr, sync::Arc};

use tokio::net::TcpListener;
use tracing::{info, instrument, warn};

use aceprep_backend::routes::build_router;
use aceprep_backend::state::AppState;
use aceprep_backend::telemetry;

#[instrument(level = "info", skip_all)]
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
  telemetry::init_tracing();

  // Build shared application state (question pool, sessions, stores).
  let state = Arc::new(AppState::new());

  // Optional admin bootstrap from env.
  if let (Ok(email), Ok(password)) = (std::env::var("ADMIN_EMAIL"), std::env::var("ADMIN_PASSWORD")) {
    if let Err(e) = state.bootstrap_admin(&email, &password, "Administrator").await {
      warn!(target: "auth", error = %e, "Admin bootstrap failed");
    }
  }

  // Build the HTTP router with routes, CORS and tracing layers.
  let app = build_router(state.clone());

  // Read port from env or default to 3000.
  let addr: SocketAddr = std::env::var("PORT")
    .ok()
    .and_then(|p| p.parse::<u16>().ok())
    .map(|port| SocketAddr::from(([0, 0, 0, 0], port)))
    .unwrap_or_else(|| SocketAddr::from(([0, 0, 0, 0], 3000)));

  let listener = TcpListener::bind(addr).await?;
  info!(target: "aceprep_backend", %addr, "HTTP server listening");
  axum::serve(listener, app).await?;
  Ok(())
}
