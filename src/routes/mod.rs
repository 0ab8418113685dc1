//! Router assembly: HTTP endpoints, WebSocket upgrade, static files, CORS,
//! and HTTP tracing.

use std::sync::Arc;

use axum::{
  routing::{get, post},
  Router,
};
use tower_http::{
  cors::{Any, CorsLayer},
  services::{ServeDir, ServeFile},
  trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use crate::state::AppState;

pub mod http;
pub mod ws;

/// Build the application router with:
/// - WebSocket at `/ws` (practice flow mirror)
/// - REST-ish API under `/api/v1/...`
/// - Static SPA from `./static` with index fallback
/// - CORS (allow any origin/method/headers) – adjust for production if needed
/// - HTTP trace layer (per-request spans w/ method, path, status, latency)
pub fn build_router(state: Arc<AppState>) -> Router {
  // Static files with SPA fallback
  let static_service = ServeDir::new("./static")
    .append_index_html_on_directories(true)
    .not_found_service(ServeFile::new("./static/index.html"));

  Router::new()
    // WebSocket
    .route("/ws", get(ws::ws_upgrade))
    // HTTP API
    .route("/api/v1/health", get(http::http_health))
    .route("/api/v1/auth/register", post(http::http_register))
    .route("/api/v1/auth/login", post(http::http_login))
    .route("/api/v1/auth/logout", post(http::http_logout))
    .route("/api/v1/auth/me", get(http::http_me))
    .route("/api/v1/practice/session", post(http::http_start_session))
    .route("/api/v1/practice/session/:id", get(http::http_get_session))
    .route("/api/v1/practice/session/:id/answer", post(http::http_post_answer))
    .route("/api/v1/practice/session/:id/next", post(http::http_post_next))
    .route("/api/v1/practice/session/:id/end", post(http::http_post_end))
    .route("/api/v1/questions", get(http::http_get_questions))
    .route("/api/v1/exams", get(http::http_get_exams))
    .route("/api/v1/reports", get(http::http_get_reports))
    .route("/api/v1/admin/users", get(http::http_admin_users))
    .route("/api/v1/admin/questions", post(http::http_admin_add_question))
    // State + CORS + HTTP tracing
    .with_state(state)
    .layer(
      CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any),
    )
    .layer(
      TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
        .on_request(DefaultOnRequest::new().level(Level::INFO))
        .on_response(DefaultOnResponse::new().level(Level::INFO)),
    )
    // Frontend fallback
    .fallback_service(static_service)
}
