//! HTTP endpoint handlers. These are thin wrappers that forward to core
//! logic. Each handler is instrumented; auth is an opaque bearer token
//! resolved against the identity store.

use std::sync::Arc;

use axum::{
  extract::{Path, Query, State},
  http::{header, HeaderMap, StatusCode},
  Json,
};
use tracing::{info, instrument};

use crate::domain::Role;
use crate::logic::*;
use crate::protocol::*;
use crate::state::AppState;

type ApiError = (StatusCode, Json<ErrorOut>);

fn err(status: StatusCode, message: impl Into<String>) -> ApiError {
  (status, Json(ErrorOut { error: message.into() }))
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
  headers
    .get(header::AUTHORIZATION)
    .and_then(|v| v.to_str().ok())
    .and_then(|v| v.strip_prefix("Bearer "))
    .map(|t| t.trim().to_string())
    .filter(|t| !t.is_empty())
}

/// Token -> user id, or 401.
async fn require_user(state: &AppState, headers: &HeaderMap) -> Result<String, ApiError> {
  let token =
    bearer_token(headers).ok_or_else(|| err(StatusCode::UNAUTHORIZED, "Missing bearer token."))?;
  state
    .identity
    .current_user(&token)
    .await
    .ok_or_else(|| err(StatusCode::UNAUTHORIZED, "Invalid or expired token."))
}

/// Token -> admin user id, or 401/403.
async fn require_admin(state: &AppState, headers: &HeaderMap) -> Result<String, ApiError> {
  let user_id = require_user(state, headers).await?;
  if state.role_of(&user_id).await != Role::Admin {
    return Err(err(StatusCode::FORBIDDEN, "Admin role required."));
  }
  Ok(user_id)
}

#[instrument(level = "info")]
pub async fn http_health() -> Json<HealthOut> {
  Json(HealthOut { ok: true })
}

// ---- auth ----

#[instrument(level = "info", skip(state, body), fields(email = %body.email))]
pub async fn http_register(
  State(state): State<Arc<AppState>>,
  Json(body): Json<RegisterIn>,
) -> Result<Json<AuthOut>, ApiError> {
  register(&state, &body.email, &body.password, &body.display_name)
    .await
    .map(Json)
    .map_err(|e| err(StatusCode::BAD_REQUEST, e))
}

#[instrument(level = "info", skip(state, body), fields(email = %body.email))]
pub async fn http_login(
  State(state): State<Arc<AppState>>,
  Json(body): Json<LoginIn>,
) -> Result<Json<AuthOut>, ApiError> {
  login(&state, &body.email, &body.password)
    .await
    .map(Json)
    .map_err(|e| err(StatusCode::UNAUTHORIZED, e))
}

#[instrument(level = "info", skip_all)]
pub async fn http_logout(
  State(state): State<Arc<AppState>>,
  headers: HeaderMap,
) -> Result<Json<OkOut>, ApiError> {
  if let Some(token) = bearer_token(&headers) {
    logout(&state, &token).await;
  }
  Ok(Json(OkOut { ok: true }))
}

#[instrument(level = "info", skip_all)]
pub async fn http_me(
  State(state): State<Arc<AppState>>,
  headers: HeaderMap,
) -> Result<Json<ProfileOut>, ApiError> {
  let user_id = require_user(&state, &headers).await?;
  let profile = state
    .get_profile(&user_id)
    .await
    .ok_or_else(|| err(StatusCode::NOT_FOUND, "No profile for this account."))?;
  Ok(Json(profile_to_out(&profile)))
}

// ---- practice flow ----

/// Start a session. The bearer token is optional: without one the session
/// is anonymous and its results are discarded at the end.
#[instrument(level = "info", skip_all)]
pub async fn http_start_session(
  State(state): State<Arc<AppState>>,
  headers: HeaderMap,
) -> Result<Json<SessionOut>, ApiError> {
  let user_id = match bearer_token(&headers) {
    Some(token) => Some(
      state
        .identity
        .current_user(&token)
        .await
        .ok_or_else(|| err(StatusCode::UNAUTHORIZED, "Invalid or expired token."))?,
    ),
    None => None,
  };
  let session = start_practice(&state, user_id).await;
  info!(target: "practice", session = %session.session_id, "HTTP practice session started");
  Ok(Json(session))
}

#[instrument(level = "info", skip(state), fields(session = %id))]
pub async fn http_get_session(
  State(state): State<Arc<AppState>>,
  Path(id): Path<String>,
) -> Result<Json<SessionOut>, ApiError> {
  practice_snapshot(&state, &id)
    .await
    .map(Json)
    .map_err(|e| err(StatusCode::NOT_FOUND, e))
}

#[instrument(level = "info", skip(state, body), fields(session = %id, index = body.answer_index))]
pub async fn http_post_answer(
  State(state): State<Arc<AppState>>,
  Path(id): Path<String>,
  Json(body): Json<AnswerIn>,
) -> Result<Json<AnswerOut>, ApiError> {
  let result = submit_answer(&state, &id, body.answer_index)
    .await
    .map_err(|e| err(StatusCode::NOT_FOUND, e))?;
  info!(target: "practice", session = %id, accepted = result.accepted, correct = result.correct, "HTTP answer evaluated");
  Ok(Json(result))
}

#[instrument(level = "info", skip(state), fields(session = %id))]
pub async fn http_post_next(
  State(state): State<Arc<AppState>>,
  Path(id): Path<String>,
) -> Result<Json<SessionOut>, ApiError> {
  next_question(&state, &id)
    .await
    .map(Json)
    .map_err(|e| err(StatusCode::NOT_FOUND, e))
}

#[instrument(level = "info", skip(state), fields(session = %id))]
pub async fn http_post_end(
  State(state): State<Arc<AppState>>,
  Path(id): Path<String>,
) -> Result<Json<crate::domain::SessionSummary>, ApiError> {
  end_practice(&state, &id)
    .await
    .map(Json)
    .map_err(|e| err(StatusCode::NOT_FOUND, e))
}

// ---- catalog & reports ----

#[instrument(level = "info", skip(state))]
pub async fn http_get_questions(
  State(state): State<Arc<AppState>>,
  Query(q): Query<QuestionsQuery>,
) -> Json<Vec<QuestionOut>> {
  Json(list_questions(&state, q.topic.as_deref()).await)
}

#[instrument(level = "info", skip(state))]
pub async fn http_get_exams(
  State(state): State<Arc<AppState>>,
) -> Json<Vec<crate::domain::ExamDefinition>> {
  Json(state.exams.as_ref().clone())
}

#[instrument(level = "info", skip_all)]
pub async fn http_get_reports(
  State(state): State<Arc<AppState>>,
  headers: HeaderMap,
) -> Result<Json<ReportOut>, ApiError> {
  let user_id = require_user(&state, &headers).await?;
  build_report(&state, &user_id)
    .await
    .map(Json)
    .map_err(|e| err(StatusCode::NOT_FOUND, e))
}

// ---- admin ----

#[instrument(level = "info", skip_all)]
pub async fn http_admin_users(
  State(state): State<Arc<AppState>>,
  headers: HeaderMap,
) -> Result<Json<Vec<AdminUserOut>>, ApiError> {
  require_admin(&state, &headers).await?;
  Ok(Json(admin_list_users(&state).await))
}

#[instrument(level = "info", skip(state, headers, body), fields(topic = %body.topic))]
pub async fn http_admin_add_question(
  State(state): State<Arc<AppState>>,
  headers: HeaderMap,
  Json(body): Json<AdminQuestionIn>,
) -> Result<Json<QuestionOut>, ApiError> {
  require_admin(&state, &headers).await?;
  admin_add_question(&state, body)
    .await
    .map(Json)
    .map_err(|e| err(StatusCode::BAD_REQUEST, e))
}
