//! WebSocket upgrade + message loop. Each client message is parsed as JSON
//! and forwarded to core logic. We reply with a single JSON message per
//! request. WS sessions are anonymous; attributed practice goes through
//! the HTTP surface where the bearer token lives.

use std::sync::Arc;

use axum::{
  extract::{
    ws::{Message, WebSocket},
    State, WebSocketUpgrade,
  },
  response::IntoResponse,
};
use tracing::{debug, error, info, instrument};

use crate::logic::*;
use crate::protocol::{ClientWsMessage, ServerWsMessage};
use crate::state::AppState;
use crate::util::trunc_for_log;

#[instrument(level = "info", skip(state))]
pub async fn ws_upgrade(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> impl IntoResponse {
  info!(target: "aceprep_backend", "WebSocket upgrade requested");
  ws.on_upgrade(move |socket| handle_ws(socket, state))
}

#[instrument(level = "info", skip(socket, state))]
async fn handle_ws(mut socket: WebSocket, state: Arc<AppState>) {
  info!(target: "aceprep_backend", "WebSocket connected");
  while let Some(Ok(msg)) = socket.recv().await {
    match msg {
      Message::Text(txt) => {
        // Parse, dispatch, serialize response.
        debug!(target: "aceprep_backend", payload = %trunc_for_log(&txt, 256), "WS text frame received");
        let reply_msg = match serde_json::from_str::<ClientWsMessage>(&txt) {
          Ok(incoming) => handle_client_ws(incoming, &state).await,
          Err(e) => ServerWsMessage::Error { message: format!("Invalid JSON: {}", e) },
        };

        let out = serde_json::to_string(&reply_msg).unwrap_or_else(|e| {
          serde_json::json!({ "type": "error", "message": format!("Serialization error: {}", e) }).to_string()
        });

        if let Err(e) = socket.send(Message::Text(out)).await {
          error!(target: "aceprep_backend", error = %e, "WS send error");
          break;
        }
      }
      Message::Ping(payload) => {
        let _ = socket.send(Message::Pong(payload)).await;
      }
      Message::Close(_) => break,
      _ => {}
    }
  }
  info!(target: "aceprep_backend", "WebSocket disconnected");
}

#[instrument(level = "info", skip(state))]
async fn handle_client_ws(msg: ClientWsMessage, state: &AppState) -> ServerWsMessage {
  match msg {
    ClientWsMessage::Ping => ServerWsMessage::Pong,

    ClientWsMessage::StartSession => {
      let session = start_practice(state, None).await;
      tracing::info!(target: "practice", session = %session.session_id, "WS practice session started");
      ServerWsMessage::Session { session }
    }

    ClientWsMessage::SelectAnswer { session_id, answer_index } => {
      match submit_answer(state, &session_id, answer_index).await {
        Ok(result) => {
          tracing::info!(target: "practice", session = %session_id, accepted = result.accepted, correct = result.correct, "WS answer evaluated");
          ServerWsMessage::AnswerResult { result }
        }
        Err(e) => ServerWsMessage::Error { message: e },
      }
    }

    ClientWsMessage::NextQuestion { session_id } => match next_question(state, &session_id).await {
      Ok(session) => ServerWsMessage::Session { session },
      Err(e) => ServerWsMessage::Error { message: e },
    },

    ClientWsMessage::EndSession { session_id } => match end_practice(state, &session_id).await {
      Ok(summary) => {
        tracing::info!(target: "practice", session = %session_id, questions = summary.questions_answered, "WS practice session ended");
        ServerWsMessage::SessionEnded { summary }
      }
      Err(e) => ServerWsMessage::Error { message: e },
    },

    ClientWsMessage::GetSnapshot { session_id } => {
      match practice_snapshot(state, &session_id).await {
        Ok(session) => ServerWsMessage::SessionSnapshot { session },
        Err(e) => ServerWsMessage::Error { message: e },
      }
    }
  }
}
