//! Public protocol structs for WebSocket and HTTP endpoints (serde ready).
//! Keep this small and stable to evolve backend and frontend independently.
//!
//! Question DTOs sent to clients never carry the correct-answer index; it
//! is revealed only inside an answer result.

use serde::{Deserialize, Serialize};

use crate::domain::{Question, Role, SessionSummary, UserProfile};
use crate::session::{SessionSnapshot, SessionStats};
use crate::util::format_mmss;

/// Messages the client can send over WebSocket.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientWsMessage {
  Ping,
  StartSession,
  SelectAnswer {
    #[serde(rename = "sessionId")]
    session_id: String,
    #[serde(rename = "answerIndex")]
    answer_index: usize,
  },
  NextQuestion {
    #[serde(rename = "sessionId")]
    session_id: String,
  },
  EndSession {
    #[serde(rename = "sessionId")]
    session_id: String,
  },
  GetSnapshot {
    #[serde(rename = "sessionId")]
    session_id: String,
  },
}

/// Messages the server sends back over WebSocket.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerWsMessage {
  Pong,
  Session { session: SessionOut },
  SessionSnapshot { session: SessionOut },
  AnswerResult { result: AnswerOut },
  SessionEnded { summary: SessionSummary },
  Error { message: String },
}

/// Client-facing question: no correct index, no explanation.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionOut {
  pub id: String,
  pub prompt: String,
  pub options: Vec<String>,
  pub topic: String,
  pub difficulty: String,
}

pub fn question_to_out(q: &Question) -> QuestionOut {
  QuestionOut {
    id: q.id.clone(),
    prompt: q.prompt.clone(),
    options: q.options.clone(),
    topic: q.topic.clone(),
    difficulty: q.difficulty.clone(),
  }
}

/// Stats snapshot with the derived fields the header widgets show.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsOut {
  pub questions_answered: u32,
  pub correct_answers: u32,
  pub current_streak: u32,
  pub accuracy: u32,
  pub time_spent_secs: u64,
  pub time_spent_display: String,
}

pub fn stats_to_out(stats: SessionStats, elapsed_secs: u64) -> StatsOut {
  StatsOut {
    questions_answered: stats.questions_answered,
    correct_answers: stats.correct_answers,
    current_streak: stats.current_streak,
    accuracy: stats.accuracy(),
    time_spent_secs: elapsed_secs,
    time_spent_display: format_mmss(elapsed_secs),
  }
}

/// Session view: phase, current question (if any), stats.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionOut {
  pub session_id: String,
  pub phase: crate::session::SessionPhase,
  pub question: Option<QuestionOut>,
  pub selected_answer: Option<usize>,
  pub stats: StatsOut,
}

pub fn snapshot_to_out(snap: &SessionSnapshot) -> SessionOut {
  SessionOut {
    session_id: snap.id.clone(),
    phase: snap.phase,
    question: snap.question.as_ref().map(question_to_out),
    selected_answer: snap.answer.map(|a| a.selected),
    stats: stats_to_out(snap.stats, snap.elapsed_secs),
  }
}

/// Result of one answer submission. `accepted == false` means the
/// selection was a no-op and the stats are unchanged.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerOut {
  pub accepted: bool,
  pub correct: bool,
  pub correct_answer: Option<usize>,
  pub explanation: String,
  pub stats: StatsOut,
}

//
// HTTP request/response DTOs
//

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterIn {
  pub email: String,
  pub password: String,
  pub display_name: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginIn {
  pub email: String,
  pub password: String,
}

/// Profile snapshot sent to clients. Read-only view; updates only arrive
/// through defined operations, never by mutating shared state.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileOut {
  pub id: String,
  pub display_name: String,
  pub email: String,
  pub role: Role,
  pub total_questions: u32,
  pub correct_answers: u32,
  pub accuracy: u32,
}

pub fn profile_to_out(p: &UserProfile) -> ProfileOut {
  let perf = &p.performance;
  let accuracy = if perf.total_questions == 0 {
    0
  } else {
    ((perf.correct_answers as f64 / perf.total_questions as f64) * 100.0).round() as u32
  };
  ProfileOut {
    id: p.id.clone(),
    display_name: p.display_name.clone(),
    email: p.email.clone(),
    role: p.role,
    total_questions: perf.total_questions,
    correct_answers: perf.correct_answers,
    accuracy,
  }
}

#[derive(Debug, Serialize)]
pub struct AuthOut {
  pub token: String,
  pub profile: ProfileOut,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerIn {
  pub answer_index: usize,
}

#[derive(Debug, Deserialize)]
pub struct QuestionsQuery {
  pub topic: Option<String>,
}

/// Per-topic slice of the performance report.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TopicReportOut {
  pub topic: String,
  pub answered: u32,
  pub correct: u32,
  pub accuracy: u32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OverallReportOut {
  pub total_questions: u32,
  pub correct_answers: u32,
  pub accuracy: u32,
  pub session_count: u32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportOut {
  pub overall: OverallReportOut,
  pub topics: Vec<TopicReportOut>,
  pub recent_sessions: Vec<SessionSummary>,
}

/// Admin: add a question to the live pool.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminQuestionIn {
  pub prompt: String,
  pub options: Vec<String>,
  pub correct_answer: usize,
  #[serde(default)]
  pub explanation: String,
  pub topic: String,
  #[serde(default)]
  pub difficulty: Option<String>,
}

/// Admin: one row of the user list.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminUserOut {
  pub id: String,
  pub display_name: String,
  pub email: String,
  pub role: Role,
  pub questions_answered: u32,
  pub accuracy: u32,
}

#[derive(Serialize)]
pub struct HealthOut {
  pub ok: bool,
}

#[derive(Serialize)]
pub struct OkOut {
  pub ok: bool,
}

#[derive(Serialize)]
pub struct ErrorOut {
  pub error: String,
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::domain::QuestionSource;

  #[test]
  fn question_out_withholds_the_answer() {
    let q = Question {
      id: "q1".into(),
      prompt: "p".into(),
      options: vec!["a".into(), "b".into()],
      correct_answer: 1,
      explanation: "because".into(),
      topic: "Algebra".into(),
      difficulty: "Easy".into(),
      source: QuestionSource::Seed,
    };
    let v = serde_json::to_value(question_to_out(&q)).unwrap();
    let obj = v.as_object().unwrap();
    assert!(!obj.contains_key("correctAnswer"));
    assert!(!obj.contains_key("correct_answer"));
    assert!(!obj.contains_key("explanation"));
    assert_eq!(obj["options"].as_array().unwrap().len(), 2);
  }

  #[test]
  fn stats_out_derives_accuracy_and_display_time() {
    let stats = SessionStats { questions_answered: 4, correct_answers: 3, current_streak: 2 };
    let out = stats_to_out(stats, 125);
    assert_eq!(out.accuracy, 75);
    assert_eq!(out.time_spent_display, "2:05");
  }

  #[test]
  fn ws_client_messages_parse() {
    let m: ClientWsMessage = serde_json::from_str(r#"{"type":"start_session"}"#).unwrap();
    assert!(matches!(m, ClientWsMessage::StartSession));
    let m: ClientWsMessage = serde_json::from_str(
      r#"{"type":"select_answer","sessionId":"s1","answerIndex":2}"#,
    )
    .unwrap();
    match m {
      ClientWsMessage::SelectAnswer { session_id, answer_index } => {
        assert_eq!(session_id, "s1");
        assert_eq!(answer_index, 2);
      }
      other => panic!("unexpected: {:?}", other),
    }
  }
}
