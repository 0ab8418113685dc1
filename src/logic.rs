//! Core behaviors shared by both HTTP and WebSocket handlers.
//!
//! This includes:
//!   - Account registration / sign-in / sign-out, coordinating the
//!     identity store and the profile document store
//!   - Driving the practice session engine (start, answer, advance, end)
//!   - Building performance reports from profile aggregates
//!   - Admin console operations (user list, live question insert)

use tracing::{info, instrument};
use uuid::Uuid;

use crate::domain::{Question, QuestionSource, Role, SessionSummary, UserProfile};
use crate::protocol::{
  profile_to_out, question_to_out, snapshot_to_out, stats_to_out, AdminQuestionIn, AdminUserOut,
  AnswerOut, AuthOut, OverallReportOut, QuestionOut, ReportOut, SessionOut, TopicReportOut,
};
use crate::session::AnswerOutcome;
use crate::state::AppState;

// ---- auth ----

/// Create the account, write the initial profile document, and sign the
/// new user in.
#[instrument(level = "info", skip(state, password), fields(%email))]
pub async fn register(
  state: &AppState,
  email: &str,
  password: &str,
  display_name: &str,
) -> Result<AuthOut, String> {
  if display_name.trim().is_empty() {
    return Err("A display name is required.".into());
  }
  let user_id = state.identity.create_account(email, password).await?;
  state.create_profile(&user_id, display_name.trim(), email, Role::Student).await;
  let (_, token) = state.identity.sign_in(email, password).await?;
  let profile = state
    .get_profile(&user_id)
    .await
    .ok_or_else(|| "Profile missing after registration.".to_string())?;
  Ok(AuthOut { token, profile: profile_to_out(&profile) })
}

/// Verify credentials, stamp last-login, return token + profile snapshot.
#[instrument(level = "info", skip(state, password), fields(%email))]
pub async fn login(state: &AppState, email: &str, password: &str) -> Result<AuthOut, String> {
  let (user_id, token) = state.identity.sign_in(email, password).await?;
  state.touch_last_login(&user_id).await;
  let profile = state
    .get_profile(&user_id)
    .await
    .ok_or_else(|| "No profile for this account.".to_string())?;
  Ok(AuthOut { token, profile: profile_to_out(&profile) })
}

pub async fn logout(state: &AppState, token: &str) {
  state.identity.sign_out(token).await;
}

/// Resolve a bearer token to a profile snapshot.
pub async fn current_profile(state: &AppState, token: &str) -> Option<UserProfile> {
  let user_id = state.identity.current_user(token).await?;
  state.get_profile(&user_id).await
}

// ---- practice flow ----

/// Start a session (attributed when a user id is supplied) and hand the
/// first question to the client.
pub async fn start_practice(state: &AppState, user_id: Option<String>) -> SessionOut {
  let snap = state.start_session(user_id).await;
  snapshot_to_out(&snap)
}

pub async fn practice_snapshot(state: &AppState, session_id: &str) -> Result<SessionOut, String> {
  state
    .session_snapshot(session_id)
    .await
    .map(|s| snapshot_to_out(&s))
    .ok_or_else(|| format!("Unknown session: {}", session_id))
}

/// Submit a selection. A rejected (no-op) selection still returns the
/// current stats so clients can re-render without a second round trip.
#[instrument(level = "info", skip(state), fields(%session_id, %answer_index))]
pub async fn submit_answer(
  state: &AppState,
  session_id: &str,
  answer_index: usize,
) -> Result<AnswerOut, String> {
  let (outcome, snap) = state.answer_session(session_id, answer_index).await?;
  let out = match outcome {
    Some(AnswerOutcome { correct, correct_answer, explanation }) => {
      info!(target: "practice", session = %session_id, %correct, streak = snap.stats.current_streak, "Answer evaluated");
      AnswerOut {
        accepted: true,
        correct,
        correct_answer: Some(correct_answer),
        explanation,
        stats: stats_to_out(snap.stats, snap.elapsed_secs),
      }
    }
    None => AnswerOut {
      accepted: false,
      correct: false,
      correct_answer: None,
      explanation: "Selection not accepted in the current session phase.".into(),
      stats: stats_to_out(snap.stats, snap.elapsed_secs),
    },
  };
  Ok(out)
}

pub async fn next_question(state: &AppState, session_id: &str) -> Result<SessionOut, String> {
  let snap = state.advance_session(session_id).await?;
  Ok(snapshot_to_out(&snap))
}

pub async fn end_practice(state: &AppState, session_id: &str) -> Result<SessionSummary, String> {
  state.end_session(session_id).await
}

// ---- catalog & reports ----

pub async fn list_questions(state: &AppState, topic: Option<&str>) -> Vec<QuestionOut> {
  state
    .list_questions(topic)
    .await
    .iter()
    .map(question_to_out)
    .collect()
}

/// Performance report for one user: overall numbers, weakest topics
/// first, and the most recent sessions.
#[instrument(level = "info", skip(state), fields(%user_id))]
pub async fn build_report(state: &AppState, user_id: &str) -> Result<ReportOut, String> {
  let profile = state
    .get_profile(user_id)
    .await
    .ok_or_else(|| "No profile for this account.".to_string())?;
  let perf = &profile.performance;

  let accuracy = if perf.total_questions == 0 {
    0
  } else {
    ((perf.correct_answers as f64 / perf.total_questions as f64) * 100.0).round() as u32
  };

  let mut topics: Vec<TopicReportOut> = perf
    .topics
    .iter()
    .map(|(topic, tally)| TopicReportOut {
      topic: topic.clone(),
      answered: tally.answered,
      correct: tally.correct,
      accuracy: tally.accuracy(),
    })
    .collect();
  // weakest first; tie-break on name for stable output
  topics.sort_by(|a, b| a.accuracy.cmp(&b.accuracy).then(a.topic.cmp(&b.topic)));

  let recent_sessions: Vec<SessionSummary> =
    perf.practice_sessions.iter().rev().take(5).cloned().collect();

  Ok(ReportOut {
    overall: OverallReportOut {
      total_questions: perf.total_questions,
      correct_answers: perf.correct_answers,
      accuracy,
      session_count: perf.practice_sessions.len() as u32,
    },
    topics,
    recent_sessions,
  })
}

// ---- admin ----

/// Validate and insert a question into the live pool.
#[instrument(level = "info", skip(state, body), fields(topic = %body.topic))]
pub async fn admin_add_question(
  state: &AppState,
  body: AdminQuestionIn,
) -> Result<QuestionOut, String> {
  let q = Question {
    id: Uuid::new_v4().to_string(),
    prompt: body.prompt,
    options: body.options,
    correct_answer: body.correct_answer,
    explanation: body.explanation,
    topic: body.topic,
    difficulty: body.difficulty.unwrap_or_else(|| "Medium".into()),
    source: QuestionSource::AdminAdded,
  };
  state.insert_question(q.clone()).await?;
  Ok(question_to_out(&q))
}

pub async fn admin_list_users(state: &AppState) -> Vec<AdminUserOut> {
  state
    .list_profiles()
    .await
    .iter()
    .map(|p| {
      let out = profile_to_out(p);
      AdminUserOut {
        id: out.id,
        display_name: out.display_name,
        email: out.email,
        role: out.role,
        questions_answered: out.total_questions,
        accuracy: out.accuracy,
      }
    })
    .collect()
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::session::SessionPhase;

  fn state() -> AppState {
    AppState::from_bank(None)
  }

  #[tokio::test]
  async fn register_then_login_roundtrip() {
    let s = state();
    let auth = register(&s, "mia@example.com", "secret1", "Mia").await.unwrap();
    assert_eq!(auth.profile.display_name, "Mia");
    assert_eq!(auth.profile.role, Role::Student);
    assert!(current_profile(&s, &auth.token).await.is_some());

    let auth2 = login(&s, "mia@example.com", "secret1").await.unwrap();
    assert_eq!(auth2.profile.id, auth.profile.id);

    logout(&s, &auth.token).await;
    assert!(current_profile(&s, &auth.token).await.is_none());
    // second token still valid
    assert!(current_profile(&s, &auth2.token).await.is_some());
  }

  #[tokio::test]
  async fn register_requires_display_name() {
    let s = state();
    assert!(register(&s, "x@y.z", "secret1", "  ").await.is_err());
  }

  #[tokio::test]
  async fn anonymous_practice_flow_end_to_end() {
    let s = state();
    let session = start_practice(&s, None).await;
    assert_eq!(session.phase, SessionPhase::AwaitingAnswer);
    let q = session.question.expect("question");
    // the DTO hides the answer; pull it from state for the test
    let correct = s.get_question(&q.id).await.unwrap().correct_answer;

    let result = submit_answer(&s, &session.session_id, correct).await.unwrap();
    assert!(result.accepted);
    assert!(result.correct);
    assert_eq!(result.correct_answer, Some(correct));
    assert_eq!(result.stats.questions_answered, 1);
    assert_eq!(result.stats.accuracy, 100);

    // double submission: no-op with unchanged stats
    let again = submit_answer(&s, &session.session_id, 0).await.unwrap();
    assert!(!again.accepted);
    assert_eq!(again.stats.questions_answered, 1);
    assert!(again.correct_answer.is_none());

    let next = next_question(&s, &session.session_id).await.unwrap();
    assert_eq!(next.phase, SessionPhase::AwaitingAnswer);
    assert!(next.selected_answer.is_none());

    let summary = end_practice(&s, &session.session_id).await.unwrap();
    assert_eq!(summary.questions_answered, 1);
    assert_eq!(summary.correct_answers, 1);

    // post-end selections are no-ops
    let after = submit_answer(&s, &session.session_id, 0).await.unwrap();
    assert!(!after.accepted);
    assert_eq!(after.stats.questions_answered, 1);
  }

  #[tokio::test]
  async fn report_reflects_finished_sessions() {
    let s = state();
    let auth = register(&s, "leo@example.com", "secret1", "Leo").await.unwrap();
    let uid = auth.profile.id.clone();

    let session = start_practice(&s, Some(uid.clone())).await;
    let q = session.question.clone().unwrap();
    let correct = s.get_question(&q.id).await.unwrap().correct_answer;
    submit_answer(&s, &session.session_id, correct).await.unwrap();
    next_question(&s, &session.session_id).await.unwrap();
    let snap = practice_snapshot(&s, &session.session_id).await.unwrap();
    let q2 = snap.question.unwrap();
    let correct2 = s.get_question(&q2.id).await.unwrap().correct_answer;
    let wrong = (correct2 + 1) % q2.options.len();
    submit_answer(&s, &session.session_id, wrong).await.unwrap();
    end_practice(&s, &session.session_id).await.unwrap();

    let report = build_report(&s, &uid).await.unwrap();
    assert_eq!(report.overall.total_questions, 2);
    assert_eq!(report.overall.correct_answers, 1);
    assert_eq!(report.overall.accuracy, 50);
    assert_eq!(report.overall.session_count, 1);
    assert_eq!(report.recent_sessions.len(), 1);
    let answered: u32 = report.topics.iter().map(|t| t.answered).sum();
    assert_eq!(answered, 2);
    // weakest topic first
    if report.topics.len() > 1 {
      assert!(report.topics[0].accuracy <= report.topics[1].accuracy);
    }
  }

  #[tokio::test]
  async fn report_for_unknown_user_fails() {
    let s = state();
    assert!(build_report(&s, "ghost").await.is_err());
  }

  #[tokio::test]
  async fn admin_add_question_enters_the_pool() {
    let s = state();
    let added = admin_add_question(
      &s,
      AdminQuestionIn {
        prompt: "What is 9 x 9?".into(),
        options: vec!["80".into(), "81".into(), "82".into(), "91".into()],
        correct_answer: 1,
        explanation: "9 x 9 = 81.".into(),
        topic: "Arithmetic".into(),
        difficulty: None,
      },
    )
    .await
    .unwrap();
    assert_eq!(added.difficulty, "Medium");
    let found = s.get_question(&added.id).await.unwrap();
    assert_eq!(found.correct_answer, 1);

    // invalid index rejected
    let bad = admin_add_question(
      &s,
      AdminQuestionIn {
        prompt: "Broken".into(),
        options: vec!["a".into(), "b".into()],
        correct_answer: 9,
        explanation: String::new(),
        topic: "Arithmetic".into(),
        difficulty: None,
      },
    )
    .await;
    assert!(bad.is_err());
  }

  #[tokio::test]
  async fn admin_user_list_shows_aggregates() {
    let s = state();
    register(&s, "a@b.co", "secret1", "A").await.unwrap();
    register(&s, "c@d.co", "secret1", "C").await.unwrap();
    let users = admin_list_users(&s).await;
    assert_eq!(users.len(), 2);
    assert!(users.iter().all(|u| u.questions_answered == 0));
  }
}
