//! Application state: in-memory stores and the question selection policy.
//!
//! This module owns:
//!   - the question pool (by id, by topic, plus a draw list)
//!   - live practice sessions
//!   - user profile documents (the document-store stand-in)
//!   - the exam catalog
//!   - the identity store
//!
//! The selection policy is a uniform random draw with replacement over the
//! whole pool. Repeats are permitted by design; there is no adaptive
//! difficulty despite what the marketing copy promises.

use std::{
  collections::{HashMap, VecDeque},
  sync::Arc,
};

use rand::Rng;
use tokio::sync::RwLock;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use crate::auth::IdentityStore;
use crate::config::{load_bank_from_env, BankConfig};
use crate::domain::{
  ExamDefinition, Performance, Preferences, Question, QuestionSource, Role, SessionSummary,
  UserProfile,
};
use crate::seeds::{seed_exams, seed_questions};
use crate::session::{AnswerOutcome, PracticeSession, SessionSnapshot};
use crate::util::now_unix_secs;

// Ended sessions stay around so late selections read as no-ops instead of
// "unknown session", but only the most recent ones; older ones are evicted.
pub const ENDED_SESSION_RETENTION: usize = 32;

#[derive(Clone)]
pub struct AppState {
  pub by_id: Arc<RwLock<HashMap<String, Question>>>,
  pub by_topic: Arc<RwLock<HashMap<String, Vec<String>>>>,
  // draw list: every servable question id once, in insertion order
  pub draw_order: Arc<RwLock<Vec<String>>>,
  pub sessions: Arc<RwLock<HashMap<String, PracticeSession>>>,
  // ended session ids, oldest first; drives eviction from `sessions`
  pub ended_order: Arc<RwLock<VecDeque<String>>>,
  pub profiles: Arc<RwLock<HashMap<String, UserProfile>>>,
  pub exams: Arc<Vec<ExamDefinition>>,
  pub identity: IdentityStore,
}

impl AppState {
  /// Build state from env: load the TOML bank if configured, seed the
  /// built-in pool and exam catalog, build indices.
  #[instrument(level = "info", skip_all)]
  pub fn new() -> Self {
    Self::from_bank(load_bank_from_env())
  }

  /// Same as `new` but with an explicit (possibly absent) bank. Used by
  /// tests so they never depend on process env.
  pub fn from_bank(bank: Option<BankConfig>) -> Self {
    let mut id_map = HashMap::<String, Question>::new();
    let mut topic_map = HashMap::<String, Vec<String>>::new();
    let mut order = Vec::<String>::new();

    let mut insert = |q: Question, id_map: &mut HashMap<String, Question>| {
      if id_map.contains_key(&q.id) {
        return;
      }
      topic_map.entry(q.topic.clone()).or_default().push(q.id.clone());
      order.push(q.id.clone());
      id_map.insert(q.id.clone(), q);
    };

    // Bank questions first (if any), validated entry by entry.
    let mut exams = Vec::<ExamDefinition>::new();
    if let Some(cfg) = &bank {
      for qc in &cfg.questions {
        let id = qc.id.clone().unwrap_or_else(|| Uuid::new_v4().to_string());
        let q = Question {
          id: id.clone(),
          prompt: qc.prompt.clone(),
          options: qc.options.clone(),
          correct_answer: qc.correct_answer,
          explanation: qc.explanation.clone(),
          topic: qc.topic.clone(),
          difficulty: qc.difficulty.clone(),
          source: QuestionSource::LocalBank,
        };
        if let Err(e) = q.validate() {
          error!(target: "practice", %id, topic = %qc.topic, error = %e, "Skipping bank question");
          continue;
        }
        insert(q, &mut id_map);
      }
      for ec in &cfg.exams {
        exams.push(ExamDefinition {
          id: ec.id.clone().unwrap_or_else(|| Uuid::new_v4().to_string()),
          title: ec.title.clone(),
          description: ec.description.clone(),
          duration_mins: ec.duration_mins,
          question_count: ec.question_count,
          difficulty: ec.difficulty.clone(),
          topics: ec.topics.clone(),
        });
      }
    }

    // Always insert built-in seeds, but don't overwrite existing ids.
    for q in seed_questions() {
      insert(q, &mut id_map);
    }
    if exams.is_empty() {
      exams = seed_exams();
    }

    // Inventory summary by topic/source.
    let mut count_by_topic: HashMap<String, (usize, usize)> = HashMap::new();
    for q in id_map.values() {
      let entry = count_by_topic.entry(q.topic.clone()).or_insert((0, 0));
      match q.source {
        QuestionSource::LocalBank | QuestionSource::AdminAdded => entry.0 += 1,
        QuestionSource::Seed => entry.1 += 1,
      }
    }
    for (topic, (bank_n, seed_n)) in count_by_topic {
      info!(target: "practice", %topic, local_bank = bank_n, seed = seed_n, "Startup question inventory");
    }
    info!(target: "aceprep_backend", exams = exams.len(), "Exam catalog loaded");

    Self {
      by_id: Arc::new(RwLock::new(id_map)),
      by_topic: Arc::new(RwLock::new(topic_map)),
      draw_order: Arc::new(RwLock::new(order)),
      sessions: Arc::new(RwLock::new(HashMap::new())),
      ended_order: Arc::new(RwLock::new(VecDeque::new())),
      profiles: Arc::new(RwLock::new(HashMap::new())),
      exams: Arc::new(exams),
      identity: IdentityStore::new(),
    }
  }

  // ---- question pool ----

  /// Insert a validated question into the live pool (admin console path).
  #[instrument(level = "info", skip(self, q), fields(id = %q.id, topic = %q.topic))]
  pub async fn insert_question(&self, q: Question) -> Result<(), String> {
    q.validate()?;
    let mut by_id = self.by_id.write().await;
    if by_id.contains_key(&q.id) {
      return Err(format!("question id '{}' already exists", q.id));
    }
    let mut by_topic = self.by_topic.write().await;
    let mut order = self.draw_order.write().await;
    by_topic.entry(q.topic.clone()).or_default().push(q.id.clone());
    order.push(q.id.clone());
    info!(target: "practice", id = %q.id, topic = %q.topic, "Question added to live pool");
    by_id.insert(q.id.clone(), q);
    Ok(())
  }

  /// Uniform random draw with replacement over the whole pool. The pool is
  /// guaranteed non-empty (seeds always load), so this cannot fail.
  pub async fn choose_question(&self) -> Question {
    let order = self.draw_order.read().await;
    let idx = rand::thread_rng().gen_range(0..order.len());
    let id = order[idx].clone();
    drop(order);
    let by_id = self.by_id.read().await;
    by_id
      .get(&id)
      .cloned()
      .unwrap_or_else(|| seed_questions().swap_remove(0))
  }

  /// Read-only access to a question by id.
  pub async fn get_question(&self, id: &str) -> Option<Question> {
    self.by_id.read().await.get(id).cloned()
  }

  /// List questions, optionally filtered by topic.
  pub async fn list_questions(&self, topic: Option<&str>) -> Vec<Question> {
    let by_id = self.by_id.read().await;
    let order = self.draw_order.read().await;
    order
      .iter()
      .filter_map(|id| by_id.get(id))
      .filter(|q| topic.map_or(true, |t| q.topic == t))
      .cloned()
      .collect()
  }

  // ---- practice sessions ----

  /// Start a new session: draw the first question and present it.
  #[instrument(level = "info", skip(self), fields(user = user_id.as_deref().unwrap_or("anonymous")))]
  pub async fn start_session(&self, user_id: Option<String>) -> SessionSnapshot {
    let id = Uuid::new_v4().to_string();
    let mut session = PracticeSession::new(id.clone(), user_id);
    let q = self.choose_question().await;
    session.present(q);
    let snap = session.snapshot();
    self.sessions.write().await.insert(id.clone(), session);
    info!(target: "practice", session = %id, question = ?snap.question.as_ref().map(|q| q.id.as_str()), "Practice session started");
    snap
  }

  /// Current snapshot of a session.
  pub async fn session_snapshot(&self, session_id: &str) -> Option<SessionSnapshot> {
    self.sessions.read().await.get(session_id).map(|s| s.snapshot())
  }

  /// Resolve an answer for a session. `Ok(None)` means the selection was
  /// a no-op (wrong phase or bad index) and nothing changed.
  pub async fn answer_session(
    &self,
    session_id: &str,
    index: usize,
  ) -> Result<(Option<AnswerOutcome>, SessionSnapshot), String> {
    let mut sessions = self.sessions.write().await;
    let session = sessions
      .get_mut(session_id)
      .ok_or_else(|| format!("Unknown session: {}", session_id))?;
    let outcome = session.select_answer(index);
    if outcome.is_none() {
      warn!(target: "practice", session = %session_id, %index, phase = ?session.phase(), "Selection ignored");
    }
    Ok((outcome, session.snapshot()))
  }

  /// Advance to the next question: Feedback -> Loading -> AwaitingAnswer
  /// with a fresh draw. Advancing in any other phase is a no-op and
  /// returns the unchanged snapshot.
  pub async fn advance_session(&self, session_id: &str) -> Result<SessionSnapshot, String> {
    // Draw before taking the write lock; the draw only needs the pool.
    let next = self.choose_question().await;
    let mut sessions = self.sessions.write().await;
    let session = sessions
      .get_mut(session_id)
      .ok_or_else(|| format!("Unknown session: {}", session_id))?;
    if session.advance() {
      session.present(next);
    }
    Ok(session.snapshot())
  }

  /// End a session and fold its records into the owning profile (when the
  /// session is attributed). Idempotent: ending an ended session just
  /// returns its summary again.
  #[instrument(level = "info", skip(self), fields(session = %session_id))]
  pub async fn end_session(&self, session_id: &str) -> Result<SessionSummary, String> {
    let (summary, user_id, per_topic) = {
      let mut sessions = self.sessions.write().await;
      let session = sessions
        .get_mut(session_id)
        .ok_or_else(|| format!("Unknown session: {}", session_id))?;
      let newly_ended = session.end();
      let summary = session.summary();
      if !newly_ended {
        return Ok(summary);
      }
      let mut per_topic: HashMap<String, (u32, u32)> = HashMap::new();
      for r in session.records() {
        let e = per_topic.entry(r.topic.clone()).or_insert((0, 0));
        e.0 += 1;
        if r.correct {
          e.1 += 1;
        }
      }
      let result = (summary, session.user_id.clone(), per_topic);

      // Retain only the newest ended sessions; evict the rest.
      let mut ended = self.ended_order.write().await;
      ended.push_back(session_id.to_string());
      while ended.len() > ENDED_SESSION_RETENTION {
        if let Some(old) = ended.pop_front() {
          sessions.remove(&old);
        }
      }

      result
    };

    info!(
      target: "practice",
      questions = summary.questions_answered,
      correct = summary.correct_answers,
      accuracy = summary.accuracy,
      duration_secs = summary.duration_secs,
      "Practice session ended"
    );

    if let Some(uid) = user_id {
      let mut profiles = self.profiles.write().await;
      if let Some(p) = profiles.get_mut(&uid) {
        p.performance.total_questions += summary.questions_answered;
        p.performance.correct_answers += summary.correct_answers;
        for (topic, (answered, correct)) in per_topic {
          let t = p.performance.topics.entry(topic).or_default();
          t.answered += answered;
          t.correct += correct;
        }
        p.performance.practice_sessions.push(summary.clone());
      } else {
        warn!(target: "practice", user = %uid, "Session ended for unknown profile; results dropped");
      }
    }
    Ok(summary)
  }

  // ---- profiles (document-store stand-in) ----

  /// Write the initial profile document for a new account.
  pub async fn create_profile(&self, user_id: &str, display_name: &str, email: &str, role: Role) {
    let now = now_unix_secs();
    let profile = UserProfile {
      id: user_id.to_string(),
      display_name: display_name.to_string(),
      email: email.trim().to_lowercase(),
      role,
      created_at: now,
      last_login: now,
      preferences: Preferences::default(),
      performance: Performance::default(),
    };
    self.profiles.write().await.insert(user_id.to_string(), profile);
  }

  pub async fn get_profile(&self, user_id: &str) -> Option<UserProfile> {
    self.profiles.read().await.get(user_id).cloned()
  }

  pub async fn touch_last_login(&self, user_id: &str) {
    if let Some(p) = self.profiles.write().await.get_mut(user_id) {
      p.last_login = now_unix_secs();
    }
  }

  /// Role of a user, defaulting to `Student` for unknown ids.
  pub async fn role_of(&self, user_id: &str) -> Role {
    self
      .profiles
      .read()
      .await
      .get(user_id)
      .map(|p| p.role)
      .unwrap_or_default()
  }

  pub async fn list_profiles(&self) -> Vec<UserProfile> {
    let mut all: Vec<UserProfile> = self.profiles.read().await.values().cloned().collect();
    all.sort_by(|a, b| a.created_at.cmp(&b.created_at));
    all
  }

  /// Create an admin account + profile. Used at startup when
  /// ADMIN_EMAIL/ADMIN_PASSWORD are set, and by tests.
  pub async fn bootstrap_admin(
    &self,
    email: &str,
    password: &str,
    display_name: &str,
  ) -> Result<String, String> {
    let user_id = self.identity.create_account(email, password).await?;
    self.create_profile(&user_id, display_name, email, Role::Admin).await;
    info!(target: "auth", %email, "Admin account bootstrapped");
    Ok(user_id)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::session::SessionPhase;

  fn state() -> AppState {
    AppState::from_bank(None)
  }

  #[tokio::test]
  async fn pool_is_seeded_and_nonempty() {
    let s = state();
    assert_eq!(s.draw_order.read().await.len(), 5);
    assert!(!s.exams.is_empty());
  }

  #[tokio::test]
  async fn invalid_bank_entries_are_skipped() {
    let bank: BankConfig = toml::from_str(
      r#"
      [[questions]]
      id = "bad1"
      prompt = "Pick one"
      options = ["only option"]
      correct_answer = 0
      topic = "Algebra"

      [[questions]]
      id = "bad2"
      prompt = "Pick one"
      options = ["a", "b"]
      correct_answer = 5
      topic = "Algebra"

      [[questions]]
      id = "good1"
      prompt = "Pick b"
      options = ["a", "b"]
      correct_answer = 1
      topic = "Algebra"
      "#,
    )
    .unwrap();
    let s = AppState::from_bank(Some(bank));
    assert!(s.get_question("bad1").await.is_none());
    assert!(s.get_question("bad2").await.is_none());
    assert!(s.get_question("good1").await.is_some());
    // 1 bank + 5 seeds
    assert_eq!(s.draw_order.read().await.len(), 6);
  }

  #[tokio::test]
  async fn draw_is_from_the_pool_with_replacement() {
    let s = state();
    for _ in 0..50 {
      let q = s.choose_question().await;
      assert!(s.get_question(&q.id).await.is_some());
    }
  }

  #[tokio::test]
  async fn list_questions_filters_by_topic() {
    let s = state();
    let all = s.list_questions(None).await;
    assert_eq!(all.len(), 5);
    let algebra = s.list_questions(Some("Algebra")).await;
    assert_eq!(algebra.len(), 2);
    assert!(algebra.iter().all(|q| q.topic == "Algebra"));
  }

  #[tokio::test]
  async fn session_lifecycle_through_state() {
    let s = state();
    let snap = s.start_session(None).await;
    assert_eq!(snap.phase, SessionPhase::AwaitingAnswer);
    let q = snap.question.expect("question drawn");

    let (outcome, snap) = s.answer_session(&snap.id, q.correct_answer).await.unwrap();
    let outcome = outcome.expect("accepted");
    assert!(outcome.correct);
    assert_eq!(snap.phase, SessionPhase::Feedback);
    assert_eq!(snap.stats.questions_answered, 1);
    assert_eq!(snap.stats.correct_answers, 1);
    assert_eq!(snap.stats.current_streak, 1);

    // double submission is a no-op
    let (again, snap2) = s.answer_session(&snap.id, 0).await.unwrap();
    assert!(again.is_none());
    assert_eq!(snap2.stats.questions_answered, 1);

    let snap3 = s.advance_session(&snap.id).await.unwrap();
    assert_eq!(snap3.phase, SessionPhase::AwaitingAnswer);
    assert!(snap3.question.is_some());
    assert!(snap3.answer.is_none());

    let summary = s.end_session(&snap.id).await.unwrap();
    assert_eq!(summary.questions_answered, 1);
    // no-ops after end
    let (after, snap4) = s.answer_session(&snap.id, 0).await.unwrap();
    assert!(after.is_none());
    assert_eq!(snap4.phase, SessionPhase::Ended);
    let snap5 = s.advance_session(&snap.id).await.unwrap();
    assert_eq!(snap5.phase, SessionPhase::Ended);
  }

  #[tokio::test]
  async fn ended_sessions_are_retained_up_to_a_bound() {
    let s = state();
    let mut ids = Vec::new();
    for _ in 0..(ENDED_SESSION_RETENTION + 8) {
      let snap = s.start_session(None).await;
      s.end_session(&snap.id).await.unwrap();
      ids.push(snap.id);
    }
    assert_eq!(s.sessions.read().await.len(), ENDED_SESSION_RETENTION);
    // the oldest ended session has been evicted
    assert!(s.session_snapshot(&ids[0]).await.is_none());
    // recent ones still answer as ended no-ops
    let last = ids.last().unwrap();
    let snap = s.session_snapshot(last).await.unwrap();
    assert_eq!(snap.phase, SessionPhase::Ended);
    let (outcome, _) = s.answer_session(last, 0).await.unwrap();
    assert!(outcome.is_none());
  }

  #[tokio::test]
  async fn unknown_session_is_an_error() {
    let s = state();
    assert!(s.answer_session("nope", 0).await.is_err());
    assert!(s.advance_session("nope").await.is_err());
    assert!(s.end_session("nope").await.is_err());
    assert!(s.session_snapshot("nope").await.is_none());
  }

  #[tokio::test]
  async fn ending_attributed_session_folds_into_profile() {
    let s = state();
    let uid = s.identity.create_account("kim@example.com", "secret1").await.unwrap();
    s.create_profile(&uid, "Kim", "kim@example.com", Role::Student).await;

    let snap = s.start_session(Some(uid.clone())).await;
    let q = snap.question.clone().unwrap();
    s.answer_session(&snap.id, q.correct_answer).await.unwrap();
    let snap = s.advance_session(&snap.id).await.unwrap();
    let q2 = snap.question.clone().unwrap();
    // deliberately wrong
    let wrong = (q2.correct_answer + 1) % q2.options.len();
    s.answer_session(&snap.id, wrong).await.unwrap();
    s.end_session(&snap.id).await.unwrap();

    let p = s.get_profile(&uid).await.unwrap();
    assert_eq!(p.performance.total_questions, 2);
    assert_eq!(p.performance.correct_answers, 1);
    assert_eq!(p.performance.practice_sessions.len(), 1);
    let topic_total: u32 = p.performance.topics.values().map(|t| t.answered).sum();
    assert_eq!(topic_total, 2);

    // ending again is idempotent; aggregates unchanged
    s.end_session(&snap.id).await.unwrap();
    let p2 = s.get_profile(&uid).await.unwrap();
    assert_eq!(p2.performance.total_questions, 2);
    assert_eq!(p2.performance.practice_sessions.len(), 1);
  }

  #[tokio::test]
  async fn admin_insert_question_validates() {
    let s = state();
    let mut q = s.get_question("q1").await.unwrap();
    q.id = "q-new".into();
    q.source = QuestionSource::AdminAdded;
    s.insert_question(q.clone()).await.unwrap();
    assert!(s.get_question("q-new").await.is_some());
    // duplicate id rejected
    assert!(s.insert_question(q.clone()).await.is_err());
    // invalid rejected
    q.id = "q-bad".into();
    q.correct_answer = 99;
    assert!(s.insert_question(q).await.is_err());
    assert!(s.get_question("q-bad").await.is_none());
  }

  #[tokio::test]
  async fn role_defaults_to_student() {
    let s = state();
    assert_eq!(s.role_of("missing").await, Role::Student);
    let uid = s.bootstrap_admin("root@aceprep.app", "secret1", "Root").await.unwrap();
    assert_eq!(s.role_of(&uid).await, Role::Admin);
  }
}
