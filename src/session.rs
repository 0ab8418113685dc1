//! The practice session engine: a small state machine over an in-memory
//! question draw.
//!
//! Phases: `Loading → AwaitingAnswer → Feedback → (Loading | Ended)`.
//!
//! Exactly one answer is accepted per question. Selections made while not
//! in `AwaitingAnswer` are no-ops, which guards against double submission.
//! Statistics only ever move forward, except the streak, which resets on a
//! wrong answer. Elapsed time runs from session start and does not pause
//! during `Feedback` or `Loading`.

use std::time::Instant;

use serde::Serialize;
use uuid::Uuid;

use crate::domain::{AnswerRecord, Question, SessionSummary};

/// Where the session currently is. `Ended` is terminal.
#[derive(Clone, Copy, Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
  Loading,
  AwaitingAnswer,
  Feedback,
  Ended,
}

/// Counters accumulated over one session.
#[derive(Clone, Copy, Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStats {
  pub questions_answered: u32,
  pub correct_answers: u32,
  pub current_streak: u32,
}

impl SessionStats {
  /// Integer-rounded percentage, derived from the two counters on every
  /// read so it can never drift from them.
  pub fn accuracy(&self) -> u32 {
    if self.questions_answered == 0 {
      0
    } else {
      ((self.correct_answers as f64 / self.questions_answered as f64) * 100.0).round() as u32
    }
  }
}

/// The one unresolved selection for the current question. Cleared when
/// advancing to the next question.
#[derive(Clone, Copy, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerEvent {
  pub selected: usize,
  pub correct: bool,
  pub feedback_visible: bool,
}

/// What a resolved answer reveals to the caller.
#[derive(Clone, Debug)]
pub struct AnswerOutcome {
  pub correct: bool,
  pub correct_answer: usize,
  pub explanation: String,
}

/// Owned point-in-time view of a session, handed to the protocol layer.
#[derive(Clone, Debug)]
pub struct SessionSnapshot {
  pub id: String,
  pub phase: SessionPhase,
  pub question: Option<Question>,
  pub answer: Option<AnswerEvent>,
  pub stats: SessionStats,
  pub elapsed_secs: u64,
}

/// One continuous practice interaction, from start to an explicit end.
#[derive(Debug)]
pub struct PracticeSession {
  pub id: String,
  pub user_id: Option<String>,
  phase: SessionPhase,
  current: Option<Question>,
  answer: Option<AnswerEvent>,
  stats: SessionStats,
  started_at: Instant,
  records: Vec<AnswerRecord>,
}

impl PracticeSession {
  /// New session in `Loading`; `user_id` is the opaque attribution id
  /// from the identity provider, or `None` for anonymous practice.
  pub fn new(id: String, user_id: Option<String>) -> Self {
    Self {
      id,
      user_id,
      phase: SessionPhase::Loading,
      current: None,
      answer: None,
      stats: SessionStats::default(),
      started_at: Instant::now(),
      records: Vec::new(),
    }
  }

  pub fn phase(&self) -> SessionPhase {
    self.phase
  }

  pub fn stats(&self) -> SessionStats {
    self.stats
  }

  pub fn current_question(&self) -> Option<&Question> {
    self.current.as_ref()
  }

  pub fn answer_event(&self) -> Option<AnswerEvent> {
    self.answer
  }

  pub fn records(&self) -> &[AnswerRecord] {
    &self.records
  }

  /// Whole seconds since the session started. Advances regardless of
  /// phase; the UI polls this at a one-second cadence.
  pub fn elapsed_secs(&self) -> u64 {
    self.started_at.elapsed().as_secs()
  }

  /// Install the freshly drawn question. Only legal from `Loading`;
  /// returns false (and changes nothing) otherwise.
  pub fn present(&mut self, question: Question) -> bool {
    if self.phase != SessionPhase::Loading {
      return false;
    }
    self.current = Some(question);
    self.answer = None;
    self.phase = SessionPhase::AwaitingAnswer;
    true
  }

  /// Resolve a selection for the current question.
  ///
  /// Returns `None` without touching any state when the session is not
  /// awaiting an answer (double submission, ended session) or when the
  /// index does not name an option.
  pub fn select_answer(&mut self, index: usize) -> Option<AnswerOutcome> {
    if self.phase != SessionPhase::AwaitingAnswer {
      return None;
    }
    let offset_secs = self.elapsed_secs();
    let (correct, record, outcome) = {
      let question = self.current.as_ref()?;
      if index >= question.options.len() {
        return None;
      }
      let correct = index == question.correct_answer;
      let record = AnswerRecord {
        id: Uuid::new_v4().to_string(),
        question_id: question.id.clone(),
        topic: question.topic.clone(),
        difficulty: question.difficulty.clone(),
        selected: index,
        correct,
        offset_secs,
      };
      let outcome = AnswerOutcome {
        correct,
        correct_answer: question.correct_answer,
        explanation: question.explanation.clone(),
      };
      (correct, record, outcome)
    };

    self.stats.questions_answered += 1;
    if correct {
      self.stats.correct_answers += 1;
      self.stats.current_streak += 1;
    } else {
      self.stats.current_streak = 0;
    }
    self.records.push(record);
    self.answer = Some(AnswerEvent { selected: index, correct, feedback_visible: true });
    self.phase = SessionPhase::Feedback;

    Some(outcome)
  }

  /// Leave `Feedback` and go back to `Loading` for the next draw.
  /// Clears the answer event and the current question.
  pub fn advance(&mut self) -> bool {
    if self.phase != SessionPhase::Feedback {
      return false;
    }
    self.current = None;
    self.answer = None;
    self.phase = SessionPhase::Loading;
    true
  }

  /// Explicit end action, legal from any phase. After this every other
  /// operation is a no-op. Returns false if already ended.
  pub fn end(&mut self) -> bool {
    if self.phase == SessionPhase::Ended {
      return false;
    }
    self.current = None;
    self.answer = None;
    self.phase = SessionPhase::Ended;
    true
  }

  /// Point-in-time view for protocol responses.
  pub fn snapshot(&self) -> SessionSnapshot {
    SessionSnapshot {
      id: self.id.clone(),
      phase: self.phase,
      question: self.current.clone(),
      answer: self.answer,
      stats: self.stats,
      elapsed_secs: self.elapsed_secs(),
    }
  }

  /// Summary used for the end-of-session fold into the profile.
  pub fn summary(&self) -> SessionSummary {
    let mut topics: Vec<String> = Vec::new();
    for r in &self.records {
      if !topics.contains(&r.topic) {
        topics.push(r.topic.clone());
      }
    }
    SessionSummary {
      questions_answered: self.stats.questions_answered,
      correct_answers: self.stats.correct_answers,
      accuracy: self.stats.accuracy(),
      duration_secs: self.elapsed_secs(),
      topics,
    }
  }

  #[cfg(test)]
  pub(crate) fn backdate_start(&mut self, secs: u64) {
    self.started_at = Instant::now() - std::time::Duration::from_secs(secs);
  }
}
