//! Domain models used by the backend: questions, user profiles, exams,
//! and the per-question answer records a practice session accumulates.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Where did a question come from?
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum QuestionSource {
  Seed,       // built-in pool
  LocalBank,  // from user-provided TOML bank
  AdminAdded, // inserted at runtime via the admin console
}

/// A multiple-choice question. Immutable once loaded; the pool is validated
/// at load time (see `Question::validate`), so serving code never re-checks.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Question {
  pub id: String,
  pub prompt: String,
  pub options: Vec<String>,
  pub correct_answer: usize,
  pub explanation: String,
  pub topic: String,      // free-form label (e.g. "Algebra")
  pub difficulty: String, // free-form label (e.g. "Medium")
  pub source: QuestionSource,
}

impl Question {
  /// A question is servable when it has at least two options and the
  /// correct index points at one of them. Prompt must be non-empty.
  pub fn validate(&self) -> Result<(), String> {
    if self.prompt.trim().is_empty() {
      return Err("empty prompt".into());
    }
    if self.options.len() < 2 {
      return Err(format!("needs at least 2 options, has {}", self.options.len()));
    }
    if self.correct_answer >= self.options.len() {
      return Err(format!(
        "correct_answer {} out of range (options: {})",
        self.correct_answer,
        self.options.len()
      ));
    }
    Ok(())
  }
}

/// Account role, read from the profile document. Defaults to `Student`.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Role {
  Student,
  Admin,
}

impl Default for Role {
  fn default() -> Self {
    Role::Student
  }
}

/// Study preferences stored on the profile document.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Preferences {
  pub subjects: Vec<String>,
  pub exam_type: String,
  pub study_goals: Vec<String>,
}

/// Per-topic tally folded into the profile when a session ends.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize)]
pub struct TopicTally {
  pub answered: u32,
  pub correct: u32,
}

impl TopicTally {
  pub fn accuracy(&self) -> u32 {
    if self.answered == 0 {
      0
    } else {
      ((self.correct as f64 / self.answered as f64) * 100.0).round() as u32
    }
  }
}

/// Summary of one finished practice session, kept on the profile.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
  pub questions_answered: u32,
  pub correct_answers: u32,
  pub accuracy: u32,
  pub duration_secs: u64,
  pub topics: Vec<String>,
}

/// Running performance aggregates on the profile document.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Performance {
  pub total_questions: u32,
  pub correct_answers: u32,
  pub topics: HashMap<String, TopicTally>,
  pub practice_sessions: Vec<SessionSummary>,
}

/// User profile document (the in-memory stand-in for the hosted store).
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
  pub id: String,
  pub display_name: String,
  pub email: String,
  pub role: Role,
  pub created_at: u64, // unix seconds
  pub last_login: u64, // unix seconds
  pub preferences: Preferences,
  pub performance: Performance,
}

/// One resolved answer inside a practice session. Appended on every
/// accepted selection, folded into the profile at session end.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerRecord {
  pub id: String,
  pub question_id: String,
  pub topic: String,
  pub difficulty: String,
  pub selected: usize,
  pub correct: bool,
  pub offset_secs: u64, // seconds into the session when answered
}

/// Catalog entry for the timed-exam browser. Read-only seed/bank data.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExamDefinition {
  pub id: String,
  pub title: String,
  pub description: String,
  pub duration_mins: u32,
  pub question_count: u32,
  pub difficulty: String,
  pub topics: Vec<String>,
}
