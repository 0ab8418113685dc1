//! Loading the optional question bank (questions + exam catalog) from TOML.
//!
//! Pointed at by the `QUESTION_BANK_PATH` env variable. On any IO/parse
//! error the bank is skipped and the built-in seeds carry the service.

use serde::Deserialize;
use tracing::{error, info};

#[derive(Clone, Debug, Deserialize, Default)]
pub struct BankConfig {
  #[serde(default)]
  pub questions: Vec<QuestionCfg>,
  #[serde(default)]
  pub exams: Vec<ExamCfg>,
}

/// Question entry accepted in TOML configuration. Entries that fail
/// validation (bad correct index, fewer than two options) are skipped at
/// load time with an error log; they never reach the serving pool.
#[derive(Clone, Debug, Deserialize)]
pub struct QuestionCfg {
  #[serde(default)]
  pub id: Option<String>,
  pub prompt: String,
  pub options: Vec<String>,
  pub correct_answer: usize,
  #[serde(default)]
  pub explanation: String,
  pub topic: String,
  #[serde(default = "default_difficulty")]
  pub difficulty: String,
}

fn default_difficulty() -> String {
  "Medium".into()
}

/// Exam catalog entry accepted in TOML configuration.
#[derive(Clone, Debug, Deserialize)]
pub struct ExamCfg {
  #[serde(default)]
  pub id: Option<String>,
  pub title: String,
  #[serde(default)]
  pub description: String,
  pub duration_mins: u32,
  pub question_count: u32,
  #[serde(default = "default_difficulty")]
  pub difficulty: String,
  #[serde(default)]
  pub topics: Vec<String>,
}

/// Attempt to load `BankConfig` from QUESTION_BANK_PATH. On any
/// parsing/IO error, returns None.
pub fn load_bank_from_env() -> Option<BankConfig> {
  let path = std::env::var("QUESTION_BANK_PATH").ok()?;
  match std::fs::read_to_string(&path) {
    Ok(s) => match toml::from_str::<BankConfig>(&s) {
      Ok(cfg) => {
        info!(target: "aceprep_backend", %path, questions = cfg.questions.len(), exams = cfg.exams.len(), "Loaded question bank (TOML)");
        Some(cfg)
      }
      Err(e) => {
        error!(target: "aceprep_backend", %path, error = %e, "Failed to parse TOML question bank");
        None
      }
    },
    Err(e) => {
      error!(target: "aceprep_backend", %path, error = %e, "Failed to read TOML question bank file");
      None
    }
  }
}
