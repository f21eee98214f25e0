//! Front-end configuration: backend location, request policy, quiz limits, UI defaults.
//!
//! Loaded from the TOML file named by FRONTEND_CONFIG_PATH (every section optional),
//! then overridden by PORT, RAG_BACKEND_URL and RAG_TIMEOUT_SECS.

use serde::Deserialize;
use tracing::{error, info, warn};

use crate::contract::ModelOption;

pub const DEFAULT_GREETING: &str =
  "Xin chào! Hãy chọn chế độ \"Hỏi đáp\" hoặc \"Tạo trắc nghiệm\".";

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct AppConfig {
  pub port: u16,
  pub backend: BackendCfg,
  pub quiz: QuizCfg,
  pub ui: UiCfg,
}

impl Default for AppConfig {
  fn default() -> Self {
    Self {
      port: 3000,
      backend: BackendCfg::default(),
      quiz: QuizCfg::default(),
      ui: UiCfg::default(),
    }
  }
}

/// Where the RAG backend lives and how we talk to it.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct BackendCfg {
  pub base_url: String,
  /// Whole-request timeout. A hung backend surfaces as an unreachable error after this.
  pub timeout_secs: u64,
  /// Context chunks requested per chat query.
  pub top_k: u32,
}

impl Default for BackendCfg {
  fn default() -> Self {
    Self { base_url: "http://127.0.0.1:8000".into(), timeout_secs: 60, top_k: 5 }
  }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct QuizCfg {
  pub default_count: u32,
  pub max_questions: u32,
}

impl Default for QuizCfg {
  fn default() -> Self {
    Self { default_count: 3, max_questions: 10 }
  }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct UiCfg {
  pub greeting: String,
  pub default_model: ModelOption,
}

impl Default for UiCfg {
  fn default() -> Self {
    Self { greeting: DEFAULT_GREETING.into(), default_model: ModelOption::Gemini }
  }
}

impl AppConfig {
  /// File (if any) first, then env overrides. Never fails: bad input falls back to defaults.
  pub fn load() -> Self {
    let mut cfg = load_file_from_env().unwrap_or_default();
    cfg.apply_env_overrides();
    cfg.normalize();
    cfg
  }

  fn apply_env_overrides(&mut self) {
    if let Some(port) = std::env::var("PORT").ok().and_then(|p| p.parse::<u16>().ok()) {
      self.port = port;
    }
    if let Ok(url) = std::env::var("RAG_BACKEND_URL") {
      if !url.trim().is_empty() {
        self.backend.base_url = url;
      }
    }
    if let Some(secs) = std::env::var("RAG_TIMEOUT_SECS").ok().and_then(|s| s.parse::<u64>().ok()) {
      self.backend.timeout_secs = secs;
    }
  }

  /// Keep values inside the ranges the stores and client rely on.
  fn normalize(&mut self) {
    self.backend.base_url = self.backend.base_url.trim_end_matches('/').to_string();
    if self.backend.timeout_secs == 0 {
      warn!(target: "rag_frontend", "backend.timeout_secs = 0 is not allowed; using 60");
      self.backend.timeout_secs = 60;
    }
    if self.backend.top_k == 0 {
      self.backend.top_k = 1;
    }
    if self.quiz.max_questions == 0 {
      self.quiz.max_questions = 1;
    }
    self.quiz.default_count = self.quiz.default_count.clamp(1, self.quiz.max_questions);
  }
}

fn load_file_from_env() -> Option<AppConfig> {
  let path = std::env::var("FRONTEND_CONFIG_PATH").ok()?;
  match std::fs::read_to_string(&path) {
    Ok(s) => match toml::from_str::<AppConfig>(&s) {
      Ok(cfg) => {
        info!(target: "rag_frontend", %path, "Loaded front-end config (TOML)");
        Some(cfg)
      }
      Err(e) => {
        error!(target: "rag_frontend", %path, error = %e, "Failed to parse TOML config");
        None
      }
    },
    Err(e) => {
      error!(target: "rag_frontend", %path, error = %e, "Failed to read TOML config file");
      None
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn partial_file_keeps_defaults() {
    let cfg: AppConfig = toml::from_str(
      r#"
      [backend]
      base_url = "http://rag.local:9000/"

      [ui]
      default_model = "qwen"
      "#,
    )
    .unwrap();

    assert_eq!(cfg.port, 3000);
    assert_eq!(cfg.backend.top_k, 5);
    assert_eq!(cfg.backend.timeout_secs, 60);
    assert_eq!(cfg.quiz.max_questions, 10);
    assert_eq!(cfg.ui.default_model, ModelOption::Qwen);
    assert_eq!(cfg.ui.greeting, DEFAULT_GREETING);
  }

  #[test]
  fn normalize_trims_slash_and_clamps_counts() {
    let mut cfg: AppConfig = toml::from_str(
      r#"
      [backend]
      base_url = "http://rag.local:9000/"
      timeout_secs = 0

      [quiz]
      default_count = 25
      max_questions = 8
      "#,
    )
    .unwrap();
    cfg.normalize();

    assert_eq!(cfg.backend.base_url, "http://rag.local:9000");
    assert_eq!(cfg.backend.timeout_secs, 60);
    assert_eq!(cfg.quiz.default_count, 8);
  }
}
