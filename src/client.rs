//! HTTP client for the RAG backend.
//!
//! Two calls: chat (`/api/v1/chat`) and quiz generation (`/api/v1/generate_quiz`).
//! Every failure collapses into `TransportError`, whose Display is the text shown to the user.
//! Calls log latency and payload sizes, never the query text itself.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::header::USER_AGENT;
use reqwest::StatusCode;
use thiserror::Error;
use tracing::{error, info, instrument, warn};

use crate::config::BackendCfg;
use crate::contract::{
  ApiQuizQuestion, ChatEnvelope, ChatRequest, ChatResponse, ErrorDetail, ModelOption, QuizApiResponse,
  QuizRequest,
};

/// Leading text of every transport-level failure shown to the user ("cannot reach server").
pub const UNREACHABLE_PREFIX: &str = "Không thể kết nối đến server";

const UNKNOWN_API_ERROR: &str = "Lỗi không xác định từ API.";

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum TransportError {
  /// No usable response: connection refused, DNS, timeout, body read failure.
  #[error("{}: {}", UNREACHABLE_PREFIX, .0)]
  Unreachable(String),
  /// A 2xx response whose body is not the expected shape.
  #[error("{}: {}", UNREACHABLE_PREFIX, .0)]
  Malformed(String),
  /// Non-2xx status; carries the server's detail or the status text.
  #[error("{0}")]
  Server(String),
  /// The backend answered with an application-level error payload.
  #[error("{0}")]
  Rejected(String),
}

/// What sessions need from the backend. `RagClient` is the HTTP implementation.
#[async_trait]
pub trait RagBackend: Send + Sync {
  async fn send_chat_query(
    &self,
    query: &str,
    model: ModelOption,
    top_k: u32,
  ) -> Result<ChatResponse, TransportError>;

  async fn generate_quiz(
    &self,
    topic: &str,
    count: u32,
    model: ModelOption,
  ) -> Result<Vec<ApiQuizQuestion>, TransportError>;
}

#[derive(Clone)]
pub struct RagClient {
  client: reqwest::Client,
  pub base_url: String,
  pub timeout: Duration,
}

impl RagClient {
  pub fn new(cfg: &BackendCfg) -> Result<Self, TransportError> {
    let timeout = Duration::from_secs(cfg.timeout_secs);
    let client = reqwest::Client::builder()
      .timeout(timeout)
      .build()
      .map_err(|e| TransportError::Unreachable(e.to_string()))?;

    Ok(Self { client, base_url: cfg.base_url.trim_end_matches('/').to_string(), timeout })
  }

  fn describe(&self, e: &reqwest::Error) -> String {
    if e.is_timeout() {
      format!("no response within {}s", self.timeout.as_secs())
    } else {
      e.to_string()
    }
  }

  #[instrument(target = "transport", level = "info", skip(self, query), fields(query_len = query.len()))]
  pub async fn send_chat_query(
    &self,
    query: &str,
    model: ModelOption,
    top_k: u32,
  ) -> Result<ChatResponse, TransportError> {
    let url = format!("{}/api/v1/chat", self.base_url);
    let start = Instant::now();

    let res = self.client.post(&url)
      .header(USER_AGENT, "history-rag-frontend/0.1")
      .json(&ChatRequest { query, top_k, model })
      .send().await
      .map_err(|e| {
        error!(target: "transport", error = %e, "Chat request failed before a response");
        TransportError::Unreachable(self.describe(&e))
      })?;

    let status = res.status();
    let body = res.text().await.map_err(|e| TransportError::Unreachable(self.describe(&e)))?;
    let elapsed = start.elapsed();

    if !status.is_success() {
      let msg = serde_json::from_str::<ErrorDetail>(&body)
        .ok()
        .and_then(|d| d.message())
        .unwrap_or_else(|| status_text(status));
      warn!(target: "transport", %status, ?elapsed, "Chat request rejected by server");
      return Err(TransportError::Server(msg));
    }

    let env: ChatEnvelope = serde_json::from_str(&body).map_err(|e| {
      error!(target: "transport", %status, body_len = body.len(), error = %e, "Chat response has unexpected shape");
      TransportError::Malformed(format!("JSON parse error: {}", e))
    })?;

    info!(target: "transport", ?elapsed, answer_len = env.response.answer.len(), sources = env.response.sources.len(), "Chat answer received");
    Ok(env.response)
  }

  #[instrument(target = "transport", level = "info", skip(self, topic), fields(topic_len = topic.len()))]
  pub async fn generate_quiz(
    &self,
    topic: &str,
    count: u32,
    model: ModelOption,
  ) -> Result<Vec<ApiQuizQuestion>, TransportError> {
    let url = format!("{}/api/v1/generate_quiz", self.base_url);
    let start = Instant::now();

    let res = self.client.post(&url)
      .header(USER_AGENT, "history-rag-frontend/0.1")
      .json(&QuizRequest { topic, k: count, model })
      .send().await
      .map_err(|e| {
        error!(target: "transport", error = %e, "Quiz request failed before a response");
        TransportError::Unreachable(self.describe(&e))
      })?;

    let status = res.status();
    let body = res.text().await.map_err(|e| TransportError::Unreachable(self.describe(&e)))?;
    let elapsed = start.elapsed();

    // The body is authoritative; the status code only matters when the body is unusable.
    let out = match serde_json::from_str::<QuizApiResponse>(&body) {
      Ok(QuizApiResponse::Error { message }) => {
        let msg = if !message.trim().is_empty() {
          message
        } else if status.is_success() {
          UNKNOWN_API_ERROR.to_string()
        } else {
          status_text(status)
        };
        Err(TransportError::Rejected(msg))
      }
      Ok(QuizApiResponse::Success { questions }) if status.is_success() => Ok(questions),
      Ok(QuizApiResponse::Success { .. }) => Err(TransportError::Server(status_text(status))),
      Err(_) if !status.is_success() => Err(TransportError::Server(status_text(status))),
      Err(e) => Err(TransportError::Malformed(format!("JSON parse error: {}", e))),
    };

    match &out {
      Ok(qs) => info!(target: "transport", ?elapsed, questions = qs.len(), "Quiz batch received"),
      Err(e) => warn!(target: "transport", %status, ?elapsed, error = %e, "Quiz generation failed"),
    }
    out
  }
}

#[async_trait]
impl RagBackend for RagClient {
  async fn send_chat_query(
    &self,
    query: &str,
    model: ModelOption,
    top_k: u32,
  ) -> Result<ChatResponse, TransportError> {
    RagClient::send_chat_query(self, query, model, top_k).await
  }

  async fn generate_quiz(
    &self,
    topic: &str,
    count: u32,
    model: ModelOption,
  ) -> Result<Vec<ApiQuizQuestion>, TransportError> {
    RagClient::generate_quiz(self, topic, count, model).await
  }
}

fn status_text(status: StatusCode) -> String {
  format!("Lỗi từ server: {}", status.canonical_reason().unwrap_or(status.as_str()))
}
