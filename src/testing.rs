//! In-process stand-in for the RAG backend, shared by the session and socket tests.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::Semaphore;

use crate::client::{RagBackend, TransportError};
use crate::config::AppConfig;
use crate::contract::{ApiQuizQuestion, ChatResponse, ChoiceKey, ModelOption};
use crate::session::Session;

pub struct FakeBackend {
    chat: Result<ChatResponse, TransportError>,
    quiz: Result<Vec<ApiQuizQuestion>, TransportError>,
    pub gate: Semaphore,
    /// Model of every call that reached the backend, in order.
    pub models: Mutex<Vec<ModelOption>>,
}

impl FakeBackend {
    pub fn new(
        chat: Result<ChatResponse, TransportError>,
        quiz: Result<Vec<ApiQuizQuestion>, TransportError>,
    ) -> Self {
        Self { chat, quiz, gate: Semaphore::new(Semaphore::MAX_PERMITS), models: Mutex::new(Vec::new()) }
    }

    /// Only `calls` requests go through until more permits are added.
    pub fn with_permits(mut self, calls: usize) -> Self {
        self.gate = Semaphore::new(calls);
        self
    }

    pub fn gated(self) -> Self {
        self.with_permits(0)
    }

    pub fn seen_models(&self) -> Vec<ModelOption> {
        self.models.lock().unwrap().clone()
    }
}

#[async_trait]
impl RagBackend for FakeBackend {
    async fn send_chat_query(&self, _q: &str, model: ModelOption, _k: u32) -> Result<ChatResponse, TransportError> {
        self.models.lock().unwrap().push(model);
        self.gate.acquire().await.unwrap().forget();
        self.chat.clone()
    }

    async fn generate_quiz(&self, _t: &str, _c: u32, model: ModelOption) -> Result<Vec<ApiQuizQuestion>, TransportError> {
        self.models.lock().unwrap().push(model);
        self.gate.acquire().await.unwrap().forget();
        self.quiz.clone()
    }
}

pub fn answer(text: &str) -> Result<ChatResponse, TransportError> {
    Ok(ChatResponse { answer: text.into(), sources: Vec::new() })
}

pub fn question(text: &str) -> ApiQuizQuestion {
    ApiQuizQuestion {
        question: text.into(),
        options: [ChoiceKey::A, ChoiceKey::B, ChoiceKey::C, ChoiceKey::D]
            .into_iter()
            .map(|k| (k, k.as_str().to_lowercase()))
            .collect(),
        correct_answer: "B".into(),
    }
}

pub fn session_with(backend: FakeBackend) -> (Arc<Session>, Arc<FakeBackend>) {
    let backend = Arc::new(backend);
    let session = Arc::new(Session::new(backend.clone(), &AppConfig::default()));
    (session, backend)
}
