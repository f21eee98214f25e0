//! One browser session: conversation + quiz stores and the flags they share
//! (active mode, selected model, the single outstanding-request slot).
//!
//! Store mutations go through a `std::sync::Mutex` that is never held across an
//! `.await`. Network calls run outside the lock under a `RequestTicket`, which
//! clears the in-flight flag when dropped, whatever way the call ends.
//! Every mutation pings `changed()` so the socket loop can re-render.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use thiserror::Error;
use tokio::sync::Notify;
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::client::RagBackend;
use crate::config::AppConfig;
use crate::contract::ModelOption;
use crate::conversation::ConversationStore;
use crate::domain::Mode;
use crate::quiz::QuizStore;
use crate::view::{self, ViewModel};

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("Đang xử lý yêu cầu trước đó, vui lòng chờ.")]
    Busy,
    #[error("Vui lòng nhập câu hỏi.")]
    EmptyInput,
}

/// Single-slot request token: at most one outstanding request per session.
#[derive(Debug, Default)]
pub struct RequestSlot {
    busy: Arc<AtomicBool>,
}

impl RequestSlot {
    pub fn try_acquire(&self) -> Option<RequestTicket> {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| RequestTicket { busy: self.busy.clone() })
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }
}

/// Held for the lifetime of one request; releases the slot on drop.
#[derive(Debug)]
pub struct RequestTicket {
    busy: Arc<AtomicBool>,
}

impl Drop for RequestTicket {
    fn drop(&mut self) {
        self.busy.store(false, Ordering::Release);
    }
}

/// Mutable part of a session, only touched under the session lock.
#[derive(Debug)]
pub struct SessionState {
    pub mode: Mode,
    pub model: ModelOption,
    pub conversation: ConversationStore,
    pub quiz: QuizStore,
}

pub struct Session {
    pub id: String,
    backend: Arc<dyn RagBackend>,
    top_k: u32,
    state: Mutex<SessionState>,
    slot: RequestSlot,
    changed: Notify,
}

impl Session {
    pub fn new(backend: Arc<dyn RagBackend>, cfg: &AppConfig) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            backend,
            top_k: cfg.backend.top_k,
            state: Mutex::new(SessionState {
                mode: Mode::Chat,
                model: cfg.ui.default_model,
                conversation: ConversationStore::new(cfg.ui.greeting.clone()),
                quiz: QuizStore::new(cfg.quiz.default_count, cfg.quiz.max_questions),
            }),
            slot: RequestSlot::default(),
            changed: Notify::new(),
        }
    }

    fn state(&self) -> MutexGuard<'_, SessionState> {
        // a panicking writer leaves the stores consistent (appends are single pushes)
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Run a read-only closure against the current state.
    #[cfg(test)]
    pub fn with_state<R>(&self, f: impl FnOnce(&SessionState) -> R) -> R {
        f(&*self.state())
    }

    pub fn in_flight(&self) -> bool {
        self.slot.is_busy()
    }

    /// Resolves after the next state change (a change that happened while nobody
    /// was waiting is kept as a single pending wake-up).
    pub fn changed(&self) -> &Notify {
        &self.changed
    }

    fn notify(&self) {
        self.changed.notify_one();
    }

    /// Render the current state.
    pub fn view(&self) -> ViewModel {
        let in_flight = self.in_flight();
        view::project(&self.state(), in_flight)
    }

    /// Admit a chat request: validate, take the slot, append the user message
    /// and pin the model. Nothing awaits here, so the slot is held before the
    /// caller handles its next action.
    pub fn start_chat(&self, text: &str) -> Result<PendingChat, SessionError> {
        if text.trim().is_empty() {
            return Err(SessionError::EmptyInput);
        }
        let pending = {
            let mut st = self.state();
            let ticket = self.slot.try_acquire().ok_or(SessionError::Busy)?;
            st.conversation.append_user_message(text);
            PendingChat { ticket, query: text.to_string(), model: st.model }
        };
        self.notify();
        Ok(pending)
    }

    /// Backend call for an admitted chat request, then the model or error message.
    #[instrument(target = "session", level = "info", skip_all, fields(session = %self.id, model = %pending.model))]
    pub async fn finish_chat(&self, pending: PendingChat) {
        let PendingChat { ticket, query, model } = pending;
        let result = self.backend.send_chat_query(&query, model, self.top_k).await;

        {
            let mut st = self.state();
            match result {
                Ok(resp) => {
                    st.conversation.append_model_message(resp.answer, resp.sources);
                }
                Err(e) => {
                    info!(target: "session", session = %self.id, error = %e, "Chat request failed");
                    st.conversation.append_error_message(e.to_string());
                }
            }
            drop(ticket);
        }
        self.notify();
    }

    /// Full chat cycle: user message, backend call, model or error message.
    pub async fn send_chat(&self, text: &str) -> Result<(), SessionError> {
        let pending = self.start_chat(text)?;
        self.finish_chat(pending).await;
        Ok(())
    }

    /// Admit a quiz request. `topic`/`count` update the stored parameters first
    /// when given; the previous batch, reveals and error are cleared.
    pub fn start_quiz(&self, topic: Option<String>, count: Option<i64>) -> Result<PendingQuiz, SessionError> {
        let pending = {
            let mut st = self.state();
            let ticket = self.slot.try_acquire().ok_or(SessionError::Busy)?;
            if let Some(t) = topic {
                st.quiz.set_topic(t);
            }
            if let Some(c) = count {
                st.quiz.set_count(c);
            }
            st.quiz.begin_generation();
            PendingQuiz { ticket, topic: st.quiz.topic().to_string(), count: st.quiz.count(), model: st.model }
        };
        self.notify();
        Ok(pending)
    }

    #[instrument(target = "session", level = "info", skip_all, fields(session = %self.id, model = %pending.model, count = pending.count))]
    pub async fn finish_quiz(&self, pending: PendingQuiz) {
        let PendingQuiz { ticket, topic, count, model } = pending;
        let result = self.backend.generate_quiz(&topic, count, model).await;
        let batch_ms = chrono::Utc::now().timestamp_millis();

        {
            let mut st = self.state();
            st.quiz.finish_generation(result, batch_ms);
            drop(ticket);
        }
        self.notify();
    }

    /// Full quiz cycle.
    pub async fn generate_quiz(&self, topic: Option<String>, count: Option<i64>) -> Result<(), SessionError> {
        let pending = self.start_quiz(topic, count)?;
        self.finish_quiz(pending).await;
        Ok(())
    }

    pub fn toggle_reveal(&self, id: &str) {
        self.state().quiz.toggle_reveal(id);
        self.notify();
    }

    pub fn switch_mode(&self, mode: Mode) -> Result<(), SessionError> {
        self.while_idle(|st| st.mode = mode)?;
        debug!(target: "session", session = %self.id, ?mode, "Mode switched");
        Ok(())
    }

    pub fn select_model(&self, model: ModelOption) -> Result<(), SessionError> {
        self.while_idle(|st| st.model = model)
    }

    pub fn set_quiz_topic(&self, topic: String) -> Result<(), SessionError> {
        self.while_idle(|st| st.quiz.set_topic(topic))
    }

    pub fn set_quiz_count(&self, count: i64) -> Result<(), SessionError> {
        self.while_idle(|st| {
            st.quiz.set_count(count);
        })
    }

    /// Both stores back to their initial state; mode and model are kept.
    pub fn reset(&self) -> Result<(), SessionError> {
        self.while_idle(|st| {
            st.conversation.reset();
            st.quiz.reset();
        })
    }

    /// Controls that are disabled while a request is outstanding go through here.
    /// The slot is checked under the state lock, the same lock `start_*` take it under.
    fn while_idle(&self, f: impl FnOnce(&mut SessionState)) -> Result<(), SessionError> {
        {
            let mut st = self.state();
            if self.in_flight() {
                return Err(SessionError::Busy);
            }
            f(&mut *st);
        }
        self.notify();
        Ok(())
    }
}

/// An admitted chat request. Holds the session's request slot until dropped.
#[derive(Debug)]
pub struct PendingChat {
    ticket: RequestTicket,
    query: String,
    model: ModelOption,
}

/// An admitted quiz request, parameters fixed at admission.
#[derive(Debug)]
pub struct PendingQuiz {
    ticket: RequestTicket,
    topic: String,
    count: u32,
    model: ModelOption,
}
