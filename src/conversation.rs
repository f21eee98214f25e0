//! Conversation store: the ordered chat transcript of one session.
//!
//! Append-only within a session; `reset` starts over from the greeting.

use tracing::debug;

use crate::contract::Source;
use crate::domain::{Message, Role};

pub const GREETING_ID: &str = "init";

#[derive(Debug)]
pub struct ConversationStore {
    greeting: String,
    messages: Vec<Message>,
    next_seq: u64,
}

impl ConversationStore {
    pub fn new(greeting: impl Into<String>) -> Self {
        let mut store = Self { greeting: greeting.into(), messages: Vec::new(), next_seq: 0 };
        store.reset();
        store
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn append_user_message(&mut self, text: impl Into<String>) -> &Message {
        self.push(Role::User, text.into(), Vec::new())
    }

    pub fn append_model_message(&mut self, answer: impl Into<String>, sources: Vec<Source>) -> &Message {
        self.push(Role::Model, answer.into(), sources)
    }

    pub fn append_error_message(&mut self, text: impl Into<String>) -> &Message {
        self.push(Role::Error, text.into(), Vec::new())
    }

    /// Drop the transcript and start again from the greeting.
    pub fn reset(&mut self) {
        self.messages.clear();
        if !self.greeting.is_empty() {
            self.messages.push(Message {
                id: GREETING_ID.to_string(),
                role: Role::Model,
                content: self.greeting.clone(),
                sources: Vec::new(),
            });
        }
    }

    fn push(&mut self, role: Role, content: String, sources: Vec<Source>) -> &Message {
        // ids keep increasing across resets so the browser never sees a reused key
        self.next_seq += 1;
        let id = format!("{}-{}", role.as_str(), self.next_seq);
        debug!(target: "session", %id, content_len = content.len(), sources = sources.len(), "Transcript append");
        self.messages.push(Message { id, role, content, sources });
        &self.messages[self.messages.len() - 1]
    }
}
