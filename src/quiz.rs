//! Quiz store: the current question batch, which answers are revealed, the quiz
//! parameters and the quiz-scoped error banner.

use std::collections::HashSet;

use tracing::{debug, warn};

use crate::client::TransportError;
use crate::contract::ApiQuizQuestion;
use crate::domain::{enrich_batch, QuizQuestion};

#[derive(Debug)]
pub struct QuizStore {
    questions: Vec<QuizQuestion>,
    revealed: HashSet<String>,
    error: Option<String>,
    topic: String,
    count: u32,
    default_count: u32,
    max_count: u32,
}

impl QuizStore {
    pub fn new(default_count: u32, max_count: u32) -> Self {
        let max_count = max_count.max(1);
        let default_count = default_count.clamp(1, max_count);
        Self {
            questions: Vec::new(),
            revealed: HashSet::new(),
            error: None,
            topic: String::new(),
            count: default_count,
            default_count,
            max_count,
        }
    }

    pub fn questions(&self) -> &[QuizQuestion] {
        &self.questions
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn max_count(&self) -> u32 {
        self.max_count
    }

    pub fn is_revealed(&self, id: &str) -> bool {
        self.revealed.contains(id)
    }

    #[cfg(test)]
    pub fn revealed_len(&self) -> usize {
        self.revealed.len()
    }

    pub fn set_topic(&mut self, topic: impl Into<String>) {
        self.topic = topic.into();
    }

    /// Clamped to `1..=max_count`; returns the value actually stored.
    pub fn set_count(&mut self, count: i64) -> u32 {
        self.count = count.clamp(1, self.max_count as i64) as u32;
        self.count
    }

    /// Start of a generation attempt: the previous batch, reveal set and banner all go.
    pub fn begin_generation(&mut self) {
        self.questions.clear();
        self.revealed.clear();
        self.error = None;
    }

    /// Apply the outcome of a generation attempt.
    pub fn finish_generation(&mut self, result: Result<Vec<ApiQuizQuestion>, TransportError>, batch_ms: i64) {
        match result {
            Ok(batch) => {
                let questions = enrich_batch(batch, batch_ms);
                for q in questions.iter().filter(|q| q.correct_key.is_none()) {
                    let keys: String = q.options.keys().map(|k| k.as_str()).collect();
                    warn!(target: "session", id = %q.id, correct_answer = %q.correct_answer, options = %keys, "Correct answer does not name an available option");
                }
                debug!(target: "session", questions = questions.len(), "Quiz batch stored");
                self.questions = questions;
            }
            Err(e) => {
                self.error = Some(e.to_string());
            }
        }
    }

    /// Flip one question between hidden and revealed. Unknown ids are ignored.
    pub fn toggle_reveal(&mut self, id: &str) {
        if !self.questions.iter().any(|q| q.id == id) {
            return;
        }
        if !self.revealed.remove(id) {
            self.revealed.insert(id.to_string());
        }
    }

    pub fn reset(&mut self) {
        self.begin_generation();
        self.topic.clear();
        self.count = self.default_count;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract::ChoiceKey;

    fn api_q(text: &str) -> ApiQuizQuestion {
        ApiQuizQuestion {
            question: text.into(),
            options: [(ChoiceKey::A, "a".to_string()), (ChoiceKey::B, "b".to_string())].into_iter().collect(),
            correct_answer: "A".into(),
        }
    }

    fn loaded(n: usize, batch_ms: i64) -> QuizStore {
        let mut store = QuizStore::new(3, 10);
        store.begin_generation();
        store.finish_generation(Ok((0..n).map(|_| api_q("same")).collect()), batch_ms);
        store
    }

    #[test]
    fn toggle_twice_restores_reveal_set() {
        let mut store = loaded(2, 1);
        let id = store.questions()[0].id.clone();

        store.toggle_reveal(&id);
        assert!(store.is_revealed(&id));
        store.toggle_reveal(&id);
        assert!(!store.is_revealed(&id));
        assert_eq!(store.revealed_len(), 0);
    }

    #[test]
    fn toggles_are_independent_per_question() {
        let mut store = loaded(3, 1);
        let ids: Vec<_> = store.questions().iter().map(|q| q.id.clone()).collect();
        store.toggle_reveal(&ids[0]);
        store.toggle_reveal(&ids[2]);
        assert!(store.is_revealed(&ids[0]));
        assert!(!store.is_revealed(&ids[1]));
        assert!(store.is_revealed(&ids[2]));
    }

    #[test]
    fn unknown_id_is_a_no_op() {
        let mut store = loaded(1, 1);
        store.toggle_reveal("q-missing-0");
        assert_eq!(store.revealed_len(), 0);
    }

    #[test]
    fn new_generation_clears_reveal_set() {
        let mut store = loaded(2, 1);
        let id = store.questions()[1].id.clone();
        store.toggle_reveal(&id);

        store.begin_generation();
        assert_eq!(store.revealed_len(), 0);
        assert!(store.questions().is_empty());

        store.finish_generation(Ok(vec![api_q("other")]), 2);
        assert_eq!(store.revealed_len(), 0);
        assert_eq!(store.questions()[0].id, "q-2-0");
    }

    #[test]
    fn failure_sets_banner_and_next_attempt_clears_it() {
        let mut store = QuizStore::new(3, 10);
        store.begin_generation();
        store.finish_generation(Err(TransportError::Rejected("No context found".into())), 1);
        assert_eq!(store.error(), Some("No context found"));
        assert!(store.questions().is_empty());

        store.begin_generation();
        assert_eq!(store.error(), None);
    }

    #[test]
    fn count_is_clamped() {
        let mut store = QuizStore::new(3, 10);
        assert_eq!(store.count(), 3);
        assert_eq!(store.set_count(0), 1);
        assert_eq!(store.set_count(-4), 1);
        assert_eq!(store.set_count(42), 10);
        assert_eq!(store.set_count(7), 7);
    }

    #[test]
    fn reset_restores_parameters() {
        let mut store = loaded(2, 1);
        store.set_topic("Nhà Trần");
        store.set_count(9);
        store.reset();
        assert!(store.questions().is_empty());
        assert_eq!(store.topic(), "");
        assert_eq!(store.count(), 3);
    }
}
