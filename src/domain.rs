//! Domain models held by a session: conversation messages, quiz questions, mode.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::contract::{ApiQuizQuestion, ChoiceKey, Source};

/// Who produced a transcript entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Role {
  User,
  Model,
  /// Synthetic entry describing a failed request.
  Error,
}

impl Role {
  pub fn as_str(self) -> &'static str {
    match self {
      Role::User => "user",
      Role::Model => "model",
      Role::Error => "error",
    }
  }
}

/// One transcript entry. Never mutated after it is appended.
#[derive(Clone, Debug, PartialEq)]
pub struct Message {
  pub id: String,
  pub role: Role,
  pub content: String,
  pub sources: Vec<Source>,
}

/// Which panel the session is showing.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
  #[default]
  Chat,
  Quiz,
}

/// A backend question plus the id the client assigns on receipt.
#[derive(Clone, Debug, PartialEq)]
pub struct QuizQuestion {
  pub id: String,
  pub question: String,
  pub options: BTreeMap<ChoiceKey, String>,
  pub correct_answer: String,
  /// `correct_answer` resolved against `options`; None when it names a missing option.
  pub correct_key: Option<ChoiceKey>,
}

/// Assign ids to a freshly received batch: `q-<batch_ms>-<index>`.
/// Unique within the batch even when two questions carry identical text.
pub fn enrich_batch(questions: Vec<ApiQuizQuestion>, batch_ms: i64) -> Vec<QuizQuestion> {
  questions
    .into_iter()
    .enumerate()
    .map(|(i, q)| {
      let correct_key = q.correct_key();
      QuizQuestion {
        id: format!("q-{}-{}", batch_ms, i),
        question: q.question,
        options: q.options,
        correct_answer: q.correct_answer,
        correct_key,
      }
    })
    .collect()
}

#[cfg(test)]
mod tests {
  use super::*;

  fn q(text: &str, correct: &str) -> ApiQuizQuestion {
    ApiQuizQuestion {
      question: text.into(),
      options: [ChoiceKey::A, ChoiceKey::B, ChoiceKey::C, ChoiceKey::D]
        .into_iter()
        .map(|k| (k, format!("option {}", k.as_str())))
        .collect(),
      correct_answer: correct.into(),
    }
  }

  #[test]
  fn identical_questions_get_distinct_ids() {
    let batch = enrich_batch(vec![q("Same?", "A"), q("Same?", "A"), q("Same?", "A")], 1_700_000_000_000);
    let ids: Vec<_> = batch.iter().map(|q| q.id.as_str()).collect();
    assert_eq!(ids, vec!["q-1700000000000-0", "q-1700000000000-1", "q-1700000000000-2"]);
  }

  #[test]
  fn enrichment_keeps_server_fields_and_resolves_key() {
    let batch = enrich_batch(vec![q("Năm nào?", "c")], 5);
    assert_eq!(batch[0].question, "Năm nào?");
    assert_eq!(batch[0].correct_answer, "c");
    assert_eq!(batch[0].correct_key, Some(ChoiceKey::C));
  }
}
