//! Request/response shapes exchanged with the RAG backend (serde ready).
//! No behavior beyond decoding helpers; the transport client owns the HTTP side.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

/// Generation model the backend should use.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelOption {
    #[default]
    Gemini,
    Qwen,
}

impl ModelOption {
    pub const ALL: [ModelOption; 2] = [ModelOption::Gemini, ModelOption::Qwen];

    pub fn as_str(self) -> &'static str {
        match self {
            ModelOption::Gemini => "gemini",
            ModelOption::Qwen => "qwen",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ModelOption::Gemini => "API Gemini",
            ModelOption::Qwen => "Qwen 1.7B (Local)",
        }
    }
}

impl fmt::Display for ModelOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

//
// Chat
//

#[derive(Debug, Serialize)]
pub struct ChatRequest<'a> {
    pub query: &'a str,
    pub top_k: u32,
    pub model: ModelOption,
}

/// The backend wraps the answer; callers only ever see the inner `ChatResponse`.
#[derive(Debug, Deserialize)]
pub struct ChatEnvelope {
    pub response: ChatResponse,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct ChatResponse {
    pub answer: String,
    #[serde(default)]
    pub sources: Vec<Source>,
}

/// A retrieved chunk cited by an answer.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct Source {
    // chunk ids come back as numbers or strings depending on the index
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(default)]
    pub hierarchy: Option<String>,
    #[serde(default)]
    pub content_preview: String,
}

impl Source {
    pub fn hierarchy_or_na(&self) -> &str {
        match self.hierarchy.as_deref() {
            Some(h) if !h.trim().is_empty() => h,
            _ => "N/A",
        }
    }
}

/// Error body of a failed chat call (FastAPI style).
#[derive(Debug, Deserialize)]
pub struct ErrorDetail {
    #[serde(default)]
    pub detail: Option<serde_json::Value>,
}

impl ErrorDetail {
    /// String details are taken as-is; structured ones (validation errors) are rendered as JSON.
    pub fn message(&self) -> Option<String> {
        match &self.detail {
            None | Some(serde_json::Value::Null) => None,
            Some(serde_json::Value::String(s)) if s.is_empty() => None,
            Some(serde_json::Value::String(s)) => Some(s.clone()),
            Some(other) => Some(other.to_string()),
        }
    }
}

//
// Quiz
//

#[derive(Debug, Serialize)]
pub struct QuizRequest<'a> {
    pub topic: &'a str,
    pub k: u32,
    pub model: ModelOption,
}

/// Answer choice key. Ordering is the display order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ChoiceKey {
    A,
    B,
    C,
    D,
}

impl ChoiceKey {
    pub fn as_str(self) -> &'static str {
        match self {
            ChoiceKey::A => "A",
            ChoiceKey::B => "B",
            ChoiceKey::C => "C",
            ChoiceKey::D => "D",
        }
    }

    /// Lenient parse: surrounding whitespace and lowercase are accepted.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim() {
            "A" | "a" => Some(ChoiceKey::A),
            "B" | "b" => Some(ChoiceKey::B),
            "C" | "c" => Some(ChoiceKey::C),
            "D" | "d" => Some(ChoiceKey::D),
            _ => None,
        }
    }
}

/// One question as the backend returns it (no id).
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct ApiQuizQuestion {
    pub question: String,
    pub options: BTreeMap<ChoiceKey, String>,
    pub correct_answer: String,
}

impl ApiQuizQuestion {
    /// The correct key, only when it names one of the options actually present.
    pub fn correct_key(&self) -> Option<ChoiceKey> {
        ChoiceKey::parse(&self.correct_answer).filter(|k| self.options.contains_key(k))
    }
}

/// Quiz results are reported in the body, whatever the HTTP status says.
#[derive(Debug, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum QuizApiResponse {
    Success {
        #[serde(default)]
        questions: Vec<ApiQuizQuestion>,
    },
    Error {
        #[serde(default)]
        message: String,
    },
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Str(String),
        Int(i64),
        Float(f64),
    }
    Ok(match Raw::deserialize(deserializer)? {
        Raw::Str(s) => s,
        Raw::Int(i) => i.to_string(),
        Raw::Float(f) => f.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn chat_request_uses_literal_model_names() {
        let req = ChatRequest { query: "Ai là vua Quang Trung?", top_k: 5, model: ModelOption::Qwen };
        let v = serde_json::to_value(&req).unwrap();
        assert_eq!(v, json!({"query": "Ai là vua Quang Trung?", "top_k": 5, "model": "qwen"}));
    }

    #[test]
    fn source_accepts_numeric_id_and_missing_hierarchy() {
        let env: ChatEnvelope = serde_json::from_value(json!({
            "query": "q",
            "response": {
                "answer": "1954",
                "sources": [
                    {"id": 17, "content_preview": "Hiệp định Genève..."},
                    {"id": "c-2", "hierarchy": "Chương 3 > Mục 1", "content_preview": "..."}
                ]
            }
        }))
        .unwrap();

        let sources = &env.response.sources;
        assert_eq!(sources[0].id, "17");
        assert_eq!(sources[0].hierarchy_or_na(), "N/A");
        assert_eq!(sources[1].hierarchy_or_na(), "Chương 3 > Mục 1");
    }

    #[test]
    fn quiz_response_is_discriminated_on_status() {
        let ok: QuizApiResponse = serde_json::from_value(json!({
            "status": "success",
            "questions": [{
                "question": "Năm 1954?",
                "options": {"D": "d", "A": "a", "C": "c", "B": "b"},
                "correct_answer": "B"
            }]
        }))
        .unwrap();
        match ok {
            QuizApiResponse::Success { questions } => {
                let keys: Vec<_> = questions[0].options.keys().copied().collect();
                assert_eq!(keys, vec![ChoiceKey::A, ChoiceKey::B, ChoiceKey::C, ChoiceKey::D]);
                assert_eq!(questions[0].correct_key(), Some(ChoiceKey::B));
            }
            other => panic!("unexpected {:?}", other),
        }

        let err: QuizApiResponse =
            serde_json::from_value(json!({"status": "error", "message": "No context found"})).unwrap();
        assert!(matches!(err, QuizApiResponse::Error { message } if message == "No context found"));
    }

    #[test]
    fn correct_key_absent_from_options_is_none() {
        let q: ApiQuizQuestion = serde_json::from_value(json!({
            "question": "?",
            "options": {"A": "a", "B": "b", "C": "c"},
            "correct_answer": "D"
        }))
        .unwrap();
        assert_eq!(q.correct_key(), None);
    }

    #[test]
    fn error_detail_handles_string_and_structured() {
        let s: ErrorDetail = serde_json::from_value(json!({"detail": "Dịch vụ không khả dụng"})).unwrap();
        assert_eq!(s.message().as_deref(), Some("Dịch vụ không khả dụng"));

        let v: ErrorDetail = serde_json::from_value(json!({"detail": [{"loc": ["body", "query"]}]})).unwrap();
        assert!(v.message().unwrap().contains("query"));

        let none: ErrorDetail = serde_json::from_value(json!({})).unwrap();
        assert_eq!(none.message(), None);
    }
}
