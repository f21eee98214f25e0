//! Presentation: a pure projection of session state into a `ViewModel`.
//!
//! Nothing here mutates state. The socket loop calls `Session::view` after every
//! change and pushes the result as a `render` frame; the shell in `./static`
//! draws it (field and tag names below are what it reads).

use serde::Serialize;

use crate::contract::{ChoiceKey, ModelOption};
use crate::domain::{Mode, QuizQuestion, Role};
use crate::session::SessionState;

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ViewModel {
    pub mode: Mode,
    pub in_flight: bool,
    pub panel: Panel,
    pub controls: Controls,
}

/// Main area. Only the active mode's panel is projected.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Panel {
    Chat { entries: Vec<ChatEntry>, loading: bool },
    Quiz(QuizPanel),
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ChatEntry {
    Bubble {
        id: String,
        from_user: bool,
        content: String,
        /// Empty means no citation block at all.
        sources: Vec<SourceLine>,
    },
    ErrorBanner { id: String, content: String },
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SourceLine {
    pub id: String,
    pub hierarchy: String,
    pub preview: String,
}

/// Exactly one of these is shown in quiz mode.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum QuizPanel {
    Empty,
    Error { message: String },
    Loading,
    Questions { cards: Vec<QuestionCard> },
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct QuestionCard {
    pub id: String,
    pub question: String,
    pub revealed: bool,
    /// Revealed, but the correct answer does not name any listed option.
    pub answer_unavailable: bool,
    pub options: Vec<OptionRow>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct OptionRow {
    pub key: ChoiceKey,
    pub text: String,
    pub mark: OptionMark,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OptionMark {
    Hidden,
    Correct,
    Wrong,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Controls {
    pub mode_switch_enabled: bool,
    pub models: Vec<ModelChoice>,
    pub models_enabled: bool,
    pub send_enabled: bool,
    pub generate_enabled: bool,
    pub quiz_topic: String,
    pub quiz_count: u32,
    pub quiz_max: u32,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ModelChoice {
    pub model: ModelOption,
    pub label: &'static str,
    pub selected: bool,
}

pub fn project(st: &SessionState, in_flight: bool) -> ViewModel {
    let panel = match st.mode {
        Mode::Chat => Panel::Chat { entries: chat_entries(st), loading: in_flight },
        Mode::Quiz => Panel::Quiz(quiz_panel(st, in_flight)),
    };

    let idle = !in_flight;
    ViewModel {
        mode: st.mode,
        in_flight,
        panel,
        controls: Controls {
            mode_switch_enabled: idle,
            models: ModelOption::ALL
                .iter()
                .map(|&m| ModelChoice { model: m, label: m.label(), selected: m == st.model })
                .collect(),
            models_enabled: idle,
            send_enabled: idle,
            generate_enabled: idle,
            quiz_topic: st.quiz.topic().to_string(),
            quiz_count: st.quiz.count(),
            quiz_max: st.quiz.max_count(),
        },
    }
}

fn chat_entries(st: &SessionState) -> Vec<ChatEntry> {
    st.conversation
        .messages()
        .iter()
        .map(|m| match m.role {
            Role::Error => ChatEntry::ErrorBanner { id: m.id.clone(), content: m.content.clone() },
            Role::User | Role::Model => ChatEntry::Bubble {
                id: m.id.clone(),
                from_user: m.role == Role::User,
                content: m.content.clone(),
                sources: m
                    .sources
                    .iter()
                    .map(|s| SourceLine {
                        id: s.id.clone(),
                        hierarchy: s.hierarchy_or_na().to_string(),
                        preview: s.content_preview.clone(),
                    })
                    .collect(),
            },
        })
        .collect()
}

fn quiz_panel(st: &SessionState, in_flight: bool) -> QuizPanel {
    let quiz = &st.quiz;
    match (quiz.questions().is_empty(), quiz.error(), in_flight) {
        (true, None, false) => QuizPanel::Empty,
        (_, Some(message), _) => QuizPanel::Error { message: message.to_string() },
        (_, None, true) => QuizPanel::Loading,
        (false, None, false) => QuizPanel::Questions {
            cards: quiz.questions().iter().map(|q| card(q, quiz.is_revealed(&q.id))).collect(),
        },
    }
}

fn card(q: &QuizQuestion, revealed: bool) -> QuestionCard {
    let options = q
        .options
        .iter()
        .map(|(&key, text)| {
            let mark = match (revealed, q.correct_key) {
                (true, Some(correct)) if correct == key => OptionMark::Correct,
                (true, Some(_)) => OptionMark::Wrong,
                _ => OptionMark::Hidden,
            };
            OptionRow { key, text: text.clone(), mark }
        })
        .collect();

    QuestionCard {
        id: q.id.clone(),
        question: q.question.clone(),
        revealed,
        answer_unavailable: revealed && q.correct_key.is_none(),
        options,
    }
}
