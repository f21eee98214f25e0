//! Browser <-> front-end protocol (WebSocket frames and the small HTTP DTOs).
//! Keep this small and stable so the shell page and the server evolve independently.

use serde::{Deserialize, Serialize};

use crate::contract::ModelOption;
use crate::domain::Mode;
use crate::view::ViewModel;

/// Actions the browser sends over WebSocket.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientWsMessage {
    Ping,
    SendMessage {
        text: String,
    },
    GenerateQuiz {
        #[serde(default)]
        topic: Option<String>,
        #[serde(default)]
        count: Option<i64>,
    },
    SetQuizTopic {
        topic: String,
    },
    SetQuizCount {
        count: i64,
    },
    ToggleReveal {
        id: String,
    },
    SwitchMode {
        mode: Mode,
    },
    SelectModel {
        model: ModelOption,
    },
    Reset,
}

/// Frames the server pushes back.
#[derive(Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerWsMessage {
    Pong,
    /// The whole session view; the shell redraws from it.
    Render {
        view: ViewModel,
    },
    /// An action was refused (busy, empty input, malformed frame). State is unchanged.
    Error {
        message: String,
    },
}

//
// HTTP DTOs
//

#[derive(Serialize)]
pub struct HealthOut {
    pub ok: bool,
    pub backend_url: String,
}

#[derive(Serialize)]
pub struct ModelOut {
    pub id: ModelOption,
    pub label: &'static str,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_frames_decode() {
        let m: ClientWsMessage = serde_json::from_str(r#"{"type":"send_message","text":"Xin chào"}"#).unwrap();
        assert!(matches!(m, ClientWsMessage::SendMessage { text } if text == "Xin chào"));

        let m: ClientWsMessage = serde_json::from_str(r#"{"type":"generate_quiz"}"#).unwrap();
        assert!(matches!(m, ClientWsMessage::GenerateQuiz { topic: None, count: None }));

        let m: ClientWsMessage = serde_json::from_str(r#"{"type":"switch_mode","mode":"quiz"}"#).unwrap();
        assert!(matches!(m, ClientWsMessage::SwitchMode { mode: Mode::Quiz }));

        let m: ClientWsMessage = serde_json::from_str(r#"{"type":"select_model","model":"qwen"}"#).unwrap();
        assert!(matches!(m, ClientWsMessage::SelectModel { model: ModelOption::Qwen }));

        assert!(serde_json::from_str::<ClientWsMessage>(r#"{"type":"select_model","model":"gpt"}"#).is_err());
    }

    #[test]
    fn server_frames_are_tagged() {
        let v = serde_json::to_value(ServerWsMessage::Error { message: "bận".into() }).unwrap();
        assert_eq!(v, serde_json::json!({"type": "error", "message": "bận"}));
        let v = serde_json::to_value(ServerWsMessage::Pong).unwrap();
        assert_eq!(v, serde_json::json!({"type": "pong"}));
    }
}
