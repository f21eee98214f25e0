//! WebSocket upgrade + session loop. One session per connection.
//!
//! The loop multiplexes three things: browser frames, session change
//! notifications (each one pushes the full view) and completion of the
//! spawned request tasks. Requests are admitted synchronously in `dispatch`,
//! so any frame handled after a send/generate already sees the session busy.

use std::sync::Arc;
use axum::{
  extract::{
    ws::{Message, WebSocket},
    State, WebSocketUpgrade,
  },
  response::IntoResponse,
};
use tokio::task::JoinSet;
use tracing::{debug, error, info, instrument, warn};

use crate::protocol::{ClientWsMessage, ServerWsMessage};
use crate::session::{Session, SessionError};
use crate::state::AppState;

type RequestTasks = JoinSet<()>;

#[instrument(level = "info", skip_all)]
pub async fn ws_upgrade(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> impl IntoResponse {
  info!(target: "rag_frontend", "WebSocket upgrade requested");
  ws.on_upgrade(move |socket| handle_ws(socket, state))
}

#[instrument(level = "info", skip_all)]
async fn handle_ws(mut socket: WebSocket, state: Arc<AppState>) {
  let session = state.open_session();
  // dropping the set on disconnect aborts whatever is still in flight
  let mut tasks = RequestTasks::new();

  if send(&mut socket, &render(&session)).await.is_err() {
    return;
  }

  loop {
    tokio::select! {
      incoming = socket.recv() => {
        let Some(Ok(msg)) = incoming else { break };
        match msg {
          Message::Text(txt) => {
            let reply = match serde_json::from_str::<ClientWsMessage>(&txt) {
              Ok(action) => {
                debug!(target: "rag_frontend", session = %session.id, "WS received: {:?}", &action);
                dispatch(action, &session, &mut tasks)
              }
              Err(e) => Some(ServerWsMessage::Error { message: format!("Invalid JSON: {}", e) }),
            };
            if let Some(reply) = reply {
              if send(&mut socket, &reply).await.is_err() {
                break;
              }
            }
          }
          Message::Ping(payload) => { let _ = socket.send(Message::Pong(payload)).await; }
          Message::Close(_) => break,
          _ => {}
        }
      }

      _ = session.changed().notified() => {
        if send(&mut socket, &render(&session)).await.is_err() {
          break;
        }
      }

      Some(done) = tasks.join_next(), if !tasks.is_empty() => {
        if let Err(e) = done {
          error!(target: "rag_frontend", session = %session.id, error = %e, "Request task ended abnormally");
        }
      }
    }
  }

  if !tasks.is_empty() {
    warn!(target: "rag_frontend", session = %session.id, pending = tasks.len(), "Disconnected with a request in flight; aborting");
  }
  tasks.abort_all();
  info!(target: "rag_frontend", session = %session.id, "WebSocket disconnected");
}

/// Apply one browser action. Send/generate are admitted here and only their
/// backend call is spawned; refusals come back as an `error` frame.
fn dispatch(action: ClientWsMessage, session: &Arc<Session>, tasks: &mut RequestTasks) -> Option<ServerWsMessage> {
  let refused = |e: SessionError| Some(ServerWsMessage::Error { message: e.to_string() });
  let settled = |r: Result<(), SessionError>| r.err().and_then(refused);

  match action {
    ClientWsMessage::Ping => Some(ServerWsMessage::Pong),

    ClientWsMessage::SendMessage { text } => match session.start_chat(&text) {
      Ok(pending) => {
        let session = session.clone();
        tasks.spawn(async move { session.finish_chat(pending).await });
        None
      }
      Err(e) => refused(e),
    },

    ClientWsMessage::GenerateQuiz { topic, count } => match session.start_quiz(topic, count) {
      Ok(pending) => {
        let session = session.clone();
        tasks.spawn(async move { session.finish_quiz(pending).await });
        None
      }
      Err(e) => refused(e),
    },

    ClientWsMessage::ToggleReveal { id } => {
      session.toggle_reveal(&id);
      None
    }

    ClientWsMessage::SetQuizTopic { topic } => settled(session.set_quiz_topic(topic)),
    ClientWsMessage::SetQuizCount { count } => settled(session.set_quiz_count(count)),
    ClientWsMessage::SwitchMode { mode } => settled(session.switch_mode(mode)),
    ClientWsMessage::SelectModel { model } => settled(session.select_model(model)),
    ClientWsMessage::Reset => settled(session.reset()),
  }
}

fn render(session: &Session) -> ServerWsMessage {
  ServerWsMessage::Render { view: session.view() }
}

async fn send(socket: &mut WebSocket, frame: &ServerWsMessage) -> Result<(), axum::Error> {
  let out = serde_json::to_string(frame).unwrap_or_else(|e| {
    serde_json::json!({ "type": "error", "message": format!("Serialization error: {}", e) }).to_string()
  });
  socket.send(Message::Text(out)).await.map_err(|e| {
    error!(target: "rag_frontend", error = %e, "WS send error");
    e
  })
}
