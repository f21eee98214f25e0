//! HTTP endpoint handlers. Everything stateful goes over `/ws`; these are read-only.

use std::sync::Arc;
use axum::{extract::State, Json, response::IntoResponse};
use tracing::instrument;

use crate::contract::ModelOption;
use crate::protocol::{HealthOut, ModelOut};
use crate::state::AppState;

#[instrument(level = "info", skip(state))]
pub async fn http_health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
  Json(HealthOut { ok: true, backend_url: state.config.backend.base_url.clone() })
}

#[instrument(level = "info")]
pub async fn http_models() -> impl IntoResponse {
  let models: Vec<ModelOut> = ModelOption::ALL
    .iter()
    .map(|&m| ModelOut { id: m, label: m.label() })
    .collect();
  Json(models)
}
