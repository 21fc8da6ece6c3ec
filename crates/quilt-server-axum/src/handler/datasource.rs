/* crates/quilt-server-axum/src/handler/datasource.rs */

use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::{MatchedPath, Query, State};
use axum::http::{HeaderMap, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use quilt_server::QuiltError;

use super::{request_context, AppState};
use crate::error::AxumError;

pub(super) async fn handle_manifest(State(state): State<Arc<AppState>>) -> impl IntoResponse {
  axum::Json(state.manifest_json.clone())
}

#[derive(serde::Serialize)]
struct RoutedResponse {
  ok: bool,
  #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
  view_type: Option<String>,
  data: serde_json::Value,
}

/// Externally-routed execution of a single data source. Unlike the
/// scheduler-driven path, a telemetry emission failure surfaces to the
/// caller here, and a filter rejection answers with its own status.
pub(super) async fn handle_datasource(
  State(state): State<Arc<AppState>>,
  method: Method,
  matched: MatchedPath,
  headers: HeaderMap,
  Query(params): Query<HashMap<String, String>>,
  body: axum::body::Bytes,
) -> Result<Response, AxumError> {
  let key = format!("{} {}", method, matched.as_str());
  let name = state
    .routes
    .get(&key)
    .ok_or_else(|| QuiltError::not_found(format!("no data source routed at '{key}'")))?;
  let datasource = state
    .registry
    .lookup(name)
    .ok_or_else(|| QuiltError::not_found(format!("data source '{name}' not found")))?;

  let payload: serde_json::Value = if body.is_empty() {
    serde_json::Value::Null
  } else {
    serde_json::from_slice(&body).map_err(|e| QuiltError::validation(e.to_string()))?
  };

  let ctx = request_context(&headers, params, payload);
  let response = state.executor.execute_routed(&datasource, ctx).await?;

  let status = StatusCode::from_u16(response.status).unwrap_or(StatusCode::OK);
  let body =
    RoutedResponse { ok: response.is_ok(), view_type: response.view_type, data: response.data };
  Ok((status, axum::Json(body)).into_response())
}
