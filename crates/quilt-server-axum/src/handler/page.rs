/* crates/quilt-server-axum/src/handler/page.rs */

use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Response};
use quilt_server::scope::ResolutionScope;
use quilt_server::QuiltError;

use super::{request_context, AppState};
use crate::error::AxumError;

/// Resolve a full page: fetch its definition by `url`, then run the
/// assembly pipeline under a fresh per-request scope. A failing data
/// source degrades only its widgets; structural errors fail the request.
pub(super) async fn handle_page(
  State(state): State<Arc<AppState>>,
  headers: HeaderMap,
  Query(params): Query<HashMap<String, String>>,
) -> Result<Response, AxumError> {
  let Some(url) = params.get("url").cloned() else {
    return Err(QuiltError::validation("missing 'url' query parameter").into());
  };
  let source = state
    .page_source
    .as_ref()
    .ok_or_else(|| QuiltError::internal("no page source configured"))?;

  let ctx = request_context(&headers, params, serde_json::Value::Null);
  let definition = source.fetch(&url, &ctx).await?;

  let scope = ResolutionScope::new();
  let response =
    state.assembler.assemble_with_scope(definition, &ctx, &scope).await.map_err(|err| {
      tracing::error!(page = %url, %err, "page assembly failed");
      err
    })?;
  Ok(axum::Json(response).into_response())
}
