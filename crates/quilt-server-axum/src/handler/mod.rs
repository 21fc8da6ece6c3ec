/* crates/quilt-server-axum/src/handler/mod.rs */

mod datasource;
mod page;

use std::collections::HashMap;
use std::sync::Arc;

use axum::http::HeaderMap;
use axum::routing::{delete, get, patch, post, put};
use axum::Router;
use quilt_server::assemble::PageAssembler;
use quilt_server::context::{RequestContext, UserIdentity};
use quilt_server::datasource::Method;
use quilt_server::executor::Executor;
use quilt_server::manifest::build_manifest;
use quilt_server::registry::DataSourceRegistry;
use quilt_server::server::QuiltParts;
use quilt_server::source::PageSource;

pub(crate) struct AppState {
  pub manifest_json: serde_json::Value,
  pub registry: Arc<DataSourceRegistry>,
  pub executor: Executor,
  pub assembler: PageAssembler,
  pub page_source: Option<Arc<dyn PageSource>>,
  /// "METHOD route-pattern" -> data source name, for MatchedPath reverse lookup.
  pub routes: HashMap<String, String>,
}

pub(crate) fn build_router(parts: QuiltParts) -> Router {
  let QuiltParts { registry, executor, assembler, page_source } = parts;

  let manifest_json =
    serde_json::to_value(build_manifest(&registry)).unwrap_or(serde_json::Value::Null);

  let mut routes = HashMap::new();
  let mut router = Router::new()
    .route("/_quilt/manifest.json", get(datasource::handle_manifest))
    .route("/_quilt/page", get(page::handle_page));

  // One route per externally-routable data source. Sources with no uri or
  // method stay internal to the assembly pipeline.
  for (name, datasource) in registry.all() {
    let info = &datasource.info;
    let Some(method) = info.method else { continue };
    if info.uri.is_empty() {
      continue;
    }
    let key = format!("{} {}", method.as_str(), info.uri);
    if routes.contains_key(&key) {
      tracing::warn!(%name, route = %key, "route already claimed, data source not exposed");
      continue;
    }
    let handler = match method {
      Method::Get => get(datasource::handle_datasource),
      Method::Post => post(datasource::handle_datasource),
      Method::Put => put(datasource::handle_datasource),
      Method::Delete => delete(datasource::handle_datasource),
      Method::Patch => patch(datasource::handle_datasource),
    };
    router = router.route(&info.uri, handler);
    routes.insert(key, name.clone());
  }

  let state =
    Arc::new(AppState { manifest_json, registry, executor, assembler, page_source, routes });

  router.with_state(state)
}

/// Read the identity values the upstream auth middleware stamped into
/// request headers. The engine itself never authenticates.
pub(crate) fn request_context(
  headers: &HeaderMap,
  params: HashMap<String, String>,
  payload: serde_json::Value,
) -> RequestContext {
  let text = |key: &str| headers.get(key).and_then(|v| v.to_str().ok()).map(str::to_string);
  let user = UserIdentity {
    user_id: text("x-user-id"),
    tenant_id: text("x-tenant-id"),
    persona: text("x-persona"),
    logged_in: text("x-logged-in").is_some_and(|v| v == "true" || v == "1"),
    enrollment_status: text("x-enrollment-status"),
  };
  RequestContext::new(user).with_params(params).with_payload(payload)
}
