/* crates/quilt-server/src/datasource.rs */

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::context::RequestContext;
use crate::errors::QuiltError;

/// Timeout applied to a data source that does not configure its own.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(800);

pub type BoxFuture<T> = Pin<Box<dyn Future<Output = T> + Send>>;

/// Data source handler: receives its own cloned request context and the
/// immutable descriptor it is registered under.
pub type HandlerFn = Arc<
  dyn Fn(RequestContext, Arc<DataSourceInfo>) -> BoxFuture<Result<DataSourceResponse, QuiltError>>
    + Send
    + Sync,
>;

/// Pre-handler filter. The first filter that returns an error aborts the
/// chain; the handler is never invoked.
pub type FilterFn = Arc<
  dyn Fn(RequestContext, Arc<DataSourceInfo>) -> BoxFuture<Result<(), QuiltError>> + Send + Sync,
>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
  Get,
  Post,
  Put,
  Delete,
  Patch,
}

impl Method {
  pub fn as_str(self) -> &'static str {
    match self {
      Method::Get => "GET",
      Method::Post => "POST",
      Method::Put => "PUT",
      Method::Delete => "DELETE",
      Method::Patch => "PATCH",
    }
  }
}

/// Immutable descriptor metadata for a registered data source. Everything a
/// handler or filter may ask about its own registration lives here, so the
/// same handler function can serve several descriptors.
#[derive(Debug, Clone)]
pub struct DataSourceInfo {
  /// Unique within a registry.
  pub name: String,
  /// Empty when the data source is not externally routable.
  pub uri: String,
  pub method: Option<Method>,
  pub timeout: Duration,
  /// Data sources to warm into the shared cache before this one runs.
  pub preload: Vec<String>,
  /// Authorization tags read by auth filters; empty when unrestricted.
  pub resource: String,
  pub action: String,
}

/// A named, independently invocable unit of backend logic producing data
/// for one or more widgets. Constructed once at startup, owned by the
/// registry afterward.
pub struct DataSource {
  pub info: Arc<DataSourceInfo>,
  pub filters: Vec<FilterFn>,
  pub handler: HandlerFn,
}

impl DataSource {
  pub fn new(name: impl Into<String>, handler: HandlerFn) -> Self {
    Self {
      info: Arc::new(DataSourceInfo {
        name: name.into(),
        uri: String::new(),
        method: None,
        timeout: DEFAULT_TIMEOUT,
        preload: Vec::new(),
        resource: String::new(),
        action: String::new(),
      }),
      filters: Vec::new(),
      handler,
    }
  }

  fn info_mut(&mut self) -> &mut DataSourceInfo {
    // Setters run during construction, before the descriptor is shared.
    Arc::make_mut(&mut self.info)
  }

  /// Expose this data source on its own HTTP route.
  pub fn route(mut self, uri: impl Into<String>, method: Method) -> Self {
    let info = self.info_mut();
    info.uri = uri.into();
    info.method = Some(method);
    self
  }

  pub fn timeout(mut self, timeout: Duration) -> Self {
    self.info_mut().timeout = timeout;
    self
  }

  pub fn preload(mut self, names: impl IntoIterator<Item = impl Into<String>>) -> Self {
    self.info_mut().preload = names.into_iter().map(Into::into).collect();
    self
  }

  pub fn authorize(mut self, resource: impl Into<String>, action: impl Into<String>) -> Self {
    let info = self.info_mut();
    info.resource = resource.into();
    info.action = action.into();
    self
  }

  pub fn filter(mut self, filter: FilterFn) -> Self {
    self.filters.push(filter);
    self
  }
}

/// What a handler hands back: an HTTP-equivalent status, an optional
/// view-type override for the owning widget, and the data payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataSourceResponse {
  pub status: u16,
  #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
  pub view_type: Option<String>,
  #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
  pub data: serde_json::Value,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub error: Option<String>,
}

impl DataSourceResponse {
  pub fn ok(data: serde_json::Value) -> Self {
    Self { status: 200, view_type: None, data, error: None }
  }

  pub fn with_status(status: u16, data: serde_json::Value) -> Self {
    Self { status, view_type: None, data, error: None }
  }

  pub fn with_view_type(mut self, view_type: impl Into<String>) -> Self {
    self.view_type = Some(view_type.into());
    self
  }

  /// Only OK-equivalent responses count as a usable resolution.
  pub fn is_ok(&self) -> bool {
    (200..300).contains(&self.status)
  }
}
