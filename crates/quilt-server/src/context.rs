/* crates/quilt-server/src/context.rs */

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::datasource::DataSourceResponse;
use crate::scope::{SharedCache, WidgetMeta};

/// Caller identity placed into request state by the upstream auth layer.
/// The engine never authenticates; it only reads these values.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserIdentity {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub user_id: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub tenant_id: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub persona: Option<String>,
  #[serde(default)]
  pub logged_in: bool,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub enrollment_status: Option<String>,
}

/// Per-request state passed to filters and handlers. Every concurrently
/// executing data source receives its own clone, so handlers never contend
/// on request state; cross-task state lives in
/// [`crate::scope::ResolutionScope`], reachable here through `preloaded`.
#[derive(Debug, Clone)]
pub struct RequestContext {
  pub user: Arc<UserIdentity>,
  /// Query parameters of the originating request.
  pub params: Arc<HashMap<String, String>>,
  /// Body payload for routed POST/PUT/PATCH invocations; `Null` otherwise.
  pub payload: Arc<serde_json::Value>,
  /// Absolute point after which the executing data source must give up.
  /// Stamped by the scheduler from the descriptor timeout; `None` until then.
  pub deadline: Option<Instant>,
  /// Metadata of the widget this execution serves, attached by the
  /// scheduler's main phase. `None` for preload and routed executions.
  pub widget: Option<Arc<WidgetMeta>>,
  /// Read handle on the resolution scope's preload cache.
  pub preloaded: SharedCache,
}

impl Default for RequestContext {
  fn default() -> Self {
    Self {
      user: Arc::new(UserIdentity::default()),
      params: Arc::new(HashMap::new()),
      payload: Arc::new(serde_json::Value::Null),
      deadline: None,
      widget: None,
      preloaded: SharedCache::default(),
    }
  }
}

impl RequestContext {
  pub fn new(user: UserIdentity) -> Self {
    Self { user: Arc::new(user), ..Self::default() }
  }

  pub fn with_params(mut self, params: HashMap<String, String>) -> Self {
    self.params = Arc::new(params);
    self
  }

  pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
    self.payload = Arc::new(payload);
    self
  }

  pub fn param(&self, key: &str) -> Option<&str> {
    self.params.get(key).map(String::as_str)
  }

  /// Preloaded response for `name`, if the preload phase cached one.
  pub async fn cached(&self, name: &str) -> Option<DataSourceResponse> {
    self.preloaded.lock().await.get(name).cloned()
  }

  /// Copy with the deadline stamped `timeout` from now. The scheduler calls
  /// this once per task right before executing it.
  pub fn with_deadline(&self, timeout: Duration) -> Self {
    let mut ctx = self.clone();
    ctx.deadline = Some(Instant::now() + timeout);
    ctx
  }

  /// Time left until the deadline, `None` when no deadline was stamped.
  /// Returns zero once the deadline has passed.
  pub fn remaining(&self) -> Option<Duration> {
    self.deadline.map(|d| d.saturating_duration_since(Instant::now()))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn anonymous_by_default() {
    let ctx = RequestContext::default();
    assert!(!ctx.user.logged_in);
    assert!(ctx.user.user_id.is_none());
    assert!(ctx.deadline.is_none());
    assert!(ctx.remaining().is_none());
    assert!(ctx.widget.is_none());
  }

  #[test]
  fn deadline_stamp_leaves_original_untouched() {
    let ctx = RequestContext::default();
    let stamped = ctx.with_deadline(Duration::from_millis(500));
    assert!(ctx.deadline.is_none());
    let remaining = stamped.remaining().unwrap();
    assert!(remaining <= Duration::from_millis(500));
    assert!(remaining > Duration::from_millis(400));
  }

  #[test]
  fn remaining_saturates_at_zero() {
    let mut ctx = RequestContext::default();
    ctx.deadline = Some(Instant::now() - Duration::from_millis(10));
    assert_eq!(ctx.remaining(), Some(Duration::ZERO));
  }

  #[test]
  fn param_lookup() {
    let ctx = RequestContext::default()
      .with_params(HashMap::from([("tab".to_string(), "home".to_string())]));
    assert_eq!(ctx.param("tab"), Some("home"));
    assert_eq!(ctx.param("missing"), None);
  }

  #[tokio::test]
  async fn cached_reads_preload_cache() {
    let ctx = RequestContext::default();
    assert!(ctx.cached("session").await.is_none());
    ctx
      .preloaded
      .lock()
      .await
      .insert("session".to_string(), DataSourceResponse::ok(serde_json::json!({"uid": 7})));
    let hit = ctx.cached("session").await.unwrap();
    assert_eq!(hit.data["uid"], 7);
  }
}
