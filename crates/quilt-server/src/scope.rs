/* crates/quilt-server/src/scope.rs */

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;

use crate::datasource::DataSourceResponse;
use crate::page::{Position, Widget};

/// Per-request cache of data-source name -> response, shared across
/// scatter/gather phases and recursive nested-page resolution.
pub type SharedCache = Arc<Mutex<HashMap<String, DataSourceResponse>>>;

/// Correlates a scheduler task index back to the widget it serves.
#[derive(Debug, Clone)]
pub struct WidgetMeta {
  pub widget_id: i64,
  pub const_widget_id: Option<String>,
  pub data_source: String,
  pub position: Position,
}

impl WidgetMeta {
  /// Identity match against a widget in a response list: stable ids compare
  /// when both sides carry one, numeric ids when neither does. Mixed
  /// identities never match.
  pub fn matches(&self, widget: &Widget) -> bool {
    match (&self.const_widget_id, &widget.const_widget_id) {
      (Some(mine), Some(theirs)) => mine == theirs,
      (None, None) => self.widget_id == widget.id,
      _ => false,
    }
  }

  /// Key under which this widget's resolution outcome is recorded. Widgets
  /// without a stable id stay out of the resolution map and never
  /// participate in visibility rules.
  pub fn resolution_key(&self) -> Option<&str> {
    self.const_widget_id.as_deref()
  }
}

/// Per-request mutable state: the preload/response cache, the
/// widget-resolution map consumed by visibility rules, and the task
/// index -> widget metadata map written by the mapper. Cloning is cheap and
/// yields a handle on the same maps; one scope spans a whole request,
/// including nested tab resolution.
#[derive(Debug, Clone, Default)]
pub struct ResolutionScope {
  pub cache: SharedCache,
  pub resolved: Arc<Mutex<HashMap<String, bool>>>,
  pub widget_meta: Arc<Mutex<HashMap<usize, Arc<WidgetMeta>>>>,
}

impl ResolutionScope {
  pub fn new() -> Self {
    Self::default()
  }

  /// Scope reusing a parent-supplied cache, for embedders that warm
  /// responses before page resolution starts.
  pub fn with_cache(cache: SharedCache) -> Self {
    Self { cache, ..Self::default() }
  }

  pub async fn cache_get(&self, name: &str) -> Option<DataSourceResponse> {
    self.cache.lock().await.get(name).cloned()
  }

  pub async fn cache_contains(&self, name: &str) -> bool {
    self.cache.lock().await.contains_key(name)
  }

  pub async fn mark_resolved(&self, key: impl Into<String>, ok: bool) {
    self.resolved.lock().await.insert(key.into(), ok);
  }

  /// Missing entries read as unresolved.
  pub async fn is_resolved(&self, key: &str) -> bool {
    self.resolved.lock().await.get(key).copied().unwrap_or(false)
  }

  pub async fn record_widget(&self, index: usize, meta: WidgetMeta) -> Arc<WidgetMeta> {
    let meta = Arc::new(meta);
    self.widget_meta.lock().await.insert(index, meta.clone());
    meta
  }

  pub async fn widget_at(&self, index: usize) -> Option<Arc<WidgetMeta>> {
    self.widget_meta.lock().await.get(&index).cloned()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn meta(widget_id: i64, const_widget_id: Option<&str>) -> WidgetMeta {
    WidgetMeta {
      widget_id,
      const_widget_id: const_widget_id.map(str::to_string),
      data_source: "feed".to_string(),
      position: Position::Normal,
    }
  }

  #[test]
  fn identity_match_prefers_stable_ids() {
    let mut widget = Widget::dynamic(10, Some("hero"), "feed");
    assert!(meta(99, Some("hero")).matches(&widget));
    assert!(!meta(10, Some("other")).matches(&widget));

    widget.const_widget_id = None;
    assert!(meta(10, None).matches(&widget));
    assert!(!meta(11, None).matches(&widget));
    // Mixed identities never match, even with equal numeric ids.
    assert!(!meta(10, Some("hero")).matches(&widget));
  }

  #[tokio::test]
  async fn unknown_widgets_read_unresolved() {
    let scope = ResolutionScope::new();
    assert!(!scope.is_resolved("hero").await);
    scope.mark_resolved("hero", true).await;
    assert!(scope.is_resolved("hero").await);
    scope.mark_resolved("hero", false).await;
    assert!(!scope.is_resolved("hero").await);
  }

  #[tokio::test]
  async fn clones_share_state() {
    let scope = ResolutionScope::new();
    let handle = scope.clone();
    handle.mark_resolved("hero", true).await;
    handle.cache.lock().await.insert(
      "session".to_string(),
      DataSourceResponse::ok(serde_json::json!({"uid": 1})),
    );
    assert!(scope.is_resolved("hero").await);
    assert!(scope.cache_contains("session").await);
    assert!(scope.cache_get("session").await.is_some());
  }

  #[tokio::test]
  async fn widget_meta_round_trip() {
    let scope = ResolutionScope::new();
    let stored = scope.record_widget(0, meta(1, Some("hero"))).await;
    let fetched = scope.widget_at(0).await.unwrap();
    assert!(Arc::ptr_eq(&stored, &fetched));
    assert!(scope.widget_at(1).await.is_none());
  }
}
