/* crates/quilt-server/src/mapper.rs */

use std::sync::Arc;

use crate::errors::QuiltError;
use crate::merge::apply_response;
use crate::page::{PageDefinition, PageResponse, Position, TabsDefinition, VisibilityRule};
use crate::scope::{ResolutionScope, WidgetMeta};

/// Output of the mapping pass: the response skeleton plus the ordered
/// scatter plan. Index i of `names`, `positions` and `metas` describes the
/// same task; the gather phase writes its result back into slot i.
#[derive(Debug)]
pub struct MappedPage {
  pub skeleton: PageResponse,
  pub names: Vec<String>,
  pub positions: Vec<Position>,
  pub metas: Vec<Arc<WidgetMeta>>,
  pub rules: Vec<VisibilityRule>,
  pub tabs: Option<TabsDefinition>,
  pub preload: Vec<String>,
}

/// Convert a page definition into a response skeleton and the ordered list
/// of data sources to resolve.
///
/// Walks the five position lists in fixed order. Each unprocessed DYNAMIC
/// widget either gets a scatter slot (with its metadata recorded in the
/// scope under the slot index), or, when its data source is already cached
/// from an earlier pass in the same request, is filled straight from the
/// cache. STATIC widgets are recorded resolved immediately.
pub async fn map_page(
  definition: PageDefinition,
  scope: &ResolutionScope,
) -> Result<MappedPage, QuiltError> {
  let Some(meta) = definition.page else {
    return Err(QuiltError::validation("page definition has no page metadata"));
  };

  let mut skeleton = PageResponse::skeleton(meta);
  skeleton.header_widgets = definition.header_widgets;
  skeleton.widgets = definition.widgets;
  skeleton.footer_widgets = definition.footer_widgets;
  skeleton.onload_widgets = definition.onload_widgets;
  skeleton.floating_widgets = definition.floating_widgets;
  if let Some(tabs) = &definition.tabs {
    if !tabs.items.is_empty() {
      skeleton.tabs = Some(tabs.items.clone());
    }
  }

  let mut names = Vec::new();
  let mut positions = Vec::new();
  let mut metas = Vec::new();

  for position in Position::ALL {
    for widget in skeleton.list_mut(position) {
      if widget.is_dynamic() && !widget.processed {
        let name = widget.data_source.clone().unwrap_or_default();
        if name.is_empty() {
          tracing::warn!(widget = widget.id, "dynamic widget has no data source");
        }

        if let Some(cached) = scope.cache_get(&name).await {
          apply_response(widget, &cached);
          if let Some(key) = &widget.const_widget_id {
            scope.mark_resolved(key.clone(), true).await;
          }
          continue;
        }

        let index = names.len();
        let recorded = scope
          .record_widget(
            index,
            WidgetMeta {
              widget_id: widget.id,
              const_widget_id: widget.const_widget_id.clone(),
              data_source: name.clone(),
              position,
            },
          )
          .await;
        metas.push(recorded);
        names.push(name);
        positions.push(position);
      } else if let Some(key) = &widget.const_widget_id {
        scope.mark_resolved(key.clone(), true).await;
      }
    }
  }

  Ok(MappedPage {
    skeleton,
    names,
    positions,
    metas,
    rules: definition.visibility_rules,
    tabs: definition.tabs,
    preload: definition.preload,
  })
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::datasource::DataSourceResponse;
  use crate::page::{PageMeta, TabItem, Widget};

  fn meta() -> PageMeta {
    PageMeta { id: 1, name: "home".to_string(), title: None, version: None }
  }

  #[tokio::test]
  async fn scatter_plan_follows_fixed_position_order() {
    let definition = PageDefinition {
      page: Some(meta()),
      header_widgets: vec![Widget::fixed(1), Widget::dynamic(2, Some("a"), "ds_a")],
      widgets: vec![Widget::dynamic(3, Some("b"), "ds_b")],
      footer_widgets: vec![Widget::dynamic(4, Some("c"), "ds_c")],
      onload_widgets: vec![Widget::dynamic(5, Some("d"), "ds_d")],
      floating_widgets: vec![Widget::dynamic(6, Some("e"), "ds_e")],
      ..PageDefinition::default()
    };
    let scope = ResolutionScope::new();

    let mapped = map_page(definition, &scope).await.unwrap();

    assert_eq!(mapped.names, vec!["ds_a", "ds_b", "ds_c", "ds_d", "ds_e"]);
    assert_eq!(
      mapped.positions,
      vec![Position::Header, Position::Normal, Position::Footer, Position::Onload,
        Position::Floating]
    );
    assert_eq!(mapped.names.len(), mapped.positions.len());
    assert_eq!(mapped.metas.len(), mapped.names.len());
    for (i, name) in mapped.names.iter().enumerate() {
      let recorded = scope.widget_at(i).await.unwrap();
      assert_eq!(&recorded.data_source, name);
      assert_eq!(recorded.position, mapped.positions[i]);
    }
  }

  #[tokio::test]
  async fn missing_page_metadata_is_fatal() {
    let definition = PageDefinition {
      widgets: vec![Widget::dynamic(1, Some("a"), "ds_a")],
      ..PageDefinition::default()
    };
    let err = map_page(definition, &ResolutionScope::new()).await.unwrap_err();
    assert_eq!(err.code(), "VALIDATION_ERROR");
  }

  #[tokio::test]
  async fn static_widgets_resolve_immediately() {
    let definition = PageDefinition {
      page: Some(meta()),
      header_widgets: vec![Widget::fixed(1).with_const_id("banner"), Widget::fixed(2)],
      ..PageDefinition::default()
    };
    let scope = ResolutionScope::new();

    let mapped = map_page(definition, &scope).await.unwrap();

    assert!(mapped.names.is_empty());
    assert!(scope.is_resolved("banner").await);
  }

  #[tokio::test]
  async fn cached_dynamic_widget_fills_without_scheduling() {
    let scope = ResolutionScope::new();
    scope.cache.lock().await.insert(
      "session".to_string(),
      DataSourceResponse::ok(serde_json::json!({"uid": 7})).with_view_type("chip"),
    );
    let definition = PageDefinition {
      page: Some(meta()),
      widgets: vec![
        Widget::dynamic(1, Some("session"), "session"),
        Widget::dynamic(2, Some("feed"), "feed"),
      ],
      ..PageDefinition::default()
    };

    let mapped = map_page(definition, &scope).await.unwrap();

    assert_eq!(mapped.names, vec!["feed"]);
    let warmed = &mapped.skeleton.widgets[0];
    assert!(warmed.processed);
    assert_eq!(warmed.data["uid"], 7);
    assert_eq!(warmed.view_type.as_deref(), Some("chip"));
    assert!(scope.is_resolved("session").await);
    // The uncached widget holds slot 0 of the plan.
    assert_eq!(scope.widget_at(0).await.unwrap().data_source, "feed");
  }

  #[tokio::test]
  async fn skeleton_carries_tabs_and_rules() {
    let definition = PageDefinition {
      page: Some(meta()),
      tabs: Some(TabsDefinition {
        items: vec![TabItem {
          id: "activity".to_string(),
          title: "Activity".to_string(),
          page_url: "/home/activity".to_string(),
        }],
        default_tab: Some("activity".to_string()),
      }),
      visibility_rules: vec![crate::page::VisibilityRule {
        widget: "payments".to_string(),
        groups: Vec::new(),
      }],
      ..PageDefinition::default()
    };

    let mapped = map_page(definition, &ResolutionScope::new()).await.unwrap();

    assert_eq!(mapped.skeleton.tabs.as_ref().unwrap()[0].id, "activity");
    assert_eq!(mapped.tabs.unwrap().default_tab.as_deref(), Some("activity"));
    assert_eq!(mapped.rules.len(), 1);
  }

  #[tokio::test]
  async fn widget_without_data_source_still_gets_a_slot() {
    let mut orphan = Widget::dynamic(9, Some("orphan"), "");
    orphan.data_source = None;
    let definition = PageDefinition {
      page: Some(meta()),
      widgets: vec![orphan],
      ..PageDefinition::default()
    };
    let scope = ResolutionScope::new();

    let mapped = map_page(definition, &scope).await.unwrap();

    // Scheduled under the empty name; the registry miss downgrades it to an
    // absent slot and the merger drops the widget.
    assert_eq!(mapped.names, vec![""]);
    assert_eq!(mapped.positions, vec![Position::Normal]);
  }
}
