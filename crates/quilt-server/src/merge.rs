/* crates/quilt-server/src/merge.rs */

use std::collections::HashMap;

use crate::datasource::DataSourceResponse;
use crate::page::{PageResponse, Position, Widget};
use crate::scope::WidgetMeta;

/// Copy a data-source response into a widget: payload into `data`, optional
/// view-type override, processed flag set. Shared by the merger and the
/// mapper's cached-widget path.
pub(crate) fn apply_response(widget: &mut Widget, response: &DataSourceResponse) {
  widget.data = response.data.clone();
  if let Some(view_type) = &response.view_type {
    widget.view_type = Some(view_type.clone());
  }
  widget.processed = true;
}

/// Stitch one gather slot back into the response, in gather order.
///
/// Walks the position's list for the first unprocessed DYNAMIC widget whose
/// data-source name and identity match the slot. An absent result records
/// resolved=false for that widget and drops it from the list; a present one
/// fills the widget and records resolved=true. Every other widget surviving
/// the walk is recorded resolved=true. The list is compacted in place, so a
/// dropped widget leaves no hole. A second merge of the same slot is a
/// no-op: the processed flag keeps a widget from being written twice.
pub fn merge_widget(
  response: &mut PageResponse,
  name: &str,
  position: Position,
  meta: &WidgetMeta,
  result: Option<&DataSourceResponse>,
  resolved: &mut HashMap<String, bool>,
) {
  let list = response.list_mut(position);
  let mut write = 0;
  let mut matched = false;

  for read in 0..list.len() {
    let is_target = !matched && {
      let widget = &list[read];
      widget.is_dynamic()
        && !widget.processed
        && widget.data_source.as_deref().unwrap_or("") == name
        && meta.matches(widget)
    };

    let mut keep = true;
    if is_target {
      matched = true;
      match result {
        Some(data) => {
          apply_response(&mut list[read], data);
          if let Some(key) = meta.resolution_key() {
            resolved.insert(key.to_string(), true);
          }
        }
        None => {
          if let Some(key) = meta.resolution_key() {
            resolved.insert(key.to_string(), false);
          }
          keep = false;
        }
      }
    }

    if keep {
      if let Some(key) = list[read].const_widget_id.clone() {
        resolved.insert(key, true);
      }
      if write != read {
        list.swap(write, read);
      }
      write += 1;
    }
  }

  list.truncate(write);
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::page::PageMeta;

  fn skeleton() -> PageResponse {
    PageResponse::skeleton(PageMeta {
      id: 1,
      name: "home".to_string(),
      title: None,
      version: None,
    })
  }

  fn meta_for(widget: &Widget, name: &str, position: Position) -> WidgetMeta {
    WidgetMeta {
      widget_id: widget.id,
      const_widget_id: widget.const_widget_id.clone(),
      data_source: name.to_string(),
      position,
    }
  }

  #[test]
  fn present_result_fills_widget_and_marks_resolved() {
    let mut response = skeleton();
    response.header_widgets.push(Widget::fixed(1));
    response.header_widgets.push(Widget::dynamic(2, Some("hero"), "feed"));
    let meta = meta_for(&response.header_widgets[1], "feed", Position::Header);
    let data =
      DataSourceResponse::ok(serde_json::json!({"x": 1})).with_view_type("carousel");
    let mut resolved = HashMap::new();

    merge_widget(&mut response, "feed", Position::Header, &meta, Some(&data), &mut resolved);

    let widget = &response.header_widgets[1];
    assert_eq!(widget.data["x"], 1);
    assert_eq!(widget.view_type.as_deref(), Some("carousel"));
    assert!(widget.processed);
    assert_eq!(resolved.get("hero"), Some(&true));
    assert_eq!(response.header_widgets.len(), 2);
  }

  #[test]
  fn absent_result_drops_widget_and_marks_unresolved() {
    let mut response = skeleton();
    response.widgets.push(Widget::dynamic(2, Some("offers"), "offers"));
    response.widgets.push(Widget::fixed(9));
    let meta = meta_for(&response.widgets[0], "offers", Position::Normal);
    let mut resolved = HashMap::new();

    merge_widget(&mut response, "offers", Position::Normal, &meta, None, &mut resolved);

    assert_eq!(response.widgets.len(), 1);
    assert_eq!(response.widgets[0].id, 9);
    assert_eq!(resolved.get("offers"), Some(&false));
  }

  #[test]
  fn second_merge_of_same_slot_is_a_noop() {
    let mut response = skeleton();
    response.widgets.push(Widget::dynamic(2, Some("hero"), "feed"));
    let meta = meta_for(&response.widgets[0], "feed", Position::Normal);
    let mut resolved = HashMap::new();

    let first = DataSourceResponse::ok(serde_json::json!({"x": 1}));
    merge_widget(&mut response, "feed", Position::Normal, &meta, Some(&first), &mut resolved);

    let second = DataSourceResponse::ok(serde_json::json!({"y": 2}));
    merge_widget(&mut response, "feed", Position::Normal, &meta, Some(&second), &mut resolved);

    assert_eq!(response.widgets[0].data, serde_json::json!({"x": 1}));
    assert_eq!(resolved.get("hero"), Some(&true));
    assert_eq!(response.widgets.len(), 1);
  }

  #[test]
  fn duplicate_data_source_fills_widgets_in_list_order() {
    // Two widgets backed by the same source, no stable ids: each gather
    // slot matches by numeric id.
    let mut response = skeleton();
    response.widgets.push(Widget::dynamic(1, None, "feed"));
    response.widgets.push(Widget::dynamic(2, None, "feed"));
    let first_meta = meta_for(&response.widgets[0], "feed", Position::Normal);
    let second_meta = meta_for(&response.widgets[1], "feed", Position::Normal);
    let mut resolved = HashMap::new();

    let a = DataSourceResponse::ok(serde_json::json!({"slot": "a"}));
    let b = DataSourceResponse::ok(serde_json::json!({"slot": "b"}));
    merge_widget(&mut response, "feed", Position::Normal, &first_meta, Some(&a), &mut resolved);
    merge_widget(&mut response, "feed", Position::Normal, &second_meta, Some(&b), &mut resolved);

    assert_eq!(response.widgets[0].data["slot"], "a");
    assert_eq!(response.widgets[1].data["slot"], "b");
  }

  #[test]
  fn survivors_are_marked_resolved() {
    let mut response = skeleton();
    response.widgets.push(Widget::fixed(1).with_const_id("banner"));
    response.widgets.push(Widget::dynamic(2, Some("other"), "other_source"));
    // Slot for a widget that is not in the list at all: nothing dropped,
    // nothing recorded for it, survivors still marked.
    let ghost = WidgetMeta {
      widget_id: 99,
      const_widget_id: Some("ghost".to_string()),
      data_source: "feed".to_string(),
      position: Position::Normal,
    };
    let mut resolved = HashMap::new();

    merge_widget(&mut response, "feed", Position::Normal, &ghost, None, &mut resolved);

    assert_eq!(response.widgets.len(), 2);
    assert_eq!(resolved.get("banner"), Some(&true));
    assert_eq!(resolved.get("other"), Some(&true));
    assert_eq!(resolved.get("ghost"), None);
  }

  #[test]
  fn mixed_identity_never_matches() {
    let mut response = skeleton();
    response.widgets.push(Widget::dynamic(5, None, "feed"));
    let stable = WidgetMeta {
      widget_id: 5,
      const_widget_id: Some("hero".to_string()),
      data_source: "feed".to_string(),
      position: Position::Normal,
    };
    let mut resolved = HashMap::new();

    merge_widget(&mut response, "feed", Position::Normal, &stable, None, &mut resolved);

    // Widget survives: the slot's stable id cannot claim an id-only widget.
    assert_eq!(response.widgets.len(), 1);
    assert!(!response.widgets[0].processed);
  }
}
