/* crates/quilt-server/src/visibility.rs */

use std::collections::HashMap;

use crate::page::{ConditionGroup, GroupMode, VisibilityRule, Widget};

/// Drop widgets whose visibility rules evaluate false against the
/// resolution map. Widgets no rule references pass through unchanged.
/// Applied independently to each of the five position lists, and again to
/// nested tab pages.
pub fn filter_widgets(
  rules: &[VisibilityRule],
  resolved: &HashMap<String, bool>,
  widgets: Vec<Widget>,
) -> Vec<Widget> {
  if rules.is_empty() {
    return widgets;
  }
  widgets.into_iter().filter(|widget| widget_visible(rules, resolved, widget)).collect()
}

fn widget_visible(
  rules: &[VisibilityRule],
  resolved: &HashMap<String, bool>,
  widget: &Widget,
) -> bool {
  // Rules address widgets by stable id; a widget without one cannot be
  // referenced and is default-visible.
  let Some(key) = widget.const_widget_id.as_deref() else {
    return true;
  };
  rules
    .iter()
    .filter(|rule| rule.widget == key)
    .all(|rule| rule.groups.iter().all(|group| group_passes(group, resolved)))
}

/// AND: every referenced widget's entry must equal its expected state,
/// first mismatch fails the group. OR: one match passes the group, none
/// fails it. Widgets missing from the map read as unresolved.
fn group_passes(group: &ConditionGroup, resolved: &HashMap<String, bool>) -> bool {
  let state_of = |widget: &str| resolved.get(widget).copied().unwrap_or(false);
  match group.mode {
    GroupMode::And => {
      group.conditions.iter().all(|condition| state_of(&condition.widget) == condition.resolved)
    }
    GroupMode::Or => {
      group.conditions.iter().any(|condition| state_of(&condition.widget) == condition.resolved)
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::page::Condition;

  fn rule(widget: &str, mode: GroupMode, conditions: &[(&str, bool)]) -> VisibilityRule {
    VisibilityRule {
      widget: widget.to_string(),
      groups: vec![ConditionGroup {
        mode,
        conditions: conditions
          .iter()
          .map(|(w, resolved)| Condition { widget: w.to_string(), resolved: *resolved })
          .collect(),
      }],
    }
  }

  fn widgets(ids: &[&str]) -> Vec<Widget> {
    ids.iter().enumerate().map(|(i, id)| Widget::fixed(i as i64).with_const_id(*id)).collect()
  }

  #[test]
  fn and_group_requires_every_condition() {
    let rules = vec![rule("summary", GroupMode::And, &[("session", true), ("profile", true)])];

    let one_false = HashMap::from([("session".to_string(), true), ("profile".to_string(), false)]);
    assert!(filter_widgets(&rules, &one_false, widgets(&["summary"])).is_empty());

    let both_true = HashMap::from([("session".to_string(), true), ("profile".to_string(), true)]);
    assert_eq!(filter_widgets(&rules, &both_true, widgets(&["summary"])).len(), 1);
  }

  #[test]
  fn or_group_needs_a_single_match() {
    let rules = vec![rule("summary", GroupMode::Or, &[("session", true), ("profile", true)])];

    let one_match = HashMap::from([("session".to_string(), true), ("profile".to_string(), false)]);
    assert_eq!(filter_widgets(&rules, &one_match, widgets(&["summary"])).len(), 1);

    let none = HashMap::from([("session".to_string(), false), ("profile".to_string(), false)]);
    assert!(filter_widgets(&rules, &none, widgets(&["summary"])).is_empty());
  }

  #[test]
  fn missing_entries_read_as_unresolved() {
    // Expecting "never resolved" matches a widget absent from the map.
    let rules = vec![rule("fallback", GroupMode::And, &[("premium", false)])];
    let resolved = HashMap::new();
    assert_eq!(filter_widgets(&rules, &resolved, widgets(&["fallback"])).len(), 1);

    let expects_true = vec![rule("fallback", GroupMode::And, &[("premium", true)])];
    assert!(filter_widgets(&expects_true, &resolved, widgets(&["fallback"])).is_empty());
  }

  #[test]
  fn unreferenced_widgets_pass_through() {
    let rules = vec![rule("summary", GroupMode::And, &[("session", true)])];
    let resolved = HashMap::new();
    let kept = filter_widgets(&rules, &resolved, widgets(&["banner", "footer"]));
    assert_eq!(kept.len(), 2);
  }

  #[test]
  fn widget_without_stable_id_passes() {
    let rules = vec![rule("summary", GroupMode::And, &[("session", true)])];
    let kept = filter_widgets(&rules, &HashMap::new(), vec![Widget::fixed(1)]);
    assert_eq!(kept.len(), 1);
  }

  #[test]
  fn every_owning_rule_must_pass() {
    let rules = vec![
      rule("summary", GroupMode::And, &[("session", true)]),
      rule("summary", GroupMode::Or, &[("profile", true)]),
    ];
    let resolved = HashMap::from([("session".to_string(), true), ("profile".to_string(), false)]);
    assert!(filter_widgets(&rules, &resolved, widgets(&["summary"])).is_empty());
  }

  #[test]
  fn rule_without_groups_keeps_the_widget() {
    let rules = vec![VisibilityRule { widget: "summary".to_string(), groups: Vec::new() }];
    assert_eq!(filter_widgets(&rules, &HashMap::new(), widgets(&["summary"])).len(), 1);
  }
}
