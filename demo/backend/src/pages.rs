/* demo/backend/src/pages.rs */

use quilt_server::page::{
  Condition, ConditionGroup, GroupMode, PageDefinition, PageMeta, TabItem, TabsDefinition,
  VisibilityRule, Widget,
};
use quilt_server::source::StaticPageSource;

pub fn demo_pages() -> StaticPageSource {
  StaticPageSource::new().page("/home", home_page()).page("/home/activity", activity_page())
}

/// Account home: personalized header, offers and payments widgets, a
/// sign-in banner for anonymous sessions, and an activity tab.
fn home_page() -> PageDefinition {
  PageDefinition {
    page: Some(PageMeta {
      id: 1,
      name: "home".to_string(),
      title: Some("Account Home".to_string()),
      version: Some("1".to_string()),
    }),
    preload: vec!["session".to_string()],
    header_widgets: vec![Widget::dynamic(1, Some("user-summary"), "user_summary")],
    widgets: vec![
      Widget::dynamic(2, Some("offers-carousel"), "offers"),
      Widget::dynamic(3, Some("payments-panel"), "payments"),
      signin_banner(),
    ],
    floating_widgets: vec![Widget::fixed(9).with_const_id("support-bubble").with_view_type("fab")],
    visibility_rules: vec![
      // The banner stands in for whichever personalized widget was dropped.
      VisibilityRule {
        widget: "signin-banner".to_string(),
        groups: vec![ConditionGroup {
          mode: GroupMode::Or,
          conditions: vec![
            Condition { widget: "payments-panel".to_string(), resolved: false },
            Condition { widget: "user-summary".to_string(), resolved: false },
          ],
        }],
      },
      VisibilityRule {
        widget: "support-bubble".to_string(),
        groups: vec![ConditionGroup {
          mode: GroupMode::And,
          conditions: vec![Condition { widget: "payments-panel".to_string(), resolved: true }],
        }],
      },
    ],
    tabs: Some(TabsDefinition {
      items: vec![TabItem {
        id: "activity".to_string(),
        title: "Recent activity".to_string(),
        page_url: "/home/activity".to_string(),
      }],
      default_tab: Some("activity".to_string()),
    }),
    ..PageDefinition::default()
  }
}

fn signin_banner() -> Widget {
  let mut banner = Widget::fixed(4).with_const_id("signin-banner").with_view_type("banner");
  banner.data = serde_json::json!({
    "text": "Sign in to see your payments and personalized offers.",
    "cta": "/signin",
  });
  banner
}

/// Page behind the activity tab. It resolves inside the parent request's
/// scope, so the session preload stays warm.
fn activity_page() -> PageDefinition {
  PageDefinition {
    page: Some(PageMeta {
      id: 2,
      name: "home_activity".to_string(),
      title: Some("Recent activity".to_string()),
      version: None,
    }),
    widgets: vec![Widget::dynamic(10, Some("activity-list"), "activity_feed")],
    ..PageDefinition::default()
  }
}
