/* crates/quilt-server/src/page.rs */

use serde::{Deserialize, Serialize};

use crate::errors::QuiltError;

/// The five widget slots of a page, in resolution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Position {
  Header,
  Normal,
  Footer,
  Onload,
  Floating,
}

impl Position {
  /// Fixed walk order. Cross-position ordering is significant: the gather
  /// phase maps results back by positional index.
  pub const ALL: [Position; 5] =
    [Position::Header, Position::Normal, Position::Footer, Position::Onload, Position::Floating];

  pub fn as_str(self) -> &'static str {
    match self {
      Position::Header => "header",
      Position::Normal => "normal",
      Position::Footer => "footer",
      Position::Onload => "onload",
      Position::Floating => "floating",
    }
  }

  /// Parse an upstream position tag. Definition formats that tag widgets
  /// with a position string instead of grouping them into lists should
  /// parse the tag here, at the boundary.
  pub fn parse(tag: &str) -> Result<Position, QuiltError> {
    match tag {
      "header" => Ok(Position::Header),
      "normal" => Ok(Position::Normal),
      "footer" => Ok(Position::Footer),
      "onload" => Ok(Position::Onload),
      "floating" => Ok(Position::Floating),
      other => Err(QuiltError::validation(format!("unsupported position '{other}'"))),
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum WidgetKind {
  #[default]
  Static,
  Dynamic,
}

/// A renderable unit of page content. STATIC widgets render from the
/// definition alone; DYNAMIC widgets carry a data-source name and receive
/// their `data` from the merger. `kind` and `data_source` exist only in
/// definitions; the client response carries neither.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Widget {
  pub id: i64,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub const_widget_id: Option<String>,
  #[serde(default, skip_serializing)]
  pub kind: WidgetKind,
  #[serde(default, skip_serializing)]
  pub data_source: Option<String>,
  #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
  pub view_type: Option<String>,
  #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
  pub tracking_params: serde_json::Value,
  #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
  pub layout_params: serde_json::Value,
  #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
  pub data: serde_json::Value,
  #[serde(skip)]
  pub processed: bool,
}

impl Widget {
  /// STATIC widget: no fetch needed.
  pub fn fixed(id: i64) -> Self {
    Self {
      id,
      const_widget_id: None,
      kind: WidgetKind::Static,
      data_source: None,
      view_type: None,
      tracking_params: serde_json::Value::Null,
      layout_params: serde_json::Value::Null,
      data: serde_json::Value::Null,
      processed: false,
    }
  }

  /// DYNAMIC widget resolved through the named data source.
  pub fn dynamic(id: i64, const_widget_id: Option<&str>, data_source: &str) -> Self {
    Self {
      kind: WidgetKind::Dynamic,
      const_widget_id: const_widget_id.map(str::to_string),
      data_source: Some(data_source.to_string()),
      ..Self::fixed(id)
    }
  }

  pub fn with_const_id(mut self, const_widget_id: impl Into<String>) -> Self {
    self.const_widget_id = Some(const_widget_id.into());
    self
  }

  pub fn with_view_type(mut self, view_type: impl Into<String>) -> Self {
    self.view_type = Some(view_type.into());
    self
  }

  pub fn is_dynamic(&self) -> bool {
    self.kind == WidgetKind::Dynamic
  }
}

/// Top-level page metadata. Flattened into the response root.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageMeta {
  pub id: i64,
  pub name: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub title: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub version: Option<String>,
}

/// One tab header; the selected tab's page is fetched from `page_url` and
/// resolved through the same pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TabItem {
  pub id: String,
  pub title: String,
  pub page_url: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TabsDefinition {
  #[serde(default)]
  pub items: Vec<TabItem>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub default_tab: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum GroupMode {
  And,
  Or,
}

/// One referenced widget and the resolved-state it is expected to be in.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Condition {
  pub widget: String,
  pub resolved: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConditionGroup {
  #[serde(rename = "type")]
  pub mode: GroupMode,
  #[serde(default)]
  pub conditions: Vec<Condition>,
}

/// Visibility rule owned by the widget named in `widget` (a stable
/// const-widget-id). The widget is kept only if every group passes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VisibilityRule {
  pub widget: String,
  #[serde(default)]
  pub groups: Vec<ConditionGroup>,
}

/// Externally supplied page definition: metadata, five ordered widget
/// lists, page-level preloads, visibility rules, and optional tabs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PageDefinition {
  #[serde(default)]
  pub page: Option<PageMeta>,
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub preload: Vec<String>,
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub header_widgets: Vec<Widget>,
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub widgets: Vec<Widget>,
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub footer_widgets: Vec<Widget>,
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub onload_widgets: Vec<Widget>,
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub floating_widgets: Vec<Widget>,
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub visibility_rules: Vec<VisibilityRule>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub tabs: Option<TabsDefinition>,
}

/// Assembled page surfaced to clients. Field names are an external
/// contract with client applications.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageResponse {
  #[serde(flatten)]
  pub page: PageMeta,
  pub header_widgets: Vec<Widget>,
  pub widgets: Vec<Widget>,
  pub footer_widgets: Vec<Widget>,
  pub onload_widgets: Vec<Widget>,
  pub floating_widgets: Vec<Widget>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub tabs: Option<Vec<TabItem>>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub tab_data: Option<Box<PageResponse>>,
}

impl PageResponse {
  pub fn skeleton(page: PageMeta) -> Self {
    Self {
      page,
      header_widgets: Vec::new(),
      widgets: Vec::new(),
      footer_widgets: Vec::new(),
      onload_widgets: Vec::new(),
      floating_widgets: Vec::new(),
      tabs: None,
      tab_data: None,
    }
  }

  pub fn list(&self, position: Position) -> &Vec<Widget> {
    match position {
      Position::Header => &self.header_widgets,
      Position::Normal => &self.widgets,
      Position::Footer => &self.footer_widgets,
      Position::Onload => &self.onload_widgets,
      Position::Floating => &self.floating_widgets,
    }
  }

  pub fn list_mut(&mut self, position: Position) -> &mut Vec<Widget> {
    match position {
      Position::Header => &mut self.header_widgets,
      Position::Normal => &mut self.widgets,
      Position::Footer => &mut self.footer_widgets,
      Position::Onload => &mut self.onload_widgets,
      Position::Floating => &mut self.floating_widgets,
    }
  }
}
