/* crates/quilt-server/src/lib.rs */

pub mod assemble;
pub mod context;
pub mod datasource;
pub mod errors;
pub mod executor;
pub mod manifest;
pub mod mapper;
pub mod merge;
pub mod page;
pub mod registry;
pub mod schedule;
pub mod scope;
pub mod server;
pub mod source;
pub mod telemetry;
pub mod visibility;

// Re-exports for ergonomic use
pub use assemble::{AssemblerConfig, PageAssembler};
pub use context::{RequestContext, UserIdentity};
pub use datasource::{
  BoxFuture, DataSource, DataSourceInfo, DataSourceResponse, FilterFn, HandlerFn, Method,
  DEFAULT_TIMEOUT,
};
pub use errors::QuiltError;
pub use executor::Executor;
pub use manifest::{build_manifest, Manifest};
pub use page::{
  Condition, ConditionGroup, GroupMode, PageDefinition, PageMeta, PageResponse, Position,
  TabItem, TabsDefinition, VisibilityRule, Widget, WidgetKind,
};
pub use registry::DataSourceRegistry;
pub use schedule::Scheduler;
pub use scope::{ResolutionScope, SharedCache, WidgetMeta};
pub use server::{QuiltParts, QuiltServer};
pub use source::{PageSource, StaticPageSource};
pub use telemetry::{NoopTelemetry, Telemetry};
pub use visibility::filter_widgets;
