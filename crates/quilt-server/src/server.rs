/* crates/quilt-server/src/server.rs */

use std::sync::Arc;

use crate::assemble::{AssemblerConfig, PageAssembler};
use crate::datasource::DataSource;
use crate::executor::Executor;
use crate::registry::DataSourceRegistry;
use crate::source::PageSource;
use crate::telemetry::{NoopTelemetry, Telemetry};

/// Framework-agnostic parts extracted from `QuiltServer`.
/// Adapter crates consume this to build framework-specific routers.
pub struct QuiltParts {
  pub registry: Arc<DataSourceRegistry>,
  pub executor: Executor,
  pub assembler: PageAssembler,
  pub page_source: Option<Arc<dyn PageSource>>,
}

pub struct QuiltServer {
  datasources: Vec<DataSource>,
  page_source: Option<Arc<dyn PageSource>>,
  telemetry: Arc<dyn Telemetry>,
  config: AssemblerConfig,
}

impl QuiltServer {
  pub fn new() -> Self {
    Self {
      datasources: Vec::new(),
      page_source: None,
      telemetry: Arc::new(NoopTelemetry),
      config: AssemblerConfig::default(),
    }
  }

  pub fn datasource(mut self, datasource: DataSource) -> Self {
    self.datasources.push(datasource);
    self
  }

  pub fn page_source(mut self, source: impl PageSource + 'static) -> Self {
    self.page_source = Some(Arc::new(source));
    self
  }

  pub fn telemetry(mut self, telemetry: impl Telemetry + 'static) -> Self {
    self.telemetry = Arc::new(telemetry);
    self
  }

  pub fn config(mut self, config: AssemblerConfig) -> Self {
    self.config = config;
    self
  }

  /// Consume the builder, returning framework-agnostic parts for an
  /// adapter. A duplicate data source name keeps the first registration;
  /// the collision is warn-logged by the registry.
  pub fn into_parts(self) -> QuiltParts {
    let mut registry = DataSourceRegistry::new();
    for datasource in self.datasources {
      registry.register(datasource);
    }
    let registry = Arc::new(registry);
    let executor = Executor::new(self.telemetry);
    let assembler = PageAssembler::new(
      registry.clone(),
      executor.clone(),
      self.config,
      self.page_source.clone(),
    );
    QuiltParts { registry, executor, assembler, page_source: self.page_source }
  }
}

impl Default for QuiltServer {
  fn default() -> Self {
    Self::new()
  }
}
