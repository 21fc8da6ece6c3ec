/* crates/quilt-server/src/registry.rs */

use std::collections::HashMap;
use std::sync::Arc;

use crate::datasource::DataSource;

/// Catalog of data sources keyed by unique name. Built once at startup by
/// the server builder, read-only afterward; there is no removal.
#[derive(Default)]
pub struct DataSourceRegistry {
  entries: HashMap<String, Arc<DataSource>>,
}

impl DataSourceRegistry {
  pub fn new() -> Self {
    Self::default()
  }

  /// Register under the descriptor's name. A duplicate name leaves the
  /// registry unchanged and returns false; the collision is reported, not
  /// corrected.
  pub fn register(&mut self, datasource: DataSource) -> bool {
    let name = datasource.info.name.clone();
    if self.entries.contains_key(&name) {
      tracing::warn!(%name, "duplicate data source registration ignored");
      return false;
    }
    self.entries.insert(name, Arc::new(datasource));
    true
  }

  pub fn lookup(&self, name: &str) -> Option<Arc<DataSource>> {
    self.entries.get(name).cloned()
  }

  pub fn all(&self) -> &HashMap<String, Arc<DataSource>> {
    &self.entries
  }

  pub fn len(&self) -> usize {
    self.entries.len()
  }

  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }
}
