/* crates/quilt-server/src/manifest.rs */

use std::collections::BTreeMap;

use serde::Serialize;

use crate::registry::DataSourceRegistry;

/// Catalog of everything the registry serves, without handler internals.
/// Adapters expose it for operators and client tooling.
#[derive(Serialize)]
pub struct Manifest {
  pub version: u32,
  pub datasources: BTreeMap<String, DataSourceSchema>,
}

#[derive(Serialize)]
pub struct DataSourceSchema {
  #[serde(skip_serializing_if = "String::is_empty")]
  pub uri: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub method: Option<&'static str>,
  pub timeout_ms: u64,
  #[serde(skip_serializing_if = "Vec::is_empty")]
  pub preload: Vec<String>,
  #[serde(skip_serializing_if = "String::is_empty")]
  pub resource: String,
  #[serde(skip_serializing_if = "String::is_empty")]
  pub action: String,
}

pub fn build_manifest(registry: &DataSourceRegistry) -> Manifest {
  let mut map = BTreeMap::new();
  for (name, datasource) in registry.all() {
    let info = &datasource.info;
    map.insert(
      name.clone(),
      DataSourceSchema {
        uri: info.uri.clone(),
        method: info.method.map(crate::datasource::Method::as_str),
        timeout_ms: info.timeout.as_millis() as u64,
        preload: info.preload.clone(),
        resource: info.resource.clone(),
        action: info.action.clone(),
      },
    );
  }
  Manifest { version: 1, datasources: map }
}
