/* crates/quilt-server/src/source.rs */

use std::collections::HashMap;

use crate::context::RequestContext;
use crate::datasource::BoxFuture;
use crate::errors::QuiltError;
use crate::page::PageDefinition;

/// Upstream page-definition source, keyed by URL plus whatever the
/// implementation reads from the request context (user, persona, locale).
/// The engine treats the returned definition as an opaque read.
pub trait PageSource: Send + Sync {
  fn fetch(
    &self,
    url: &str,
    ctx: &RequestContext,
  ) -> BoxFuture<Result<PageDefinition, QuiltError>>;
}

/// In-memory source serving a fixed set of definitions, for demos and
/// tests. Production embedders typically fetch from a page service.
#[derive(Default)]
pub struct StaticPageSource {
  pages: HashMap<String, PageDefinition>,
}

impl StaticPageSource {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn page(mut self, url: impl Into<String>, definition: PageDefinition) -> Self {
    self.pages.insert(url.into(), definition);
    self
  }
}

impl PageSource for StaticPageSource {
  fn fetch(
    &self,
    url: &str,
    _ctx: &RequestContext,
  ) -> BoxFuture<Result<PageDefinition, QuiltError>> {
    let result = self
      .pages
      .get(url)
      .cloned()
      .ok_or_else(|| QuiltError::not_found(format!("no page definition for '{url}'")));
    Box::pin(async move { result })
  }
}
