/* crates/quilt-server/src/assemble.rs */

use std::collections::BTreeSet;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::context::RequestContext;
use crate::errors::QuiltError;
use crate::executor::Executor;
use crate::mapper::{map_page, MappedPage};
use crate::merge::merge_widget;
use crate::page::{PageDefinition, PageResponse, Position, TabItem, TabsDefinition};
use crate::registry::DataSourceRegistry;
use crate::schedule::Scheduler;
use crate::scope::ResolutionScope;
use crate::source::PageSource;
use crate::visibility::filter_widgets;

#[derive(Debug, Clone, Copy)]
pub struct AssemblerConfig {
  /// Ceiling on concurrently executing widget-level data sources per
  /// gather phase. The effective ceiling is min(task count, this).
  pub max_concurrent: usize,
}

impl Default for AssemblerConfig {
  fn default() -> Self {
    Self { max_concurrent: 8 }
  }
}

/// Drives one page resolution end to end: map, preload, gather, merge,
/// visibility, then the selected tab's nested page through the same
/// pipeline and scope.
#[derive(Clone)]
pub struct PageAssembler {
  registry: Arc<DataSourceRegistry>,
  executor: Executor,
  config: AssemblerConfig,
  page_source: Option<Arc<dyn PageSource>>,
}

impl PageAssembler {
  pub fn new(
    registry: Arc<DataSourceRegistry>,
    executor: Executor,
    config: AssemblerConfig,
    page_source: Option<Arc<dyn PageSource>>,
  ) -> Self {
    Self { registry, executor, config, page_source }
  }

  /// Resolve one page with a fresh per-request scope.
  pub async fn assemble(
    &self,
    definition: PageDefinition,
    ctx: &RequestContext,
  ) -> Result<PageResponse, QuiltError> {
    self.assemble_with_scope(definition, ctx, &ResolutionScope::new()).await
  }

  /// Resolve one page inside a caller-supplied scope. Embedders use this
  /// to share a warmed cache across resolutions within one request.
  pub async fn assemble_with_scope(
    &self,
    definition: PageDefinition,
    ctx: &RequestContext,
    scope: &ResolutionScope,
  ) -> Result<PageResponse, QuiltError> {
    self.assemble_inner(definition, ctx.clone(), scope.clone()).await
  }

  // Boxed so tab pages can recurse through the same pipeline.
  fn assemble_inner(
    &self,
    definition: PageDefinition,
    ctx: RequestContext,
    scope: ResolutionScope,
  ) -> Pin<Box<dyn Future<Output = Result<PageResponse, QuiltError>> + Send + '_>> {
    Box::pin(async move {
      // Handlers read preloads through the context.
      let mut ctx = ctx;
      ctx.preloaded = scope.cache.clone();

      let MappedPage { mut skeleton, names, positions, metas, rules, tabs, preload } =
        map_page(definition, &scope).await?;

      // Preload union: page-level names plus every scheduled source's own
      // declared list.
      let mut wanted: BTreeSet<String> = preload.into_iter().collect();
      for name in &names {
        if let Some(datasource) = self.registry.lookup(name) {
          wanted.extend(datasource.info.preload.iter().cloned());
        }
      }

      let scheduler =
        Scheduler::new(self.registry.clone(), self.executor.clone(), self.config.max_concurrent);
      scheduler.preload(wanted, &ctx, &scope).await;
      let results = scheduler.gather(&names, &ctx, &scope).await;

      {
        let mut resolved = scope.resolved.lock().await;
        for (index, name) in names.iter().enumerate() {
          merge_widget(
            &mut skeleton,
            name,
            positions[index],
            &metas[index],
            results[index].as_ref(),
            &mut resolved,
          );
        }
        for position in Position::ALL {
          let widgets = std::mem::take(skeleton.list_mut(position));
          *skeleton.list_mut(position) = filter_widgets(&rules, &resolved, widgets);
        }
      }

      if let Some(tabs) = &tabs {
        self.resolve_tab(&mut skeleton, tabs, &ctx, &scope).await?;
      }

      Ok(skeleton)
    })
  }

  /// Fetch and resolve the selected tab's page into `tab_data`, sharing
  /// the request's scope. A fetch failure degrades to a page without tab
  /// data; a structural error inside the nested page is fatal, like any
  /// other mapping error.
  async fn resolve_tab(
    &self,
    skeleton: &mut PageResponse,
    tabs: &TabsDefinition,
    ctx: &RequestContext,
    scope: &ResolutionScope,
  ) -> Result<(), QuiltError> {
    let Some(selected) = select_tab(tabs, ctx) else {
      return Ok(());
    };
    let Some(source) = &self.page_source else {
      tracing::warn!(tab = %selected.id, "page has tabs but no page source is configured");
      return Ok(());
    };

    let definition = match source.fetch(&selected.page_url, ctx).await {
      Ok(definition) => definition,
      Err(err) => {
        tracing::warn!(tab = %selected.id, url = %selected.page_url, %err, "tab page fetch failed");
        return Ok(());
      }
    };

    let nested = self.assemble_inner(definition, ctx.clone(), scope.clone()).await?;
    skeleton.tab_data = Some(Box::new(nested));
    Ok(())
  }
}

/// Requested tab, falling back to the configured default, then the first.
fn select_tab<'a>(tabs: &'a TabsDefinition, ctx: &RequestContext) -> Option<&'a TabItem> {
  let by_id = |id: &str| tabs.items.iter().find(|item| item.id == id);
  ctx
    .param("tab")
    .and_then(by_id)
    .or_else(|| tabs.default_tab.as_deref().and_then(by_id))
    .or_else(|| tabs.items.first())
}
