/* crates/quilt-server/src/schedule.rs */

use std::any::Any;
use std::collections::BTreeSet;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures_util::FutureExt;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::context::RequestContext;
use crate::datasource::DataSourceResponse;
use crate::executor::Executor;
use crate::registry::DataSourceRegistry;
use crate::scope::ResolutionScope;

/// Scatter/gather scheduler: a deduplicated, unbounded preload phase
/// followed by one bounded-concurrency task per widget-level data source,
/// gathered into a position-preserving array.
#[derive(Clone)]
pub struct Scheduler {
  registry: Arc<DataSourceRegistry>,
  executor: Executor,
  max_concurrent: usize,
}

impl Scheduler {
  pub fn new(registry: Arc<DataSourceRegistry>, executor: Executor, max_concurrent: usize) -> Self {
    Self { registry, executor, max_concurrent }
  }

  /// Warm the scope's cache with every named data source not already in it.
  /// All tasks run simultaneously; each clones the request context and
  /// stores its response under the source name on OK status. The phase
  /// never fails: a failed or non-OK preload is simply absent afterward.
  pub async fn preload(
    &self,
    names: BTreeSet<String>,
    ctx: &RequestContext,
    scope: &ResolutionScope,
  ) {
    let mut set = JoinSet::new();
    for name in names {
      if scope.cache_contains(&name).await {
        continue;
      }
      let Some(datasource) = self.registry.lookup(&name) else {
        tracing::warn!(%name, "preload data source not registered");
        continue;
      };
      let executor = self.executor.clone();
      let base = ctx.clone();
      let cache = scope.cache.clone();

      set.spawn(async move {
        let task_ctx = base.with_deadline(datasource.info.timeout);
        let outcome =
          AssertUnwindSafe(executor.execute(&datasource, task_ctx)).catch_unwind().await;
        match outcome {
          Ok(Ok(response)) if response.is_ok() => {
            cache.lock().await.insert(name, response);
          }
          Ok(Ok(response)) => {
            tracing::warn!(%name, status = response.status, "preload returned non-ok status");
          }
          Ok(Err(err)) => {
            tracing::warn!(%name, %err, "preload failed");
          }
          Err(panic) => {
            tracing::error!(%name, panic = panic_message(panic.as_ref()), "preload panicked");
          }
        }
      });
    }

    while let Some(joined) = set.join_next().await {
      if let Err(err) = joined {
        tracing::error!(%err, "preload task failed to join");
      }
    }
  }

  /// Execute the mapper's ordered (name, position) plan. `result[i]`
  /// corresponds to `names[i]` regardless of completion order; a failed,
  /// non-OK, panicked or unknown source leaves slot i absent. Concurrency
  /// is capped at min(task count, configured maximum). Dropping the
  /// returned future aborts all in-flight tasks.
  pub async fn gather(
    &self,
    names: &[String],
    ctx: &RequestContext,
    scope: &ResolutionScope,
  ) -> Vec<Option<DataSourceResponse>> {
    let mut results: Vec<Option<DataSourceResponse>> = vec![None; names.len()];
    if names.is_empty() {
      return results;
    }

    let ceiling = names.len().min(self.max_concurrent).max(1);
    let semaphore = Arc::new(Semaphore::new(ceiling));
    let mut set: JoinSet<(usize, Option<DataSourceResponse>)> = JoinSet::new();

    for (index, name) in names.iter().enumerate() {
      let Some(datasource) = self.registry.lookup(name) else {
        tracing::warn!(task = index, %name, "data source not registered");
        continue;
      };
      let name = name.clone();
      let executor = self.executor.clone();
      let semaphore = semaphore.clone();
      let cache = scope.cache.clone();
      let mut base = ctx.clone();
      base.widget = scope.widget_at(index).await;

      set.spawn(async move {
        let _permit = match semaphore.acquire_owned().await {
          Ok(permit) => permit,
          Err(_) => return (index, None),
        };
        // Deadline counts from permit acquisition, not from spawn.
        let task_ctx = base.with_deadline(datasource.info.timeout);
        let outcome =
          AssertUnwindSafe(executor.execute(&datasource, task_ctx)).catch_unwind().await;
        let slot = match outcome {
          Ok(Ok(response)) if response.is_ok() => {
            // Later passes in the same request reuse this through the cache.
            cache.lock().await.insert(name, response.clone());
            Some(response)
          }
          Ok(Ok(response)) => {
            tracing::warn!(
              task = index,
              %name,
              status = response.status,
              "data source returned non-ok status"
            );
            None
          }
          Ok(Err(err)) => {
            tracing::warn!(task = index, %name, %err, "data source failed");
            None
          }
          Err(panic) => {
            tracing::error!(
              task = index,
              %name,
              panic = panic_message(panic.as_ref()),
              "data source panicked"
            );
            None
          }
        };
        (index, slot)
      });
    }

    // Panics are already recovered inside each task; a JoinError here is
    // the second line of defense and degrades only its own slot, never the
    // barrier.
    while let Some(joined) = set.join_next().await {
      match joined {
        Ok((index, slot)) => results[index] = slot,
        Err(err) => tracing::error!(%err, "gather task failed to join"),
      }
    }
    results
  }
}

pub(crate) fn panic_message(panic: &(dyn Any + Send)) -> &str {
  if let Some(message) = panic.downcast_ref::<&str>() {
    message
  } else if let Some(message) = panic.downcast_ref::<String>() {
    message
  } else {
    "non-string panic payload"
  }
}
