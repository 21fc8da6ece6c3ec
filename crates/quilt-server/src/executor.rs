/* crates/quilt-server/src/executor.rs */

use std::sync::Arc;
use std::time::Instant;

use crate::context::RequestContext;
use crate::datasource::{DataSource, DataSourceResponse};
use crate::errors::QuiltError;
use crate::telemetry::Telemetry;

/// Runs one data source: filter chain strictly in order, then the handler
/// under the remaining time budget. Emits one count and one duration
/// observation per invocation, tagged with the final status.
#[derive(Clone)]
pub struct Executor {
  telemetry: Arc<dyn Telemetry>,
}

impl Executor {
  pub fn new(telemetry: Arc<dyn Telemetry>) -> Self {
    Self { telemetry }
  }

  /// Scheduler-driven variant: a telemetry emission failure is logged and
  /// swallowed so it can never degrade a page resolution.
  pub async fn execute(
    &self,
    datasource: &DataSource,
    ctx: RequestContext,
  ) -> Result<DataSourceResponse, QuiltError> {
    let (result, telemetry) = self.run(datasource, ctx).await;
    if let Err(err) = telemetry {
      tracing::warn!(name = %datasource.info.name, %err, "telemetry emission failed");
    }
    result
  }

  /// Externally-routed variant: a telemetry emission failure is surfaced
  /// to the caller, after the execution outcome itself is settled.
  pub async fn execute_routed(
    &self,
    datasource: &DataSource,
    ctx: RequestContext,
  ) -> Result<DataSourceResponse, QuiltError> {
    let (result, telemetry) = self.run(datasource, ctx).await;
    let response = result?;
    telemetry?;
    Ok(response)
  }

  async fn run(
    &self,
    datasource: &DataSource,
    ctx: RequestContext,
  ) -> (Result<DataSourceResponse, QuiltError>, Result<(), QuiltError>) {
    let started = Instant::now();
    let result = self.filters_then_handler(datasource, ctx).await;

    let status = match &result {
      Ok(response) => response.status,
      Err(err) => err.status(),
    };
    let name = &datasource.info.name;
    let count = self.telemetry.record_count(name, status).await;
    let duration = self.telemetry.record_duration(name, status, started.elapsed()).await;
    (result, count.and(duration))
  }

  async fn filters_then_handler(
    &self,
    datasource: &DataSource,
    ctx: RequestContext,
  ) -> Result<DataSourceResponse, QuiltError> {
    // First filter failure aborts the chain; the handler never runs.
    for filter in &datasource.filters {
      filter(ctx.clone(), datasource.info.clone()).await?;
    }

    // The scheduler stamps the deadline before calling; a bare context
    // (routed path) falls back to the descriptor timeout.
    let budget = ctx.remaining().unwrap_or(datasource.info.timeout);
    match tokio::time::timeout(budget, (datasource.handler)(ctx, datasource.info.clone())).await {
      Ok(result) => result,
      Err(_) => Err(QuiltError::timeout(format!(
        "data source '{}' exceeded {}ms",
        datasource.info.name,
        budget.as_millis()
      ))),
    }
  }
}
