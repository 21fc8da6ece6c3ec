/* demo/backend/src/telemetry.rs */

use std::time::Duration;

use quilt_server::datasource::BoxFuture;
use quilt_server::errors::QuiltError;
use quilt_server::telemetry::Telemetry;

/// Emits observations as tracing events. A real deployment would forward
/// them to a metrics backend instead.
pub struct LogTelemetry;

impl Telemetry for LogTelemetry {
  fn record_count(&self, name: &str, status: u16) -> BoxFuture<Result<(), QuiltError>> {
    tracing::info!(datasource = name, status, "datasource request");
    Box::pin(async { Ok(()) })
  }

  fn record_duration(
    &self,
    name: &str,
    status: u16,
    elapsed: Duration,
  ) -> BoxFuture<Result<(), QuiltError>> {
    let elapsed_ms = elapsed.as_millis() as u64;
    tracing::info!(datasource = name, status, elapsed_ms, "datasource duration");
    Box::pin(async { Ok(()) })
  }
}
