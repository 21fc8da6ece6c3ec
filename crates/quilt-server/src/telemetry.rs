/* crates/quilt-server/src/telemetry.rs */

use std::time::Duration;

use crate::datasource::BoxFuture;
use crate::errors::QuiltError;

/// Sink for execution observations. The executor emits one count and one
/// duration per invocation, tagged with the data-source name and the final
/// HTTP-equivalent status. Sink failures are swallowed on the internal
/// assembly path and surfaced on the externally-routed path.
pub trait Telemetry: Send + Sync {
  fn record_count(&self, name: &str, status: u16) -> BoxFuture<Result<(), QuiltError>>;

  fn record_duration(
    &self,
    name: &str,
    status: u16,
    elapsed: Duration,
  ) -> BoxFuture<Result<(), QuiltError>>;
}

/// Default sink: discards every observation.
pub struct NoopTelemetry;

impl Telemetry for NoopTelemetry {
  fn record_count(&self, _name: &str, _status: u16) -> BoxFuture<Result<(), QuiltError>> {
    Box::pin(async { Ok(()) })
  }

  fn record_duration(
    &self,
    _name: &str,
    _status: u16,
    _elapsed: Duration,
  ) -> BoxFuture<Result<(), QuiltError>> {
    Box::pin(async { Ok(()) })
  }
}

#[cfg(test)]
pub(crate) mod test_support {
  use std::sync::Mutex;

  use super::*;

  /// Captures observations for assertions; optionally fails every emission.
  pub struct CapturingTelemetry {
    pub counts: Mutex<Vec<(String, u16)>>,
    pub durations: Mutex<Vec<(String, u16, Duration)>>,
    pub fail: bool,
  }

  impl CapturingTelemetry {
    pub fn new() -> Self {
      Self { counts: Mutex::new(Vec::new()), durations: Mutex::new(Vec::new()), fail: false }
    }

    pub fn failing() -> Self {
      Self { fail: true, ..Self::new() }
    }
  }

  impl Telemetry for CapturingTelemetry {
    fn record_count(&self, name: &str, status: u16) -> BoxFuture<Result<(), QuiltError>> {
      self.counts.lock().unwrap().push((name.to_string(), status));
      let fail = self.fail;
      Box::pin(async move {
        if fail { Err(QuiltError::internal("metric sink unavailable")) } else { Ok(()) }
      })
    }

    fn record_duration(
      &self,
      name: &str,
      status: u16,
      elapsed: Duration,
    ) -> BoxFuture<Result<(), QuiltError>> {
      self.durations.lock().unwrap().push((name.to_string(), status, elapsed));
      let fail = self.fail;
      Box::pin(async move {
        if fail { Err(QuiltError::internal("metric sink unavailable")) } else { Ok(()) }
      })
    }
  }
}

#[cfg(test)]
mod tests {
  use super::test_support::CapturingTelemetry;
  use super::*;

  #[tokio::test]
  async fn noop_sink_never_fails() {
    let sink = NoopTelemetry;
    assert!(sink.record_count("feed", 200).await.is_ok());
    assert!(sink.record_duration("feed", 200, Duration::from_millis(3)).await.is_ok());
  }

  #[tokio::test]
  async fn capturing_sink_stores_observations() {
    let sink = CapturingTelemetry::new();
    sink.record_count("feed", 504).await.unwrap();
    sink.record_duration("feed", 504, Duration::from_millis(810)).await.unwrap();
    assert_eq!(sink.counts.lock().unwrap().as_slice(), &[("feed".to_string(), 504)]);
    assert_eq!(
      sink.durations.lock().unwrap().as_slice(),
      &[("feed".to_string(), 504, Duration::from_millis(810))]
    );
  }

  #[tokio::test]
  async fn failing_sink_reports_errors() {
    let sink = CapturingTelemetry::failing();
    assert!(sink.record_count("feed", 200).await.is_err());
    assert_eq!(sink.counts.lock().unwrap().len(), 1);
  }
}
