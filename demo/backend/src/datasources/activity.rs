/* demo/backend/src/datasources/activity.rs */

use std::sync::Arc;

use quilt_server::context::RequestContext;
use quilt_server::datasource::{DataSource, DataSourceResponse, Method};

const EVENTS: &[(&str, &str)] = &[
  ("payment", "Paid City Power $42.50"),
  ("offer", "Saved 20% on movie tickets"),
  ("login", "Signed in from a new device"),
  ("payment", "Paid Acme Broadband $59.99"),
];

/// Recent account events, trimmed by the optional `limit` query param.
pub fn activity_feed() -> DataSource {
  DataSource::new(
    "activity_feed",
    Arc::new(|ctx: RequestContext, _| {
      Box::pin(async move {
        let limit = ctx
          .param("limit")
          .and_then(|v| v.parse::<usize>().ok())
          .unwrap_or(EVENTS.len());
        let events: Vec<_> = EVENTS
          .iter()
          .take(limit)
          .map(|(kind, label)| serde_json::json!({ "kind": kind, "label": label }))
          .collect();
        Ok(DataSourceResponse::ok(serde_json::json!({ "events": events })))
      })
    }),
  )
  .route("/v1/activity", Method::Get)
}
