/* demo/backend/src/datasources/user_summary.rs */

use std::sync::Arc;

use quilt_server::context::RequestContext;
use quilt_server::datasource::{DataSource, DataSourceResponse, Method};

/// Greeting card for the page header. Declares the session preload and
/// reads it from the cache instead of re-deriving the identity.
pub fn user_summary() -> DataSource {
  DataSource::new(
    "user_summary",
    Arc::new(|ctx: RequestContext, _| {
      Box::pin(async move {
        let session = ctx.cached("session").await;
        let name = session
          .as_ref()
          .and_then(|s| s.data["user_id"].as_str())
          .unwrap_or("guest")
          .to_string();
        Ok(
          DataSourceResponse::ok(serde_json::json!({
            "greeting": format!("Hello, {name}"),
            "persona": session.map(|s| s.data["persona"].clone()),
          }))
          .with_view_type("greeting_card"),
        )
      })
    }),
  )
  .route("/v1/user-summary", Method::Get)
  .preload(["session"])
}
