/* demo/backend/src/datasources/session.rs */

use std::sync::Arc;
use std::time::Duration;

use quilt_server::context::RequestContext;
use quilt_server::datasource::{DataSource, DataSourceResponse};

/// Session context preloaded once per request and read by the widgets
/// below it through the shared cache.
pub fn session() -> DataSource {
  DataSource::new(
    "session",
    Arc::new(|ctx: RequestContext, _| {
      Box::pin(async move {
        let user_id = ctx.user.user_id.clone().unwrap_or_else(|| "guest".to_string());
        Ok(DataSourceResponse::ok(serde_json::json!({
          "user_id": user_id,
          "persona": ctx.user.persona,
          "logged_in": ctx.user.logged_in,
        })))
      })
    }),
  )
  .timeout(Duration::from_millis(150))
}
