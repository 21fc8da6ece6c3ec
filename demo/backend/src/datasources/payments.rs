/* demo/backend/src/datasources/payments.rs */

use std::sync::Arc;

use quilt_server::context::RequestContext;
use quilt_server::datasource::{DataSource, DataSourceResponse, FilterFn, Method};
use quilt_server::errors::QuiltError;

/// Rejects anonymous traffic before the handler runs.
fn require_login() -> FilterFn {
  Arc::new(|ctx: RequestContext, _| {
    Box::pin(async move {
      if ctx.user.logged_in {
        Ok(())
      } else {
        Err(QuiltError::unauthorized("sign in to view payments"))
      }
    })
  })
}

pub fn payments() -> DataSource {
  DataSource::new(
    "payments",
    Arc::new(|ctx: RequestContext, _| {
      Box::pin(async move {
        let user_id = ctx.user.user_id.clone().unwrap_or_default();
        Ok(
          DataSourceResponse::ok(serde_json::json!({
            "user_id": user_id,
            "upcoming": [
              { "payee": "City Power", "amount_cents": 4250, "due": "2025-07-01" },
              { "payee": "Acme Broadband", "amount_cents": 5999, "due": "2025-07-03" },
            ],
          }))
          .with_view_type("payment_list"),
        )
      })
    }),
  )
  .route("/v1/payments", Method::Get)
  .filter(require_login())
  .authorize("payments", "read")
  .preload(["session"])
}
