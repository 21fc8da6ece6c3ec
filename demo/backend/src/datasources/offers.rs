/* demo/backend/src/datasources/offers.rs */

use std::sync::Arc;

use quilt_server::datasource::{DataSource, DataSourceResponse, Method};
use serde::Serialize;

#[derive(Serialize)]
struct Offer {
  id: u32,
  title: &'static str,
  discount_pct: u8,
}

const OFFERS: &[Offer] = &[
  Offer { id: 1, title: "Cashback on groceries", discount_pct: 5 },
  Offer { id: 2, title: "Movie night special", discount_pct: 20 },
  Offer { id: 3, title: "Free delivery weekend", discount_pct: 100 },
];

pub fn offers() -> DataSource {
  DataSource::new(
    "offers",
    Arc::new(|_, _| {
      Box::pin(async {
        Ok(
          DataSourceResponse::ok(serde_json::json!({ "offers": OFFERS }))
            .with_view_type("carousel"),
        )
      })
    }),
  )
  .route("/v1/offers", Method::Get)
}
