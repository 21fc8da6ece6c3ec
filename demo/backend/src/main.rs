/* demo/backend/src/main.rs */

mod datasources;
mod pages;
mod telemetry;

use std::env;

use quilt_server::QuiltServer;
use quilt_server_axum::IntoQuiltRouter;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
    .with_target(false)
    .init();

  let port = env::var("PORT").unwrap_or_else(|_| "3000".to_string());
  let addr = format!("0.0.0.0:{port}");

  QuiltServer::new()
    .datasource(datasources::session())
    .datasource(datasources::user_summary())
    .datasource(datasources::offers())
    .datasource(datasources::payments())
    .datasource(datasources::activity_feed())
    .page_source(pages::demo_pages())
    .telemetry(telemetry::LogTelemetry)
    .serve(&addr)
    .await
}
