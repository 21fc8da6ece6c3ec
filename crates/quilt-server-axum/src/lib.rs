/* crates/quilt-server-axum/src/lib.rs */

mod error;
mod handler;

use quilt_server::server::QuiltServer;

/// Re-export quilt-server core for convenience
pub use quilt_server;

/// Extension trait that converts a `QuiltServer` into an Axum router.
pub trait IntoQuiltRouter {
  fn into_axum_router(self) -> axum::Router;
  fn serve(
    self,
    addr: &str,
  ) -> impl std::future::Future<Output = Result<(), Box<dyn std::error::Error>>> + Send;
}

impl IntoQuiltRouter for QuiltServer {
  fn into_axum_router(self) -> axum::Router {
    handler::build_router(self.into_parts())
  }

  async fn serve(self, addr: &str) -> Result<(), Box<dyn std::error::Error>> {
    let router = self.into_axum_router();
    let listener = tokio::net::TcpListener::bind(addr).await?;
    let local_addr = listener.local_addr()?;
    tracing::info!("quilt backend listening on http://localhost:{}", local_addr.port());
    axum::serve(listener, router).await?;
    Ok(())
  }
}
