use tokio::net::TcpListener;

use crate::config::ServerConfig;
use crate::error::ServerResult;
use crate::router::build_router;
use crate::state::AppState;

/// Trellis resolution server.
pub struct TrellisServer {
    config: ServerConfig,
}

impl TrellisServer {
    pub fn new(config: ServerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Build the router (useful for testing).
    pub fn router(&self) -> axum::Router {
        build_router(AppState::new(&self.config))
    }

    /// Start serving requests.
    pub async fn serve(self) -> ServerResult<()> {
        let app = self.router();
        let listener = TcpListener::bind(&self.config.bind_addr).await?;
        tracing::info!(
            "trellis server listening on {} (data in {})",
            self.config.bind_addr,
            self.config.graph_dir().display()
        );
        axum::serve(listener, app).await?;
        Ok(())
    }
}
