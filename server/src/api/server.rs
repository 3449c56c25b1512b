//! API server initialization

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use axum::Router;
use axum::routing::get;
use puppetdb::PuppetDb;
use tokio::net::TcpListener;
use tower_http::compression::CompressionLayer;
use tower_http::compression::predicate::{DefaultPredicate, NotForContentType, Predicate};
use tower_http::trace::TraceLayer;

use super::embedded;
use super::middleware;
use super::routes::{self, health};
use crate::core::CoreApp;
use crate::core::config::DashboardConfig;

pub struct ApiServer {
    app: CoreApp,
}

impl ApiServer {
    pub fn new(app: CoreApp) -> Self {
        Self { app }
    }

    /// Serve until the shutdown signal fires and in-flight responses drain
    pub async fn start(self) -> Result<()> {
        let app = self.app;
        let shutdown = app.shutdown.clone();

        let addr = SocketAddr::new(app.config.server.host.parse()?, app.config.server.port);
        let router = build_router(app.puppetdb.clone(), app.config.dashboard.clone());

        let listener = TcpListener::bind(addr).await?;
        tracing::debug!(%addr, "Listening");
        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown.wait())
            .await?;

        Ok(())
    }
}

/// Assemble dashboard pages, health check and static assets
pub fn build_router(puppetdb: Arc<PuppetDb>, dashboard: DashboardConfig) -> Router {
    let static_routes = Router::new().fallback(embedded::serve_static);

    // Streamed pages must reach the client chunk by chunk, so HTML is left uncompressed
    let compress = DefaultPredicate::new().and(NotForContentType::const_new("text/html"));

    routes::routes(puppetdb, dashboard)
        .route("/health", get(health::health))
        .nest("/static", static_routes)
        .fallback(middleware::handle_404)
        .layer(CompressionLayer::new().compress_when(compress))
        .layer(TraceLayer::new_for_http())
}
