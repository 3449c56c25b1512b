//! Dashboard route handlers

pub mod facts;
pub mod health;
pub mod metrics;
pub mod nodes;
pub mod overview;
pub mod reports;

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use futures::Stream;
use puppetdb::PuppetDb;

use crate::core::config::DashboardConfig;
use crate::core::constants::STREAM_FLUSH_EVERY;
use crate::domain::chunked_flush;

/// Shared state for dashboard views
#[derive(Clone)]
pub struct DashboardState {
    pub puppetdb: Arc<PuppetDb>,
    pub config: Arc<DashboardConfig>,
}

/// Build dashboard routes
pub fn routes(puppetdb: Arc<PuppetDb>, config: DashboardConfig) -> Router<()> {
    let state = DashboardState {
        puppetdb,
        config: Arc::new(config),
    };

    Router::new()
        .route("/", get(overview::index))
        // Nodes
        .route("/nodes", get(nodes::list_default_env))
        .route("/{env}/nodes", get(nodes::list))
        .route("/node/{name}", get(nodes::detail))
        // Facts
        .route("/facts", get(facts::index))
        .route("/fact/{name}", get(facts::values))
        // Reports
        .route("/reports/{node}", get(reports::list))
        .route("/report/{node}/{hash}", get(reports::detail))
        // Metrics
        .route("/metrics", get(metrics::list))
        .route("/metric/{name}", get(metrics::detail))
        .with_state(state)
}

/// Stream an HTML page, writing a chunk every `STREAM_FLUSH_EVERY` fragments
pub(crate) fn stream_html<S>(fragments: S) -> Response
where
    S: Stream<Item = String> + Send + 'static,
{
    let body = Body::from_stream(chunked_flush(fragments, STREAM_FLUSH_EVERY));
    ([(header::CONTENT_TYPE, "text/html; charset=utf-8")], body).into_response()
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Arc;

    use axum::Router;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use httpmock::MockServer;
    use puppetdb::{ClientConfig, PuppetDb};
    use tower::ServiceExt;

    use crate::api::server::build_router;
    use crate::core::config::DashboardConfig;

    /// Router wired to a mock PuppetDB
    pub fn router(server: &MockServer, page_size: usize, dashboard: DashboardConfig) -> Router {
        let config = ClientConfig {
            host: server.host(),
            port: server.port(),
            page_size,
            ..ClientConfig::default()
        };
        let puppetdb = Arc::new(PuppetDb::new(&config).unwrap());
        build_router(puppetdb, dashboard)
    }

    pub fn dashboard() -> DashboardConfig {
        DashboardConfig {
            with_event_numbers: false,
            ..DashboardConfig::default()
        }
    }

    pub async fn get(router: Router, uri: &str) -> (StatusCode, String) {
        let response = router
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }
}
