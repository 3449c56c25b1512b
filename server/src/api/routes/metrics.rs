//! PuppetDB metrics views

use axum::extract::{Path, State};
use axum::response::Html;

use super::DashboardState;
use crate::api::templates::{self, Layout};
use crate::api::types::ApiError;

/// `/metrics`: names of all metric mbeans
pub async fn list(State(state): State<DashboardState>) -> Result<Html<String>, ApiError> {
    let mbeans = state
        .puppetdb
        .metrics()
        .await
        .map_err(ApiError::from_puppetdb)?;

    let mut names: Vec<String> = mbeans.into_iter().map(|(name, _)| name).collect();
    names.sort();

    Ok(Html(
        Layout::new("Metrics").render(&templates::metric_index(&names)),
    ))
}

/// `/metric/{name}`: attributes of one mbean, sorted by key
pub async fn detail(
    State(state): State<DashboardState>,
    Path(name): Path<String>,
) -> Result<Html<String>, ApiError> {
    let metric = state
        .puppetdb
        .metric(&name)
        .await
        .map_err(ApiError::from_puppetdb)?;

    let mut attributes: Vec<_> = metric.into_iter().collect();
    attributes.sort_by(|a, b| a.0.cmp(&b.0));

    Ok(Html(
        Layout::new(name.as_str()).render(&templates::metric_detail(&attributes)),
    ))
}

#[cfg(test)]
mod tests {
    use httpmock::prelude::*;
    use serde_json::json;

    use super::super::test_support::{dashboard, get, router};

    #[tokio::test]
    async fn test_metric_list_sorted() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/metrics/v1/mbeans");
                then.status(200).json_body(json!({
                    "java.lang:type=Memory": "/metrics/v1/mbeans/java.lang:type=Memory",
                    "amq.broker:name=queue": "/metrics/v1/mbeans/amq.broker:name=queue",
                }));
            })
            .await;

        let app = router(&server, 100, dashboard());
        let (status, body) = get(app, "/metrics").await;

        assert_eq!(status, 200);
        let amq = body.find(">amq.broker:name=queue<").unwrap();
        let java = body.find(">java.lang:type=Memory<").unwrap();
        assert!(amq < java);
    }

    #[tokio::test]
    async fn test_metric_detail_sorted_by_key() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/metrics/v1/mbeans/puppetlabs.puppetdb.mq:name=global.fatal");
                then.status(200).json_body(json!({
                    "OneMinuteRate": 0.0,
                    "Count": 4,
                    "MeanRate": 0.002,
                }));
            })
            .await;

        let app = router(&server, 100, dashboard());
        let (status, body) =
            get(app, "/metric/puppetlabs.puppetdb.mq:name=global.fatal").await;

        assert_eq!(status, 200);
        let count = body.find(">Count<").unwrap();
        let mean = body.find(">MeanRate<").unwrap();
        let one = body.find(">OneMinuteRate<").unwrap();
        assert!(count < mean && mean < one);
    }

    #[tokio::test]
    async fn test_unknown_metric_is_404() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/metrics/v1/mbeans/nope");
                then.status(404);
            })
            .await;

        let app = router(&server, 100, dashboard());
        let (status, _) = get(app, "/metric/nope").await;
        assert_eq!(status, 404);
    }
}
