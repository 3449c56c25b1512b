//! Fact views

use axum::extract::{Path, State};
use axum::response::{Html, Response};
use futures::{StreamExt, stream};

use super::{DashboardState, stream_html};
use crate::api::templates::{self, Layout};
use crate::api::types::ApiError;
use crate::domain::{YieldOrStop, group_by_initial, page_fragments};

/// `/facts`: every known fact name, grouped by initial
pub async fn index(State(state): State<DashboardState>) -> Result<Html<String>, ApiError> {
    let names = state
        .puppetdb
        .fact_names()
        .await
        .map_err(ApiError::from_puppetdb)?;
    let groups = group_by_initial(names);
    tracing::debug!(groups = groups.len(), "Fact index");

    Ok(Html(Layout::new("Facts").render(&templates::fact_index(&groups))))
}

/// `/fact/{name}`: value of one fact on every node
pub async fn values(
    State(state): State<DashboardState>,
    Path(name): Path<String>,
) -> Result<Response, ApiError> {
    let records = state
        .puppetdb
        .facts(Some(&name), None)
        .await
        .map_err(ApiError::from_puppetdb)?;

    // The header shows the node count, so the facts are read in full first
    let facts: Vec<_> = YieldOrStop::new(records).collect().await;

    let layout = Layout::new(name.as_str());
    let header = layout.header() + &templates::fact_table_open(facts.len());
    let footer = templates::table_close() + &layout.footer();

    Ok(stream_html(page_fragments(
        header,
        stream::iter(facts),
        templates::fact_row,
        footer,
    )))
}

#[cfg(test)]
mod tests {
    use httpmock::prelude::*;
    use serde_json::json;

    use super::super::test_support::{dashboard, get, router};

    #[tokio::test]
    async fn test_fact_index_groups_by_initial() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/pdb/query/v4/fact-names");
                then.status(200)
                    .json_body(json!(["bravo", "apple", "banana"]));
            })
            .await;

        let app = router(&server, 100, dashboard());
        let (status, body) = get(app, "/facts").await;

        assert_eq!(status, 200);
        let a = body.find("<h2>A</h2>").unwrap();
        let b = body.find("<h2>B</h2>").unwrap();
        assert!(a < b);
        let bravo = body.find(">bravo<").unwrap();
        let banana = body.find(">banana<").unwrap();
        assert!(b < bravo && bravo < banana);
    }

    #[tokio::test]
    async fn test_fact_values_streamed_with_count() {
        let server = MockServer::start_async().await;
        let rows: Vec<_> = (0..12)
            .map(|i| {
                json!({
                    "certname": format!("node{:02}.example.com", i),
                    "name": "osfamily",
                    "value": "RedHat",
                })
            })
            .collect();
        let mock = server
            .mock_async(|when, then| {
                when.method(GET).path("/pdb/query/v4/facts/osfamily");
                then.status(200).json_body(json!(rows));
            })
            .await;

        let app = router(&server, 100, dashboard());
        let (status, body) = get(app, "/fact/osfamily").await;

        assert_eq!(status, 200);
        mock.assert_async().await;
        assert!(body.contains("<p>12 nodes</p>"));
        assert!(body.contains("node11.example.com"));
        assert_eq!(body.matches("RedHat").count(), 12);
    }

    #[tokio::test]
    async fn test_fact_values_truncated_on_later_page_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/pdb/query/v4/facts/kernel")
                    .query_param("offset", "0");
                then.status(200).json_body(json!([
                    { "certname": "a.example.com", "name": "kernel", "value": "Linux" },
                ]));
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/pdb/query/v4/facts/kernel")
                    .query_param("offset", "1");
                then.status(503);
            })
            .await;

        let app = router(&server, 1, dashboard());
        let (status, body) = get(app, "/fact/kernel").await;

        assert_eq!(status, 200);
        assert!(body.contains("<p>1 nodes</p>"));
    }
}
