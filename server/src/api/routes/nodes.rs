//! Node listing and node detail views

use axum::extract::{Path, Query, State};
use axum::response::{Html, Response};
use chrono::Utc;
use futures::{StreamExt, future};
use puppetdb::{NodeOptions, Query as PdbQuery};
use serde::Deserialize;

use super::{DashboardState, stream_html};
use crate::api::templates::{self, Layout};
use crate::api::types::ApiError;
use crate::core::constants::ALL_ENVIRONMENTS;
use crate::domain::{FilterCriteria, YieldOrStop, page_fragments};

#[derive(Debug, Default, Deserialize)]
pub struct ListNodesQuery {
    pub status: Option<String>,
}

impl DashboardState {
    pub(crate) fn node_options(&self) -> NodeOptions {
        NodeOptions {
            unreported_hours: self.config.unresponsive_hours,
            with_status: true,
            with_event_counts: self.config.with_event_numbers,
        }
    }

    /// Known environments; fails with 404 unless `env` is `*` or one of them
    pub(crate) async fn check_env(&self, env: &str) -> Result<Vec<String>, ApiError> {
        let envs = self
            .puppetdb
            .environments()
            .await
            .map_err(ApiError::from_puppetdb)?;
        if env != ALL_ENVIRONMENTS && !envs.iter().any(|e| e == env) {
            tracing::debug!(env, "Unknown environment requested");
            return Err(ApiError::not_found(format!("Unknown environment: {}", env)));
        }
        Ok(envs)
    }
}

/// `/nodes`, listing the configured default environment
pub async fn list_default_env(
    State(state): State<DashboardState>,
    Query(query): Query<ListNodesQuery>,
) -> Result<Response, ApiError> {
    let env = state.config.default_environment.clone();
    stream_nodes(state, env, query).await
}

/// `/{env}/nodes`
pub async fn list(
    State(state): State<DashboardState>,
    Path(env): Path<String>,
    Query(query): Query<ListNodesQuery>,
) -> Result<Response, ApiError> {
    stream_nodes(state, env, query).await
}

/// Stream the node table.
///
/// Everything up to the first page of nodes happens before the response
/// starts, so those failures become error pages. Later failures end the
/// table early.
async fn stream_nodes(
    state: DashboardState,
    env: String,
    query: ListNodesQuery,
) -> Result<Response, ApiError> {
    let envs = state.check_env(&env).await?;

    let criteria = FilterCriteria::new(env.as_str(), query.status.as_deref());
    let pdb_query = criteria.to_query(state.config.unresponsive_hours, Utc::now());
    tracing::debug!(
        env = %env,
        status = ?criteria.status,
        query = ?pdb_query,
        "Listing nodes"
    );

    let records = state
        .puppetdb
        .nodes(pdb_query.as_ref(), state.node_options())
        .await
        .map_err(ApiError::from_puppetdb)?;

    let status = criteria.status;
    let nodes =
        YieldOrStop::new(records).filter(move |node| future::ready(criteria.matches(node)));

    let layout = Layout::new("Nodes").with_environments(envs, &env);
    let header = layout.header() + &templates::nodes_table_open(&env, status);
    let footer = templates::table_close() + &layout.footer();

    Ok(stream_html(page_fragments(
        header,
        nodes,
        templates::node_row,
        footer,
    )))
}

/// `/node/{name}`: node record with its facts and latest reports
pub async fn detail(
    State(state): State<DashboardState>,
    Path(name): Path<String>,
) -> Result<Html<String>, ApiError> {
    let node = state
        .puppetdb
        .node(&name, state.node_options())
        .await
        .map_err(ApiError::from_puppetdb)?;

    let by_certname = PdbQuery::equals("certname", name.as_str());
    let (facts, reports) = tokio::try_join!(
        state.puppetdb.facts(None, Some(&by_certname)),
        state
            .puppetdb
            .latest_reports(Some(&by_certname), state.config.reports_count),
    )
    .map_err(ApiError::from_puppetdb)?;

    let facts: Vec<_> = YieldOrStop::new(facts).collect().await;

    let body = templates::node_detail(&node, &facts, &reports);
    Ok(Html(Layout::new(node.certname.as_str()).render(&body)))
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, SecondsFormat};
    use httpmock::prelude::*;
    use serde_json::json;

    use super::super::test_support::{dashboard, get, router};
    use crate::core::config::DashboardConfig;

    fn ts(hours_ago: i64) -> String {
        (chrono::Utc::now() - Duration::hours(hours_ago)).to_rfc3339_opts(SecondsFormat::Secs, true)
    }

    async fn mock_environments(server: &MockServer, names: &[&str]) {
        let rows: Vec<_> = names.iter().map(|n| json!({ "name": n })).collect();
        server.mock_async(|when, then| {
            when.method(GET).path("/pdb/query/v4/environments");
            then.status(200).json_body(json!(rows));
        }).await;
    }

    fn position(body: &str, needle: &str) -> usize {
        body.find(needle)
            .unwrap_or_else(|| panic!("{} not in body", needle))
    }

    #[tokio::test]
    async fn test_unreported_nodes_in_environment() {
        let server = MockServer::start_async().await;
        mock_environments(&server, &["env1"]).await;
        let nodes = server.mock_async(|when, then| {
            when.method(GET)
                .path("/pdb/query/v4/nodes")
                .query_param_includes("query", "\"catalog_environment\",\"env1\"")
                .query_param_includes("query", "[\"null?\",\"report_timestamp\",true]");
            then.status(200).json_body(json!([
                { "certname": "never.example.com", "catalog_environment": "env1",
                  "report_timestamp": null },
                { "certname": "stale.example.com", "catalog_environment": "env1",
                  "report_timestamp": ts(3), "latest_report_status": "unchanged" },
                { "certname": "fresh.example.com", "catalog_environment": "env1",
                  "report_timestamp": ts(1), "latest_report_status": "unchanged" },
            ]));
        }).await;

        let app = router(&server, 100, dashboard());
        let (status, body) = get(app, "/env1/nodes?status=unreported").await;

        assert_eq!(status, 200);
        nodes.assert_async().await;
        assert!(position(&body, "never.example.com") < position(&body, "stale.example.com"));
        assert!(!body.contains("fresh.example.com"));
    }

    #[tokio::test]
    async fn test_unrecognized_status_lists_everything() {
        let server = MockServer::start_async().await;
        mock_environments(&server, &[]).await;
        let nodes = server.mock_async(|when, then| {
            when.method(GET)
                .path("/pdb/query/v4/nodes")
                .query_param_missing("query");
            then.status(200).json_body(json!([
                { "certname": "a.example.com", "report_timestamp": ts(1),
                  "latest_report_status": "failed" },
                { "certname": "b.example.com", "report_timestamp": ts(1),
                  "latest_report_status": "changed" },
            ]));
        }).await;

        let app = router(&server, 100, dashboard());
        let (status, body) = get(app, "/nodes?status=bogus").await;

        assert_eq!(status, 200);
        nodes.assert_async().await;
        assert!(body.contains("a.example.com"));
        assert!(body.contains("b.example.com"));
    }

    #[tokio::test]
    async fn test_status_filter_applied_locally() {
        let server = MockServer::start_async().await;
        mock_environments(&server, &[]).await;
        server.mock_async(|when, then| {
            when.method(GET)
                .path("/pdb/query/v4/nodes")
                .query_param_includes("query", "[\"=\",\"latest_report_status\",\"failed\"]");
            // Stale entry: PuppetDB still reports it but it is now unreported
            then.status(200).json_body(json!([
                { "certname": "a.example.com", "report_timestamp": ts(1),
                  "latest_report_status": "failed" },
                { "certname": "old.example.com", "report_timestamp": ts(5),
                  "latest_report_status": "failed" },
                { "certname": "c.example.com", "report_timestamp": ts(1),
                  "latest_report_status": "failed" },
            ]));
        }).await;

        let app = router(&server, 100, dashboard());
        let (status, body) = get(app, "/*/nodes?status=failed").await;

        assert_eq!(status, 200);
        assert!(position(&body, "a.example.com") < position(&body, "c.example.com"));
        assert!(!body.contains("old.example.com"));
    }

    #[tokio::test]
    async fn test_mid_stream_failure_truncates_listing() {
        let server = MockServer::start_async().await;
        mock_environments(&server, &[]).await;
        server.mock_async(|when, then| {
            when.method(GET)
                .path("/pdb/query/v4/nodes")
                .query_param("offset", "0");
            then.status(200).json_body(json!([
                { "certname": "page1-a.example.com", "report_timestamp": ts(1) },
                { "certname": "page1-b.example.com", "report_timestamp": ts(1) },
            ]));
        }).await;
        let second = server.mock_async(|when, then| {
            when.method(GET)
                .path("/pdb/query/v4/nodes")
                .query_param("offset", "2");
            then.status(500).body("connection pool exhausted");
        }).await;

        let app = router(&server, 2, dashboard());
        let (status, body) = get(app, "/nodes").await;

        assert_eq!(status, 200);
        second.assert_async().await;
        assert!(body.contains("page1-a.example.com"));
        assert!(body.contains("page1-b.example.com"));
        assert!(body.ends_with("</html>\n"));
        assert!(!body.contains("PuppetDB request failed"));
    }

    #[tokio::test]
    async fn test_first_page_failure_is_error_page() {
        let server = MockServer::start_async().await;
        mock_environments(&server, &[]).await;
        server.mock_async(|when, then| {
            when.method(GET).path("/pdb/query/v4/nodes");
            then.status(400).body("query parse error");
        }).await;

        let app = router(&server, 100, dashboard());
        let (status, _) = get(app, "/nodes").await;
        assert_eq!(status, 400);
    }

    #[tokio::test]
    async fn test_unknown_environment_is_404() {
        let server = MockServer::start_async().await;
        mock_environments(&server, &["production"]).await;
        let nodes = server.mock_async(|when, then| {
            when.method(GET).path("/pdb/query/v4/nodes");
            then.status(200).json_body(json!([]));
        }).await;

        let app = router(&server, 100, dashboard());
        let (status, _) = get(app, "/staging/nodes").await;

        assert_eq!(status, 404);
        assert_eq!(nodes.hits_async().await, 0);
    }

    #[tokio::test]
    async fn test_default_environment_from_config() {
        let server = MockServer::start_async().await;
        mock_environments(&server, &["production"]).await;
        let nodes = server.mock_async(|when, then| {
            when.method(GET)
                .path("/pdb/query/v4/nodes")
                .query_param_includes("query", "[\"=\",\"catalog_environment\",\"production\"]");
            then.status(200).json_body(json!([]));
        }).await;

        let config = DashboardConfig {
            default_environment: "production".to_string(),
            ..dashboard()
        };
        let app = router(&server, 100, config);
        let (status, _) = get(app, "/nodes").await;

        assert_eq!(status, 200);
        nodes.assert_async().await;
    }

    #[tokio::test]
    async fn test_event_counts_refine_status() {
        let server = MockServer::start_async().await;
        mock_environments(&server, &[]).await;
        server.mock_async(|when, then| {
            when.method(GET).path("/pdb/query/v4/event-counts");
            then.status(200).json_body(json!([
                { "subject_type": "certname", "subject": { "title": "a.example.com" },
                  "failures": 0, "successes": 0, "noops": 3, "skips": 0 },
            ]));
        }).await;
        server.mock_async(|when, then| {
            when.method(GET).path("/pdb/query/v4/nodes");
            then.status(200).json_body(json!([
                { "certname": "a.example.com", "report_timestamp": ts(1),
                  "latest_report_status": "unchanged" },
            ]));
        }).await;

        let config = DashboardConfig {
            with_event_numbers: true,
            ..dashboard()
        };
        let app = router(&server, 100, config);
        let (status, body) = get(app, "/nodes").await;

        assert_eq!(status, 200);
        assert!(body.contains("status-noop"));
    }

    #[tokio::test]
    async fn test_node_detail() {
        let server = MockServer::start_async().await;
        server.mock_async(|when, then| {
            when.method(GET).path("/pdb/query/v4/nodes/web01.example.com");
            then.status(200).json_body(json!({
                "certname": "web01.example.com",
                "catalog_environment": "production",
                "report_timestamp": ts(1),
                "latest_report_status": "changed",
            }));
        }).await;
        server.mock_async(|when, then| {
            when.method(GET).path("/pdb/query/v4/facts");
            then.status(200).json_body(json!([
                { "certname": "web01.example.com", "name": "osfamily", "value": "Debian" },
            ]));
        }).await;
        let reports = (0..10)
            .map(|i| json!({ "certname": "web01.example.com", "hash": format!("hash{:02}", i) }))
            .collect::<Vec<_>>();
        let reports_mock = server.mock_async(|when, then| {
            when.method(GET)
                .path("/pdb/query/v4/reports")
                .query_param("query", r#"["=","certname","web01.example.com"]"#)
                .query_param("limit", "10");
            then.status(200).json_body(json!(reports));
        }).await;

        let app = router(&server, 100, dashboard());
        let (status, body) = get(app, "/node/web01.example.com").await;

        assert_eq!(status, 200);
        assert!(body.contains("status-changed"));
        assert!(body.contains("Debian"));
        reports_mock.assert_async().await;
        assert!(body.contains("hash00"));
        assert!(body.contains("hash09"));
    }

    #[tokio::test]
    async fn test_node_detail_missing_node_is_404() {
        let server = MockServer::start_async().await;
        server.mock_async(|when, then| {
            when.method(GET).path("/pdb/query/v4/nodes/ghost.example.com");
            then.status(404).json_body(json!({ "error": "No information is known about node ghost.example.com" }));
        }).await;

        let app = router(&server, 100, dashboard());
        let (status, body) = get(app, "/node/ghost.example.com").await;

        assert_eq!(status, 404);
        assert!(body.contains("404 Not Found"));
    }
}
