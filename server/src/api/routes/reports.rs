//! Report views

use axum::extract::{Path, State};
use axum::response::Html;
use futures::StreamExt;
use puppetdb::Query;

use super::DashboardState;
use crate::api::templates::{self, Layout};
use crate::api::types::ApiError;
use crate::domain::YieldOrStop;

/// `/reports/{node}`: the node's latest reports
pub async fn list(
    State(state): State<DashboardState>,
    Path(node): Path<String>,
) -> Result<Html<String>, ApiError> {
    let query = Query::equals("certname", node.as_str());
    let reports = state
        .puppetdb
        .latest_reports(Some(&query), state.config.reports_count)
        .await
        .map_err(ApiError::from_puppetdb)?;

    let layout = Layout::new(format!("Reports of {}", node));
    Ok(Html(layout.render(&templates::reports_table(&reports))))
}

/// `/report/{node}/{hash}`: one report and its events
pub async fn detail(
    State(state): State<DashboardState>,
    Path((node, hash)): Path<(String, String)>,
) -> Result<Html<String>, ApiError> {
    let query = Query::And(vec![
        Query::equals("certname", node.as_str()),
        Query::equals("hash", hash.as_str()),
    ]);
    let mut reports = state
        .puppetdb
        .reports(Some(&query))
        .await
        .map_err(ApiError::from_puppetdb)?;

    let report = match reports.next().await {
        Some(Ok(report)) => report,
        Some(Err(e)) => return Err(ApiError::from_puppetdb(e)),
        None => {
            tracing::debug!(node = %node, hash = %hash, "Report not found");
            return Err(ApiError::not_found(format!(
                "No report {} for node {}",
                hash, node
            )));
        }
    };

    let records = state
        .puppetdb
        .events(Some(&Query::equals("report", report.hash.as_str())))
        .await
        .map_err(ApiError::from_puppetdb)?;
    let events: Vec<_> = YieldOrStop::new(records).collect().await;

    let layout = Layout::new(format!("Report {}", report.hash));
    Ok(Html(layout.render(&templates::report_detail(&report, &events))))
}

#[cfg(test)]
mod tests {
    use httpmock::prelude::*;
    use serde_json::json;

    use super::super::test_support::{dashboard, get, router};
    use crate::core::config::DashboardConfig;

    #[tokio::test]
    async fn test_reports_limited_to_count() {
        let server = MockServer::start_async().await;
        let rows: Vec<_> = (0..3)
            .map(|i| json!({ "certname": "db01", "hash": format!("r{}", i), "status": "unchanged" }))
            .collect();
        let reports_mock = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/pdb/query/v4/reports")
                    .query_param("query", r#"["=","certname","db01"]"#)
                    .query_param("limit", "3");
                then.status(200).json_body(json!(rows));
            })
            .await;

        let config = DashboardConfig {
            reports_count: 3,
            ..dashboard()
        };
        let app = router(&server, 100, config);
        let (status, body) = get(app, "/reports/db01").await;

        assert_eq!(status, 200);
        reports_mock.assert_async().await;
        assert!(body.contains("/report/db01/r0"));
        assert!(body.contains("/report/db01/r2"));
    }

    #[tokio::test]
    async fn test_report_detail_with_events() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/pdb/query/v4/reports")
                    .query_param(
                        "query",
                        r#"["and",["=","certname","db01"],["=","hash","abc123"]]"#,
                    );
                then.status(200).json_body(json!([
                    { "certname": "db01", "hash": "abc123", "status": "changed",
                      "puppet_version": "8.4.0" },
                ]));
            })
            .await;
        let events = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/pdb/query/v4/events")
                    .query_param("query", r#"["=","report","abc123"]"#);
                then.status(200).json_body(json!([
                    { "certname": "db01", "report": "abc123", "status": "success",
                      "resource_type": "Package", "resource_title": "postgresql",
                      "property": "ensure", "old_value": "absent", "new_value": "16.1" },
                ]));
            })
            .await;

        let app = router(&server, 100, dashboard());
        let (status, body) = get(app, "/report/db01/abc123").await;

        assert_eq!(status, 200);
        events.assert_async().await;
        assert!(body.contains("Package[postgresql]"));
        assert!(body.contains("8.4.0"));
    }

    #[tokio::test]
    async fn test_report_detail_unknown_hash_is_404() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/pdb/query/v4/reports");
                then.status(200).json_body(json!([]));
            })
            .await;
        let events = server
            .mock_async(|when, then| {
                when.method(GET).path("/pdb/query/v4/events");
                then.status(200).json_body(json!([]));
            })
            .await;

        let app = router(&server, 100, dashboard());
        let (status, _) = get(app, "/report/db01/missing").await;

        assert_eq!(status, 404);
        assert_eq!(events.hits_async().await, 0);
    }
}
