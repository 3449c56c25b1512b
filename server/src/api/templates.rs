//! HTML page fragments
//!
//! Pages are assembled from plain string fragments so that listings can be
//! streamed: [`Layout::header`], one fragment per record, [`Layout::footer`].
//! Every value taken from PuppetDB or the request goes through [`escape`].

use axum::http::StatusCode;
use puppetdb::{Event, Fact, Node, NodeStatus, Report};
use serde_json::Value;

use crate::core::constants::{ALL_ENVIRONMENTS, APP_NAME};
use crate::domain::StatusFilter;
use crate::utils::html::{encode_segment, escape};
use crate::utils::time::{NONE, format_duration, format_timestamp};

const NAV: &[(&str, &str)] = &[
    ("/", "Overview"),
    ("/nodes", "Nodes"),
    ("/facts", "Facts"),
    ("/metrics", "Metrics"),
];

/// Page chrome shared by every view
#[derive(Debug, Clone)]
pub struct Layout {
    title: String,
    /// Known environments and the selected one, for the environment switcher
    environments: Option<(Vec<String>, String)>,
}

impl Layout {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            environments: None,
        }
    }

    pub fn with_environments(mut self, envs: Vec<String>, current: &str) -> Self {
        self.environments = Some((envs, current.to_string()));
        self
    }

    pub fn header(&self) -> String {
        let mut out = format!(
            "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
             <title>{} - {}</title>\n\
             <link rel=\"stylesheet\" href=\"/static/puppetboard.css\">\n</head>\n<body>\n<nav>\n\
             <span class=\"brand\">{}</span>\n",
            escape(&self.title),
            APP_NAME,
            APP_NAME
        );
        for (href, label) in NAV {
            out.push_str(&format!("<a href=\"{}\">{}</a>\n", href, label));
        }
        if let Some((envs, current)) = &self.environments {
            out.push_str("<span class=\"environments\">");
            for env in std::iter::once(ALL_ENVIRONMENTS).chain(envs.iter().map(String::as_str)) {
                let class = if env == current { " class=\"active\"" } else { "" };
                out.push_str(&format!(
                    "<a{} href=\"/{}/nodes\">{}</a>",
                    class,
                    encode_segment(env),
                    escape(env)
                ));
            }
            out.push_str("</span>\n");
        }
        out.push_str(&format!(
            "</nav>\n<main>\n<h1>{}</h1>\n",
            escape(&self.title)
        ));
        out
    }

    pub fn footer(&self) -> String {
        "</main>\n</body>\n</html>\n".to_string()
    }

    /// Full page around an already rendered body
    pub fn render(&self, body: &str) -> String {
        format!("{}{}{}", self.header(), body, self.footer())
    }
}

pub fn error_page(status: StatusCode, message: &str) -> String {
    let title = format!(
        "{} {}",
        status.as_u16(),
        status.canonical_reason().unwrap_or("Error")
    );
    Layout::new(title).render(&format!("<p class=\"error\">{}</p>\n", escape(message)))
}

fn status_badge(status: Option<NodeStatus>) -> String {
    match status {
        Some(status) => format!(
            "<span class=\"status status-{}\">{}</span>",
            status.as_str(),
            status.as_str()
        ),
        None => NONE.to_string(),
    }
}

fn node_link(certname: &str) -> String {
    format!(
        "<a href=\"/node/{}\">{}</a>",
        encode_segment(certname),
        escape(certname)
    )
}

fn opt(value: Option<&str>) -> String {
    value.map(escape).unwrap_or_else(|| NONE.to_string())
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => escape(s),
        Value::Null => NONE.to_string(),
        other => escape(&other.to_string()),
    }
}

// =============================================================================
// Nodes
// =============================================================================

/// Status filter links and the opening of the node table
pub fn nodes_table_open(env: &str, status: Option<StatusFilter>) -> String {
    let mut out = String::from("<p class=\"filters\">");
    let base = format!("/{}/nodes", encode_segment(env));
    let all_class = if status.is_none() { " class=\"active\"" } else { "" };
    out.push_str(&format!("<a{} href=\"{}\">all</a>", all_class, base));
    for filter in [
        StatusFilter::Failed,
        StatusFilter::Changed,
        StatusFilter::Unchanged,
        StatusFilter::Unreported,
    ] {
        let class = if status == Some(filter) {
            " class=\"active\""
        } else {
            ""
        };
        out.push_str(&format!(
            " <a{} href=\"{}?status={}\">{}</a>",
            class,
            base,
            filter.as_str(),
            filter.as_str()
        ));
    }
    out.push_str("</p>\n<table class=\"nodes\">\n<thead><tr><th>Status</th><th>Node</th>\
                  <th>Environment</th><th>Last report</th><th>Events</th></tr></thead>\n<tbody>\n");
    out
}

pub fn node_row(node: Node) -> String {
    let events = match node.event_counts {
        Some(c) => format!(
            "<span class=\"failures\">{}</span> / <span class=\"successes\">{}</span> / \
             <span class=\"noops\">{}</span>",
            c.failures, c.successes, c.noops
        ),
        None => NONE.to_string(),
    };
    let last_report = match node.latest_report_hash.as_deref() {
        Some(hash) => format!(
            "<a href=\"/report/{}/{}\">{}</a>",
            encode_segment(&node.certname),
            encode_segment(hash),
            format_timestamp(node.report_timestamp)
        ),
        None => format_timestamp(node.report_timestamp),
    };
    format!(
        "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>\n",
        status_badge(node.status),
        node_link(&node.certname),
        opt(node.catalog_environment.as_deref()),
        last_report,
        events
    )
}

pub fn table_close() -> String {
    "</tbody>\n</table>\n".to_string()
}

pub fn node_detail(node: &Node, facts: &[Fact], reports: &[Report]) -> String {
    let mut out = format!(
        "<dl class=\"node\">\n\
         <dt>Status</dt><dd>{}</dd>\n\
         <dt>Catalog environment</dt><dd>{}</dd>\n\
         <dt>Facts environment</dt><dd>{}</dd>\n\
         <dt>Last report</dt><dd>{}</dd>\n\
         <dt>Catalog compiled</dt><dd>{}</dd>\n\
         <dt>Facts uploaded</dt><dd>{}</dd>\n</dl>\n",
        status_badge(node.status),
        opt(node.catalog_environment.as_deref()),
        opt(node.facts_environment.as_deref()),
        format_timestamp(node.report_timestamp),
        format_timestamp(node.catalog_timestamp),
        format_timestamp(node.facts_timestamp),
    );

    out.push_str(&format!(
        "<h2>Reports</h2>\n<p><a href=\"/reports/{}\">all reports</a></p>\n",
        encode_segment(&node.certname)
    ));
    out.push_str(&reports_table(reports));

    out.push_str("<h2>Facts</h2>\n<table class=\"facts\">\n<tbody>\n");
    for fact in facts {
        out.push_str(&format!(
            "<tr><td><a href=\"/fact/{}\">{}</a></td><td>{}</td></tr>\n",
            encode_segment(&fact.name),
            escape(&fact.name),
            value_text(&fact.value)
        ));
    }
    out.push_str(&table_close());
    out
}

// =============================================================================
// Reports
// =============================================================================

pub fn reports_table(reports: &[Report]) -> String {
    let mut out = String::from(
        "<table class=\"reports\">\n<thead><tr><th>Status</th><th>Received</th>\
         <th>Duration</th><th>Environment</th><th>Version</th></tr></thead>\n<tbody>\n",
    );
    for report in reports {
        out.push_str(&format!(
            "<tr><td><a href=\"/report/{}/{}\">{}</a></td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>\n",
            encode_segment(&report.certname),
            encode_segment(&report.hash),
            opt(report.status.as_deref()),
            format_timestamp(report.receive_time),
            format_duration(report.duration()),
            opt(report.environment.as_deref()),
            opt(report.configuration_version.as_deref()),
        ));
    }
    out.push_str(&table_close());
    out
}

pub fn report_detail(report: &Report, events: &[Event]) -> String {
    let mut out = format!(
        "<dl class=\"report\">\n\
         <dt>Node</dt><dd>{}</dd>\n\
         <dt>Status</dt><dd>{}</dd>\n\
         <dt>Started</dt><dd>{}</dd>\n\
         <dt>Duration</dt><dd>{}</dd>\n\
         <dt>Puppet</dt><dd>{}</dd>\n\
         <dt>Noop</dt><dd>{}</dd>\n</dl>\n",
        node_link(&report.certname),
        opt(report.status.as_deref()),
        format_timestamp(report.start_time),
        format_duration(report.duration()),
        opt(report.puppet_version.as_deref()),
        report.noop.map(|n| n.to_string()).as_deref().unwrap_or(NONE),
    );

    out.push_str(
        "<h2>Events</h2>\n<table class=\"events\">\n<thead><tr><th>Status</th><th>Resource</th>\
         <th>Property</th><th>From</th><th>To</th><th>Message</th></tr></thead>\n<tbody>\n",
    );
    for event in events {
        out.push_str(&format!(
            "<tr class=\"event-{}\"><td>{}</td><td>{}[{}]</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>\n",
            escape(&event.status),
            escape(&event.status),
            escape(&event.resource_type),
            escape(&event.resource_title),
            opt(event.property.as_deref()),
            value_text(&event.old_value),
            value_text(&event.new_value),
            opt(event.message.as_deref()),
        ));
    }
    out.push_str(&table_close());
    out
}

// =============================================================================
// Facts
// =============================================================================

pub fn fact_index(groups: &[(String, Vec<String>)]) -> String {
    let mut out = String::from("<div class=\"fact-index\">\n");
    for (letter, names) in groups {
        out.push_str(&format!("<h2>{}</h2>\n<ul>\n", escape(letter)));
        for name in names {
            out.push_str(&format!(
                "<li><a href=\"/fact/{}\">{}</a></li>\n",
                encode_segment(name),
                escape(name)
            ));
        }
        out.push_str("</ul>\n");
    }
    out.push_str("</div>\n");
    out
}

pub fn fact_table_open(count: usize) -> String {
    format!(
        "<p>{} nodes</p>\n<table class=\"fact\">\n<thead><tr><th>Node</th><th>Value</th></tr></thead>\n<tbody>\n",
        count
    )
}

pub fn fact_row(fact: Fact) -> String {
    format!(
        "<tr><td>{}</td><td>{}</td></tr>\n",
        node_link(&fact.certname),
        value_text(&fact.value)
    )
}

// =============================================================================
// Metrics
// =============================================================================

/// Headline numbers of the overview page
#[derive(Debug, Clone)]
pub struct Overview {
    pub num_nodes: String,
    pub num_resources: String,
    pub avg_resources_node: String,
    pub mean_failed_commands: String,
    pub mean_command_time: String,
}

pub fn overview(data: &Overview) -> String {
    let mut out = String::from("<div class=\"metrics\">\n");
    for (label, value) in [
        ("Nodes", &data.num_nodes),
        ("Resources", &data.num_resources),
        ("Avg. resources/node", &data.avg_resources_node),
        ("Failed commands (mean rate)", &data.mean_failed_commands),
        ("Command processing (mean rate)", &data.mean_command_time),
    ] {
        out.push_str(&format!(
            "<div class=\"metric\"><span class=\"value\">{}</span><span class=\"label\">{}</span></div>\n",
            escape(value),
            label
        ));
    }
    out.push_str("</div>\n<p><a href=\"/metrics\">all metrics</a></p>\n");
    out
}

pub fn metric_index(names: &[String]) -> String {
    let mut out = String::from("<ul class=\"metrics\">\n");
    for name in names {
        out.push_str(&format!(
            "<li><a href=\"/metric/{}\">{}</a></li>\n",
            encode_segment(name),
            escape(name)
        ));
    }
    out.push_str("</ul>\n");
    out
}

pub fn metric_detail(attributes: &[(String, Value)]) -> String {
    let mut out = String::from("<table class=\"metric\">\n<tbody>\n");
    for (key, value) in attributes {
        out.push_str(&format!(
            "<tr><td>{}</td><td>{}</td></tr>\n",
            escape(key),
            value_text(value)
        ));
    }
    out.push_str(&table_close());
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(json: serde_json::Value) -> Node {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn test_layout_environment_switcher() {
        let html = Layout::new("Nodes")
            .with_environments(vec!["production".to_string()], "production")
            .header();
        assert!(html.contains("<a href=\"/*/nodes\">*</a>"));
        assert!(html.contains("<a class=\"active\" href=\"/production/nodes\">production</a>"));
    }

    #[test]
    fn test_node_row_escapes_values() {
        let mut n = node(serde_json::json!({
            "certname": "<script>",
            "catalog_environment": "prod",
        }));
        n.status = Some(NodeStatus::Unreported);
        let row = node_row(n);
        assert!(row.contains("&lt;script&gt;"));
        assert!(!row.contains("<script>"));
        assert!(row.contains("status-unreported"));
    }

    #[test]
    fn test_nodes_table_open_marks_active_filter() {
        let html = nodes_table_open("*", Some(StatusFilter::Failed));
        assert!(html.contains("<a class=\"active\" href=\"/*/nodes?status=failed\">failed</a>"));
        assert!(html.contains("<a href=\"/*/nodes\">all</a>"));
    }

    #[test]
    fn test_error_page_title() {
        let html = error_page(StatusCode::NOT_FOUND, "missing");
        assert!(html.contains("<h1>404 Not Found</h1>"));
        assert!(html.contains("missing"));
    }
}
