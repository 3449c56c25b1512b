//! PuppetDB HTTP client

use std::collections::HashMap;
use std::time::Duration;

use chrono::Utc;
use reqwest::{StatusCode, Url};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value, json};

use crate::error::Error;
use crate::query::Query;
use crate::stream::RecordStream;
use crate::types::{EnvironmentRow, Event, EventCountRow, EventCounts, Fact, Node, Report};

const QUERY_PREFIX: &[&str] = &["pdb", "query", "v4"];
const METRICS_PREFIX: &[&str] = &["metrics", "v1", "mbeans"];

/// Connection settings for [`PuppetDb`]
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub host: String,
    pub port: u16,
    /// Use https instead of http
    pub ssl: bool,
    /// Verify the server certificate (https only)
    pub ssl_verify: bool,
    pub timeout: Duration,
    /// Records requested per page when streaming listings
    pub page_size: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 8080,
            ssl: false,
            ssl_verify: true,
            timeout: Duration::from_secs(20),
            page_size: 1000,
        }
    }
}

impl ClientConfig {
    pub fn base_url(&self) -> String {
        let scheme = if self.ssl { "https" } else { "http" };
        format!("{}://{}:{}", scheme, self.host, self.port)
    }
}

/// Options applied to node listings
#[derive(Debug, Clone, Copy)]
pub struct NodeOptions {
    /// Hours without a report after which a node counts as unreported
    pub unreported_hours: u32,
    /// Derive [`Node::status`] for every node
    pub with_status: bool,
    /// Attach event counts of the latest report (requires `with_status`)
    pub with_event_counts: bool,
}

impl Default for NodeOptions {
    fn default() -> Self {
        Self {
            unreported_hours: 2,
            with_status: false,
            with_event_counts: false,
        }
    }
}

/// Sort key sent with paged requests so `offset` is stable between pages
struct OrderBy(&'static [(&'static str, &'static str)]);

impl OrderBy {
    const NODES: Self = Self(&[("certname", "asc")]);
    const FACTS: Self = Self(&[("certname", "asc"), ("name", "asc")]);
    const REPORTS: Self = Self(&[("receive_time", "desc")]);
    const EVENTS: Self = Self(&[("timestamp", "asc"), ("resource_type", "asc")]);

    fn to_param(&self) -> String {
        let fields: Vec<Value> = self
            .0
            .iter()
            .map(|(field, order)| json!({ "field": field, "order": order }))
            .collect();
        Value::Array(fields).to_string()
    }
}

/// Read-only PuppetDB client.
///
/// Cheap to clone; clones share the underlying connection pool.
#[derive(Debug, Clone)]
pub struct PuppetDb {
    http: reqwest::Client,
    base_url: Url,
    page_size: usize,
}

impl PuppetDb {
    pub fn new(config: &ClientConfig) -> Result<Self, Error> {
        if config.page_size == 0 {
            return Err(Error::Config("page_size must be greater than 0".to_string()));
        }

        let base_url = Url::parse(&config.base_url())
            .map_err(|e| Error::Config(format!("invalid PuppetDB address: {}", e)))?;

        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(format!("puppetdb-rs/{}", env!("CARGO_PKG_VERSION")))
            .danger_accept_invalid_certs(config.ssl && !config.ssl_verify)
            .build()
            .map_err(|e| Error::Config(format!("failed to build HTTP client: {}", e)))?;

        tracing::debug!(
            url = %base_url,
            page_size = config.page_size,
            "PuppetDB client initialized"
        );

        Ok(Self {
            http,
            base_url,
            page_size: config.page_size,
        })
    }

    /// Stream nodes matching `query` (`None` matches all active nodes)
    pub async fn nodes(
        &self,
        query: Option<&Query>,
        options: NodeOptions,
    ) -> Result<RecordStream<Node>, Error> {
        let counts = if options.with_status && options.with_event_counts {
            Some(self.latest_event_counts().await?)
        } else {
            None
        };

        let stream = self
            .paged::<Node>(&["nodes"], query_params(query)?, OrderBy::NODES)
            .await?;

        if !options.with_status {
            return Ok(stream);
        }

        let now = Utc::now();
        Ok(stream.map_records(move |mut node| {
            if let Some(counts) = &counts {
                node.event_counts = Some(counts.get(&node.certname).copied().unwrap_or_default());
            }
            node.status = Some(node.derive_status(options.unreported_hours, now));
            node
        }))
    }

    /// Fetch a single node by certname
    pub async fn node(&self, certname: &str, options: NodeOptions) -> Result<Node, Error> {
        let url = self.url(QUERY_PREFIX, &["nodes", certname], &[])?;
        let mut node: Node = self.get_json(url).await?;
        if options.with_status {
            if options.with_event_counts {
                let counts = self.latest_event_counts().await?;
                node.event_counts = Some(counts.get(certname).copied().unwrap_or_default());
            }
            node.status = Some(node.derive_status(options.unreported_hours, Utc::now()));
        }
        Ok(node)
    }

    /// Stream facts, optionally restricted to one fact `name`
    pub async fn facts(
        &self,
        name: Option<&str>,
        query: Option<&Query>,
    ) -> Result<RecordStream<Fact>, Error> {
        let mut segments = vec!["facts"];
        if let Some(name) = name {
            segments.push(name);
        }
        self.paged(&segments, query_params(query)?, OrderBy::FACTS)
            .await
    }

    /// All known fact names
    pub async fn fact_names(&self) -> Result<Vec<String>, Error> {
        let url = self.url(QUERY_PREFIX, &["fact-names"], &[])?;
        self.get_json(url).await
    }

    /// Stream reports, most recently received first
    pub async fn reports(&self, query: Option<&Query>) -> Result<RecordStream<Report>, Error> {
        self.paged(&["reports"], query_params(query)?, OrderBy::REPORTS)
            .await
    }

    /// The `count` most recently received reports, fetched in one request
    pub async fn latest_reports(
        &self,
        query: Option<&Query>,
        count: usize,
    ) -> Result<Vec<Report>, Error> {
        if count == 0 {
            return Ok(Vec::new());
        }
        let mut params = query_params(query)?;
        params.push(("order_by", OrderBy::REPORTS.to_param()));
        params.push(("limit", count.to_string()));
        let url = self.url(QUERY_PREFIX, &["reports"], &params)?;
        self.get_json(url).await
    }

    /// Stream resource events in timestamp order
    pub async fn events(&self, query: Option<&Query>) -> Result<RecordStream<Event>, Error> {
        self.paged(&["events"], query_params(query)?, OrderBy::EVENTS)
            .await
    }

    /// Names of all known environments
    pub async fn environments(&self) -> Result<Vec<String>, Error> {
        let url = self.url(QUERY_PREFIX, &["environments"], &[])?;
        let rows: Vec<EnvironmentRow> = self.get_json(url).await?;
        Ok(rows.into_iter().map(|r| r.name).collect())
    }

    /// Attributes of one metrics mbean
    pub async fn metric(&self, name: &str) -> Result<Map<String, Value>, Error> {
        let url = self.url(METRICS_PREFIX, &[name], &[])?;
        self.get_json(url).await
    }

    /// Mapping of mbean name to its metrics path
    pub async fn metrics(&self) -> Result<Map<String, Value>, Error> {
        let url = self.url(METRICS_PREFIX, &[], &[])?;
        self.get_json(url).await
    }

    /// Event counts of every node's latest report keyed by certname
    async fn latest_event_counts(&self) -> Result<HashMap<String, EventCounts>, Error> {
        let params = vec![
            ("query", json!(["=", "latest_report?", true]).to_string()),
            ("summarize_by", "certname".to_string()),
        ];
        let url = self.url(QUERY_PREFIX, &["event-counts"], &params)?;
        let rows: Vec<EventCountRow> = self.get_json(url).await?;
        Ok(rows
            .into_iter()
            .map(|row| (row.subject.title, row.counts))
            .collect())
    }

    /// Fetch the first page now and later pages as the stream is advanced.
    ///
    /// A page shorter than `page_size` ends the stream. Errors on the first
    /// page are returned directly; errors on later pages become the last
    /// stream item.
    async fn paged<T>(
        &self,
        segments: &[&str],
        params: Vec<(&'static str, String)>,
        order_by: OrderBy,
    ) -> Result<RecordStream<T>, Error>
    where
        T: DeserializeOwned + Send + 'static,
    {
        let page_size = self.page_size;
        let segments: Vec<String> = segments.iter().map(|s| s.to_string()).collect();
        let mut params = params;
        params.push(("order_by", order_by.to_param()));
        params.push(("limit", page_size.to_string()));

        let first: Vec<T> = self.get_page(&segments, &params, 0).await?;
        let client = self.clone();

        let stream = async_stream::stream! {
            let mut page = first;
            let mut offset = 0usize;
            loop {
                let fetched = page.len();
                for record in page {
                    yield Ok(record);
                }
                if fetched < page_size {
                    break;
                }
                offset += fetched;
                page = match client.get_page(&segments, &params, offset).await {
                    Ok(next) => next,
                    Err(e) => {
                        tracing::debug!(offset, error = %e, "PuppetDB page fetch failed");
                        yield Err(e);
                        return;
                    }
                };
            }
        };

        Ok(RecordStream::new(stream))
    }

    async fn get_page<T: DeserializeOwned>(
        &self,
        segments: &[String],
        params: &[(&'static str, String)],
        offset: usize,
    ) -> Result<Vec<T>, Error> {
        let segments: Vec<&str> = segments.iter().map(String::as_str).collect();
        let mut url = self.url(QUERY_PREFIX, &segments, params)?;
        url.query_pairs_mut()
            .append_pair("offset", &offset.to_string());
        self.get_json(url).await
    }

    fn url(
        &self,
        prefix: &[&str],
        segments: &[&str],
        params: &[(&'static str, String)],
    ) -> Result<Url, Error> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| Error::Config(format!("invalid PuppetDB address: {}", self.base_url)))?
            .pop_if_empty()
            .extend(prefix)
            .extend(segments);
        if !params.is_empty() {
            url.query_pairs_mut()
                .extend_pairs(params.iter().map(|(k, v)| (*k, v.as_str())));
        }
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, Error> {
        tracing::debug!(url = %url, "PuppetDB request");
        let resp = self.http.get(url.clone()).send().await?;
        let status = resp.status();

        if status == StatusCode::NOT_FOUND {
            return Err(Error::NotFound(url.path().to_string()));
        }
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(Error::Status {
                status: status.as_u16(),
                url: url.to_string(),
                message,
            });
        }

        let body = resp.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }
}

fn query_params(query: Option<&Query>) -> Result<Vec<(&'static str, String)>, Error> {
    match query {
        Some(q) => Ok(vec![("query", q.to_query_string()?)]),
        None => Ok(Vec::new()),
    }
}
