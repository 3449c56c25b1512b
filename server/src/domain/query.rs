//! Node listing filters
//!
//! Translates the `env` path segment and `status` query parameter of the
//! node listing into a PuppetDB query. Unknown status values are ignored.

use chrono::{DateTime, Duration, SecondsFormat, SubsecRound, Utc};
use puppetdb::{Node, NodeStatus, Query};

use crate::core::constants::ALL_ENVIRONMENTS;

const FIELD_ENVIRONMENT: &str = "catalog_environment";
const FIELD_REPORT_STATUS: &str = "latest_report_status";
const FIELD_REPORT_TIMESTAMP: &str = "report_timestamp";

/// Status values accepted by the node listing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusFilter {
    Failed,
    Changed,
    Unchanged,
    Unreported,
}

impl StatusFilter {
    /// Parse the `status` query parameter; anything unrecognized is `None`
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "failed" => Some(Self::Failed),
            "changed" => Some(Self::Changed),
            "unchanged" => Some(Self::Unchanged),
            "unreported" => Some(Self::Unreported),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        self.node_status().as_str()
    }

    /// Derived node status this filter keeps
    pub fn node_status(&self) -> NodeStatus {
        match self {
            Self::Failed => NodeStatus::Failed,
            Self::Changed => NodeStatus::Changed,
            Self::Unchanged => NodeStatus::Unchanged,
            Self::Unreported => NodeStatus::Unreported,
        }
    }
}

/// Per-request filter criteria of the node listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterCriteria {
    /// Environment name or `*`
    pub environment: String,
    pub status: Option<StatusFilter>,
}

impl FilterCriteria {
    pub fn new(environment: impl Into<String>, status: Option<&str>) -> Self {
        Self {
            environment: environment.into(),
            status: status.and_then(StatusFilter::parse),
        }
    }

    pub fn all_environments(&self) -> bool {
        self.environment == ALL_ENVIRONMENTS
    }

    /// Remote query for these criteria, `None` when nothing constrains the listing
    pub fn to_query(&self, unresponsive_hours: u32, now: DateTime<Utc>) -> Option<Query> {
        let mut clauses = Vec::new();

        if !self.all_environments() {
            clauses.push(Query::equals(FIELD_ENVIRONMENT, self.environment.as_str()));
        }

        match self.status {
            Some(status @ (StatusFilter::Failed | StatusFilter::Changed | StatusFilter::Unchanged)) => {
                clauses.push(Query::equals(FIELD_REPORT_STATUS, status.as_str()));
            }
            Some(StatusFilter::Unreported) => {
                let window = unresponsive_window(unresponsive_hours, now);
                clauses.push(Query::Or(vec![
                    Query::null(FIELD_REPORT_TIMESTAMP, true),
                    Query::less_or_equal(FIELD_REPORT_TIMESTAMP, window),
                ]));
            }
            None => {}
        }

        if clauses.is_empty() {
            None
        } else {
            Some(Query::And(clauses))
        }
    }

    /// Local re-filter applied to fetched nodes; keeps everything without a status filter
    pub fn matches(&self, node: &Node) -> bool {
        match self.status {
            Some(status) => node.status == Some(status.node_status()),
            None => true,
        }
    }
}

/// `now - hours`, truncated to whole seconds, as ISO-8601 without fraction.
///
/// Falls back to the Unix epoch when the window is out of range.
pub fn unresponsive_window(hours: u32, now: DateTime<Utc>) -> String {
    now.trunc_subsecs(0)
        .checked_sub_signed(Duration::hours(i64::from(hours)))
        .unwrap_or(DateTime::UNIX_EPOCH)
        .to_rfc3339_opts(SecondsFormat::Secs, true)
}
