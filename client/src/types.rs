//! Typed PuppetDB records

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Derived node status shown on the dashboard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeStatus {
    Failed,
    Changed,
    Unchanged,
    Noop,
    Unreported,
}

impl NodeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Failed => "failed",
            Self::Changed => "changed",
            Self::Unchanged => "unchanged",
            Self::Noop => "noop",
            Self::Unreported => "unreported",
        }
    }

    /// Parse a report status as PuppetDB stores it
    pub fn from_report_status(s: &str) -> Option<Self> {
        match s {
            "failed" => Some(Self::Failed),
            "changed" => Some(Self::Changed),
            "unchanged" => Some(Self::Unchanged),
            _ => None,
        }
    }
}

impl fmt::Display for NodeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Event totals of a node's latest report
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct EventCounts {
    #[serde(default)]
    pub successes: u64,
    #[serde(default)]
    pub failures: u64,
    #[serde(default)]
    pub noops: u64,
    #[serde(default)]
    pub skips: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Node {
    pub certname: String,
    #[serde(default)]
    pub catalog_environment: Option<String>,
    #[serde(default)]
    pub facts_environment: Option<String>,
    #[serde(default)]
    pub report_environment: Option<String>,
    #[serde(default)]
    pub report_timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    pub catalog_timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    pub facts_timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    pub latest_report_status: Option<String>,
    #[serde(default)]
    pub latest_report_hash: Option<String>,
    #[serde(default)]
    pub latest_report_noop: Option<bool>,
    #[serde(default)]
    pub deactivated: Option<DateTime<Utc>>,
    #[serde(default)]
    pub expired: Option<DateTime<Utc>>,
    /// Set by the client when the status was requested
    #[serde(skip_deserializing)]
    pub status: Option<NodeStatus>,
    #[serde(skip_deserializing)]
    pub event_counts: Option<EventCounts>,
}

impl Node {
    /// Classify the node relative to `now`.
    ///
    /// A node whose last report is missing or not newer than
    /// `now - unreported_hours` is unreported. Otherwise event counts, when
    /// attached, take precedence over the stored report status.
    pub fn derive_status(&self, unreported_hours: u32, now: DateTime<Utc>) -> NodeStatus {
        let threshold = now
            .checked_sub_signed(Duration::hours(i64::from(unreported_hours)))
            .unwrap_or(DateTime::UNIX_EPOCH);
        match self.report_timestamp {
            None => return NodeStatus::Unreported,
            Some(ts) if ts <= threshold => return NodeStatus::Unreported,
            Some(_) => {}
        }

        if let Some(counts) = self.event_counts {
            if counts.failures > 0 {
                return NodeStatus::Failed;
            }
            if counts.successes > 0 {
                return NodeStatus::Changed;
            }
            if counts.noops > 0 {
                return NodeStatus::Noop;
            }
        }

        self.latest_report_status
            .as_deref()
            .and_then(NodeStatus::from_report_status)
            .unwrap_or(NodeStatus::Unchanged)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Fact {
    pub certname: String,
    pub name: String,
    pub value: Value,
    #[serde(default)]
    pub environment: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Report {
    pub certname: String,
    pub hash: String,
    #[serde(default)]
    pub environment: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub receive_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub puppet_version: Option<String>,
    #[serde(default)]
    pub configuration_version: Option<String>,
    #[serde(default)]
    pub noop: Option<bool>,
}

impl Report {
    /// Run time of the report, when both ends are known
    pub fn duration(&self) -> Option<Duration> {
        Some(self.end_time? - self.start_time?)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Event {
    pub certname: String,
    pub report: String,
    pub status: String,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
    pub resource_type: String,
    pub resource_title: String,
    #[serde(default)]
    pub property: Option<String>,
    #[serde(default)]
    pub old_value: Value,
    #[serde(default)]
    pub new_value: Value,
    #[serde(default)]
    pub message: Option<String>,
}

/// Row of the `event-counts` endpoint summarized by certname
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct EventCountRow {
    pub subject: EventCountSubject,
    #[serde(flatten)]
    pub counts: EventCounts,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct EventCountSubject {
    pub title: String,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct EnvironmentRow {
    pub name: String,
}
