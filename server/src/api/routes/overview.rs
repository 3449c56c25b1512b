//! Overview page

use axum::extract::State;
use axum::response::Html;
use serde_json::{Map, Value};

use super::DashboardState;
use crate::api::templates::{self, Layout, Overview};
use crate::api::types::ApiError;
use crate::core::constants::{
    METRIC_AVG_RESOURCES_PER_NODE, METRIC_COMMAND_PROCESSING_TIME, METRIC_COMMANDS_FATAL,
    METRIC_NUM_NODES, METRIC_NUM_RESOURCES,
};

/// `/`: population and command processing metrics
pub async fn index(State(state): State<DashboardState>) -> Result<Html<String>, ApiError> {
    let db = &state.puppetdb;
    let (num_nodes, num_resources, avg_resources, fatal, processing) = tokio::try_join!(
        db.metric(METRIC_NUM_NODES),
        db.metric(METRIC_NUM_RESOURCES),
        db.metric(METRIC_AVG_RESOURCES_PER_NODE),
        db.metric(METRIC_COMMANDS_FATAL),
        db.metric(METRIC_COMMAND_PROCESSING_TIME),
    )
    .map_err(ApiError::from_puppetdb)?;

    let overview = Overview {
        num_nodes: attribute(&num_nodes, "Value", 0),
        num_resources: attribute(&num_resources, "Value", 0),
        avg_resources_node: attribute(&avg_resources, "Value", 6),
        mean_failed_commands: attribute(&fatal, "MeanRate", 6),
        mean_command_time: attribute(&processing, "MeanRate", 6),
    };

    Ok(Html(
        Layout::new("Overview").render(&templates::overview(&overview)),
    ))
}

/// Numeric attribute with `precision` decimals; integers are shown as is
fn attribute(metric: &Map<String, Value>, key: &str, precision: usize) -> String {
    match metric.get(key) {
        Some(Value::Number(n)) if n.is_f64() => match n.as_f64() {
            Some(f) => format!("{:.*}", precision, f),
            None => n.to_string(),
        },
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::String(s)) => s.clone(),
        _ => {
            tracing::debug!(key, "Metric attribute missing");
            crate::utils::time::NONE.to_string()
        }
    }
}
