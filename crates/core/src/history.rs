//! Recorded event files: a JSON array of `{"eventType": ..., "args": ...}`
//! entries, as produced by dumping the framework's event history.

use std::path::Path;

use tracing::warn;

use crate::error::ReporterResult;
use crate::types::RecordedEvent;

/// Parse an event file body. The top level must be an array; entries that
/// are not `{eventType, args}` objects are dropped.
pub fn parse_history(raw: &str) -> ReporterResult<Vec<RecordedEvent>> {
    let entries: Vec<serde_json::Value> = serde_json::from_str(raw)?;

    let total = entries.len();
    let events: Vec<RecordedEvent> = entries
        .into_iter()
        .filter_map(|entry| serde_json::from_value(entry).ok())
        .collect();
    if events.len() < total {
        warn!(dropped = total - events.len(), "dropped malformed event entries");
    }
    Ok(events)
}

pub fn load_history(path: &Path) -> ReporterResult<Vec<RecordedEvent>> {
    let raw = std::fs::read_to_string(path)?;
    parse_history(&raw)
}
