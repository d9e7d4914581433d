//! Matomo-style `_paq` command array client. Each delivered command is
//! appended as a positional JSON array, exactly as a page script would
//! push it onto the global tracker queue.

use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::TrackingClient;
use crate::command::TrackingCommand;

/// Configuration for the `_paq` client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaqConfig {
    /// Global variable the tracker script reads (default: "_paq").
    pub queue_name: String,
    /// Treat the tracker script as already loaded (default: true).
    pub loaded: bool,
}

impl Default for PaqConfig {
    fn default() -> Self {
        Self {
            queue_name: "_paq".into(),
            loaded: true,
        }
    }
}

/// `_paq` command array.
pub struct PaqClient {
    config: PaqConfig,
    loaded: AtomicBool,
    entries: Mutex<Vec<TrackingCommand>>,
}

impl PaqClient {
    pub fn new(config: PaqConfig) -> Self {
        Self {
            loaded: AtomicBool::new(config.loaded),
            config,
            entries: Mutex::new(Vec::new()),
        }
    }

    /// Client whose tracker script has not loaded yet.
    pub fn pending() -> Self {
        Self::new(PaqConfig {
            loaded: false,
            ..Default::default()
        })
    }

    pub fn config(&self) -> &PaqConfig {
        &self.config
    }

    /// The tracker script finished loading.
    pub fn mark_loaded(&self) {
        if !self.loaded.swap(true, Ordering::SeqCst) {
            info!(queue = %self.config.queue_name, "tracker script loaded");
        }
    }

    /// Commands delivered so far, in delivery order.
    pub fn commands(&self) -> Vec<TrackingCommand> {
        self.entries.lock().clone()
    }

    /// Delivered commands as the JSON arrays the page queue holds.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!(*self.entries.lock())
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

impl Default for PaqClient {
    fn default() -> Self {
        Self::new(PaqConfig::default())
    }
}

impl TrackingClient for PaqClient {
    fn platform(&self) -> &str {
        "paq"
    }

    fn is_ready(&self) -> bool {
        self.loaded.load(Ordering::SeqCst)
    }

    fn push(&self, command: &TrackingCommand) {
        debug!(
            queue = %self.config.queue_name,
            category = %command.category,
            action = %command.action,
            "tracker command pushed"
        );
        self.entries.lock().push(command.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pending_until_loaded() {
        let client = PaqClient::pending();
        assert!(!client.is_ready());
        client.mark_loaded();
        assert!(client.is_ready());
        assert_eq!(client.platform(), "paq");
    }

    #[test]
    fn test_push_records_positional_arrays() {
        let client = PaqClient::default();
        assert!(client.is_empty());
        client.push(&TrackingCommand::new("send", "Prebid - a", "Requests"));
        client.push(&TrackingCommand::new("send", "Prebid - a", "Wins").with_value("10"));

        assert_eq!(client.len(), 2);
        assert_eq!(
            client.to_json(),
            serde_json::json!([
                ["send", "Prebid - a", "Requests"],
                ["send", "Prebid - a", "Wins", "10"]
            ])
        );
        assert_eq!(client.commands()[1].value.as_deref(), Some("10"));
    }
}
