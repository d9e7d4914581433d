//! Tracking commands handed to the external tracker client.

use serde::ser::{Serialize, SerializeSeq, Serializer};

/// Category used for the per-bidder counters.
pub fn bidder_category(bidder: &str) -> String {
    format!("Prebid - {bidder}")
}

pub const LOAD_TIME_DISTRIBUTION_CATEGORY: &str = "Prebid.js Load Time Distribution";
pub const CPM_DISTRIBUTION_CATEGORY: &str = "Prebid.js CPM Distribution";

pub const ACTION_REQUESTS: &str = "Requests";
pub const ACTION_BIDS: &str = "Bids";
pub const ACTION_BID_LOAD_TIME: &str = "Bid Load Time";
pub const ACTION_TIMEOUTS: &str = "Timeouts";
pub const ACTION_WINS: &str = "Wins";

/// `(method, category, action, value?)`, serialised as the tracker's
/// positional command array.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackingCommand {
    pub method: String,
    pub category: String,
    pub action: String,
    pub value: Option<String>,
}

impl TrackingCommand {
    pub fn new(
        method: impl Into<String>,
        category: impl Into<String>,
        action: impl Into<String>,
    ) -> Self {
        Self {
            method: method.into(),
            category: category.into(),
            action: action.into(),
            value: None,
        }
    }

    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }
}

impl Serialize for TrackingCommand {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let len = if self.value.is_some() { 4 } else { 3 };
        let mut seq = serializer.serialize_seq(Some(len))?;
        seq.serialize_element(&self.method)?;
        seq.serialize_element(&self.category)?;
        seq.serialize_element(&self.action)?;
        if let Some(value) = &self.value {
            seq.serialize_element(value)?;
        }
        seq.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serializes_as_positional_array() {
        let cmd = TrackingCommand::new("send", bidder_category("acme"), ACTION_WINS).with_value("250");
        assert_eq!(
            serde_json::to_value(&cmd).unwrap(),
            serde_json::json!(["send", "Prebid - acme", "Wins", "250"])
        );

        let no_value = TrackingCommand::new("t1.send", bidder_category("acme"), ACTION_REQUESTS);
        assert_eq!(
            serde_json::to_string(&no_value).unwrap(),
            r#"["t1.send","Prebid - acme","Requests"]"#
        );
    }
}
