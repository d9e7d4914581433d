//! Auction lifecycle payloads emitted by the host bidding framework.
//! Field names follow the framework's camelCase wire shape; unknown fields
//! are ignored so full framework objects decode cleanly.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};

/// The four auction events the reporter listens to.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum EventKind {
    #[serde(rename = "bidRequested")]
    BidRequested,
    #[serde(rename = "bidResponse")]
    BidResponse,
    #[serde(rename = "bidTimeout")]
    BidTimeout,
    #[serde(rename = "bidWon")]
    BidWon,
}

impl EventKind {
    pub const ALL: [EventKind; 4] = [
        EventKind::BidRequested,
        EventKind::BidResponse,
        EventKind::BidTimeout,
        EventKind::BidWon,
    ];

    /// Event tag as used by the framework's event bus.
    pub fn tag(self) -> &'static str {
        match self {
            EventKind::BidRequested => "bidRequested",
            EventKind::BidResponse => "bidResponse",
            EventKind::BidTimeout => "bidTimeout",
            EventKind::BidWon => "bidWon",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.tag() == tag)
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.tag())
    }
}

/// Optional field decoder: a value of the wrong JSON type reads as `None`
/// rather than failing the whole payload.
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(T::deserialize(value).ok())
}

/// A bidder was asked to bid for this auction round.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BidRequest {
    #[serde(
        default,
        deserialize_with = "lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub bidder_code: Option<String>,
}

/// A single bid result returned by a bidder.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BidResponse {
    #[serde(
        default,
        deserialize_with = "lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub bidder_code: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub cpm: Option<f64>,
    /// Milliseconds between request and response.
    #[serde(
        default,
        deserialize_with = "lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub time_to_respond: Option<f64>,
}

/// One bidder that failed to answer before the auction timeout.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TimeoutNotice {
    #[serde(
        default,
        deserialize_with = "lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub bidder: Option<String>,
}

/// The impression was awarded to this bid.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BidWon {
    #[serde(
        default,
        deserialize_with = "lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub bidder_code: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub cpm: Option<f64>,
}

/// A decoded auction event.
#[derive(Debug, Clone, PartialEq)]
pub enum AuctionEvent {
    BidRequested(BidRequest),
    BidResponse(BidResponse),
    BidTimeout(Vec<TimeoutNotice>),
    BidWon(BidWon),
}

impl AuctionEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            AuctionEvent::BidRequested(_) => EventKind::BidRequested,
            AuctionEvent::BidResponse(_) => EventKind::BidResponse,
            AuctionEvent::BidTimeout(_) => EventKind::BidTimeout,
            AuctionEvent::BidWon(_) => EventKind::BidWon,
        }
    }

    /// Decode raw event arguments for the given kind.
    pub fn decode(kind: EventKind, args: &serde_json::Value) -> Result<Self, serde_json::Error> {
        let event = match kind {
            EventKind::BidRequested => {
                AuctionEvent::BidRequested(BidRequest::deserialize(args)?)
            }
            EventKind::BidResponse => AuctionEvent::BidResponse(BidResponse::deserialize(args)?),
            // Entries decode one by one so a bad entry drops only itself.
            EventKind::BidTimeout => AuctionEvent::BidTimeout(
                Vec::<serde_json::Value>::deserialize(args)?
                    .into_iter()
                    .filter_map(|entry| TimeoutNotice::deserialize(entry).ok())
                    .collect(),
            ),
            EventKind::BidWon => AuctionEvent::BidWon(BidWon::deserialize(args)?),
        };
        Ok(event)
    }

    /// Raw JSON arguments as the framework would emit them.
    pub fn to_args(&self) -> Result<serde_json::Value, serde_json::Error> {
        match self {
            AuctionEvent::BidRequested(request) => serde_json::to_value(request),
            AuctionEvent::BidResponse(response) => serde_json::to_value(response),
            AuctionEvent::BidTimeout(notices) => serde_json::to_value(notices),
            AuctionEvent::BidWon(won) => serde_json::to_value(won),
        }
    }
}

/// One entry of the event bus history, in emission order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RecordedEvent {
    pub event_type: String,
    #[serde(default)]
    pub args: serde_json::Value,
}

impl RecordedEvent {
    pub fn new(kind: EventKind, args: serde_json::Value) -> Self {
        Self {
            event_type: kind.tag().to_string(),
            args,
        }
    }

    /// Decode into a typed event. `None` for unknown tags or malformed args.
    pub fn decode(&self) -> Option<AuctionEvent> {
        let kind = EventKind::from_tag(&self.event_type)?;
        AuctionEvent::decode(kind, &self.args).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_kind_tags() {
        for kind in EventKind::ALL {
            assert_eq!(EventKind::from_tag(kind.tag()), Some(kind));
        }
        assert_eq!(EventKind::from_tag("auctionEnd"), None);
        assert_eq!(
            serde_json::to_string(&EventKind::BidWon).unwrap(),
            "\"bidWon\""
        );
    }

    #[test]
    fn test_bid_response_decodes_framework_object() {
        let args = serde_json::json!({
            "bidderCode": "acme",
            "cpm": 1.23,
            "timeToRespond": 250,
            "adUnitCode": "div-1",
            "currency": "USD"
        });
        let event = AuctionEvent::decode(EventKind::BidResponse, &args).unwrap();
        assert_eq!(
            event,
            AuctionEvent::BidResponse(BidResponse {
                bidder_code: Some("acme".into()),
                cpm: Some(1.23),
                time_to_respond: Some(250.0),
            })
        );
    }

    #[test]
    fn test_recorded_event_skips_malformed() {
        let unknown = RecordedEvent {
            event_type: "auctionInit".into(),
            args: serde_json::json!({}),
        };
        assert!(unknown.decode().is_none());

        let bad_args = RecordedEvent::new(EventKind::BidTimeout, serde_json::json!("nope"));
        assert!(bad_args.decode().is_none());

        let missing_bidder = RecordedEvent::new(EventKind::BidRequested, serde_json::json!({}));
        assert_eq!(
            missing_bidder.decode(),
            Some(AuctionEvent::BidRequested(BidRequest::default()))
        );
    }

    #[test]
    fn test_wrong_field_types_read_as_absent() {
        let args = serde_json::json!({
            "bidderCode": "acme",
            "cpm": "1.5",
            "timeToRespond": 300
        });
        let event = AuctionEvent::decode(EventKind::BidResponse, &args).unwrap();
        assert_eq!(
            event,
            AuctionEvent::BidResponse(BidResponse {
                bidder_code: Some("acme".into()),
                cpm: None,
                time_to_respond: Some(300.0),
            })
        );

        let won = AuctionEvent::decode(
            EventKind::BidWon,
            &serde_json::json!({"bidderCode": 7, "cpm": 2.0}),
        )
        .unwrap();
        assert_eq!(
            won,
            AuctionEvent::BidWon(BidWon {
                bidder_code: None,
                cpm: Some(2.0),
            })
        );
    }

    #[test]
    fn test_timeout_entries_decode_independently() {
        let args = serde_json::json!([{"bidder": "a"}, {"bidder": 7}, "junk", {"bidder": "b"}]);
        let event = AuctionEvent::decode(EventKind::BidTimeout, &args).unwrap();
        let AuctionEvent::BidTimeout(notices) = event else {
            panic!("expected a timeout event");
        };
        let bidders: Vec<_> = notices.iter().map(|n| n.bidder.as_deref()).collect();
        assert_eq!(bidders, vec![Some("a"), None, Some("b")]);
    }

    #[test]
    fn test_recorded_event_serde_shape() {
        let event = RecordedEvent::new(
            EventKind::BidWon,
            serde_json::json!({"bidderCode": "acme", "cpm": 2.5}),
        );
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["eventType"], "bidWon");
        assert_eq!(json["args"]["cpm"], 2.5);
    }
}
