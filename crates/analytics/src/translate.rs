//! Auction event → tracking command translation.
//!
//! Each translator is pure: it reads the payload and the enable-time
//! settings and returns the commands to enqueue, in delivery order.
//! Payloads without a bidder code produce nothing.

use std::fmt;
use std::sync::Arc;

use auction_core::types::{AuctionEvent, BidRequest, BidResponse, BidWon, TimeoutNotice};

use crate::buckets::{cents_of, classify_cpm, classify_latency, format_number};
use crate::command::{
    bidder_category, TrackingCommand, ACTION_BIDS, ACTION_BID_LOAD_TIME, ACTION_REQUESTS,
    ACTION_TIMEOUTS, ACTION_WINS, CPM_DISTRIBUTION_CATEGORY, LOAD_TIME_DISTRIBUTION_CATEGORY,
};

/// Caller-supplied CPM bucketing, replacing the default table.
pub type CpmDistributionFn = Arc<dyn Fn(f64) -> String + Send + Sync>;

/// Settings fixed at enable time.
#[derive(Clone)]
pub struct TranslationSettings {
    pub tracker_send: String,
    pub enable_distribution: bool,
    pub cpm_distribution: Option<CpmDistributionFn>,
}

impl Default for TranslationSettings {
    fn default() -> Self {
        Self {
            tracker_send: "send".to_string(),
            enable_distribution: false,
            cpm_distribution: None,
        }
    }
}

impl fmt::Debug for TranslationSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TranslationSettings")
            .field("tracker_send", &self.tracker_send)
            .field("enable_distribution", &self.enable_distribution)
            .field("custom_cpm_distribution", &self.cpm_distribution.is_some())
            .finish()
    }
}

impl TranslationSettings {
    /// CPM bucket label, from the custom function when one is set.
    pub fn cpm_bucket(&self, cpm: f64) -> String {
        match &self.cpm_distribution {
            Some(custom) => custom(cpm),
            None => classify_cpm(cpm).label().to_string(),
        }
    }

    fn command(&self, category: impl Into<String>, action: impl Into<String>) -> TrackingCommand {
        TrackingCommand::new(self.tracker_send.as_str(), category, action)
    }
}

fn bidder(code: &Option<String>) -> Option<&str> {
    code.as_deref().filter(|c| !c.is_empty())
}

pub fn translate(event: &AuctionEvent, settings: &TranslationSettings) -> Vec<TrackingCommand> {
    match event {
        AuctionEvent::BidRequested(request) => translate_bid_requested(request, settings),
        AuctionEvent::BidResponse(response) => translate_bid_response(response, settings),
        AuctionEvent::BidTimeout(notices) => translate_bid_timeout(notices, settings),
        AuctionEvent::BidWon(won) => translate_bid_won(won, settings),
    }
}

pub fn translate_bid_requested(
    request: &BidRequest,
    settings: &TranslationSettings,
) -> Vec<TrackingCommand> {
    match bidder(&request.bidder_code) {
        Some(code) => vec![settings.command(bidder_category(code), ACTION_REQUESTS)],
        None => Vec::new(),
    }
}

pub fn translate_bid_response(
    response: &BidResponse,
    settings: &TranslationSettings,
) -> Vec<TrackingCommand> {
    let Some(code) = bidder(&response.bidder_code) else {
        return Vec::new();
    };
    let mut commands = Vec::with_capacity(4);

    if settings.enable_distribution {
        if let Some(ms) = response.time_to_respond {
            commands.push(
                settings
                    .command(LOAD_TIME_DISTRIBUTION_CATEGORY, classify_latency(ms).label())
                    .with_value(code),
            );
        }
    }

    let cpm = response.cpm.unwrap_or(0.0);
    if cpm > 0.0 {
        if settings.enable_distribution {
            commands.push(
                settings
                    .command(CPM_DISTRIBUTION_CATEGORY, settings.cpm_bucket(cpm))
                    .with_value(code),
            );
        }

        commands.push(
            settings
                .command(bidder_category(code), ACTION_BIDS)
                .with_value(cents_of(response.cpm).to_string()),
        );

        let mut load_time = settings.command(bidder_category(code), ACTION_BID_LOAD_TIME);
        if let Some(ms) = response.time_to_respond {
            load_time = load_time.with_value(format_number(ms));
        }
        commands.push(load_time);
    }

    commands
}

pub fn translate_bid_timeout(
    notices: &[TimeoutNotice],
    settings: &TranslationSettings,
) -> Vec<TrackingCommand> {
    notices
        .iter()
        .filter_map(|notice| bidder(&notice.bidder))
        .map(|code| settings.command(bidder_category(code), ACTION_TIMEOUTS))
        .collect()
}

pub fn translate_bid_won(won: &BidWon, settings: &TranslationSettings) -> Vec<TrackingCommand> {
    match bidder(&won.bidder_code) {
        Some(code) => vec![settings
            .command(bidder_category(code), ACTION_WINS)
            .with_value(cents_of(won.cpm).to_string())],
        None => Vec::new(),
    }
}
