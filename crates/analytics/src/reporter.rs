//! Bid event reporter, the analytics adapter entry point.
//!
//! [`BidEventReporter::enable`] runs once per page load: it draws the
//! sampling decision, replays the bus history, and subscribes listeners for
//! the four auction events. Every later call only logs.

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use rand::Rng;
use tracing::{debug, info, warn};

use auction_core::config::{tracker_send, ReporterConfig, SamplingRate};
use auction_core::event_bus::AuctionEventSource;
use auction_core::types::{AuctionEvent, EventKind};

use crate::adaptors::TrackingClient;
use crate::queue::CommandQueue;
use crate::translate::{translate, CpmDistributionFn, TranslationSettings};

/// Code under which host frameworks register this adapter.
pub const ADAPTER_CODE: &str = "alright";

/// Options accepted by [`BidEventReporter::enable`].
#[derive(Clone, Default)]
pub struct EnableOptions {
    pub tracker_name: Option<String>,
    pub sampling: Option<SamplingRate>,
    pub enable_distribution: bool,
    pub cpm_distribution: Option<CpmDistributionFn>,
}

impl EnableOptions {
    pub fn with_cpm_distribution(
        mut self,
        bucket: impl Fn(f64) -> String + Send + Sync + 'static,
    ) -> Self {
        self.cpm_distribution = Some(Arc::new(bucket));
        self
    }

    fn tracker_send(&self) -> String {
        tracker_send(self.tracker_name.as_deref())
    }
}

impl fmt::Debug for EnableOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EnableOptions")
            .field("tracker_name", &self.tracker_name)
            .field("sampling", &self.sampling)
            .field("enable_distribution", &self.enable_distribution)
            .field("custom_cpm_distribution", &self.cpm_distribution.is_some())
            .finish()
    }
}

impl From<ReporterConfig> for EnableOptions {
    fn from(config: ReporterConfig) -> Self {
        Self {
            tracker_name: config.tracker_name,
            sampling: config.sampling,
            enable_distribution: config.enable_distribution,
            cpm_distribution: None,
        }
    }
}

/// Result of an `enable` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnableOutcome {
    /// History replayed and listeners registered.
    Subscribed { replayed: usize },
    /// The sampling draw excluded this page load; the reporter stays inert.
    SampledOut,
    /// A previous call already ran; nothing happened.
    AlreadyEnabled,
}

/// State shared between the reporter and its bus listeners.
struct ReporterCore {
    settings: TranslationSettings,
    queue: Mutex<CommandQueue>,
}

impl ReporterCore {
    fn handle(&self, event: &AuctionEvent) {
        let commands = translate(event, &self.settings);
        let mut queue = self.queue.lock();
        queue.enqueue_all(commands);
        queue.check_client();
    }

    fn handle_raw(&self, kind: EventKind, args: &serde_json::Value) {
        match AuctionEvent::decode(kind, args) {
            Ok(event) => self.handle(&event),
            Err(e) => {
                metrics::counter!("bid_reporter.events_skipped").increment(1);
                debug!(event = %kind, error = %e, "skipping malformed auction event");
                self.queue.lock().check_client();
            }
        }
    }
}

enum Phase {
    NotEnabled,
    Enabled {
        tracker_send: String,
        /// `None` when the sampling draw failed.
        core: Option<Arc<ReporterCore>>,
    },
}

/// Forwards auction lifecycle events to an external tracker.
pub struct BidEventReporter {
    client: Arc<dyn TrackingClient>,
    phase: Mutex<Phase>,
}

impl BidEventReporter {
    pub fn new(client: Arc<dyn TrackingClient>) -> Self {
        Self {
            client,
            phase: Mutex::new(Phase::NotEnabled),
        }
    }

    /// Enable reporting using the thread-local RNG for the sampling draw.
    pub fn enable(&self, source: &dyn AuctionEventSource, options: EnableOptions) -> EnableOutcome {
        self.enable_with_rng(source, options, &mut rand::thread_rng())
    }

    pub fn enable_with_rng<R: Rng + ?Sized>(
        &self,
        source: &dyn AuctionEventSource,
        options: EnableOptions,
        rng: &mut R,
    ) -> EnableOutcome {
        let mut phase = self.phase.lock();
        if let Phase::Enabled { .. } = *phase {
            info!("analytics adapter already enabled, unnecessary call to `enable`");
            return EnableOutcome::AlreadyEnabled;
        }

        // Resolved before the sampling draw so it is known either way.
        let tracker_send = options.tracker_send();

        if !Self::sampled(options.sampling.as_ref(), rng) {
            *phase = Phase::Enabled {
                tracker_send,
                core: None,
            };
            info!(adapter = ADAPTER_CODE, "analytics disabled by sampling");
            return EnableOutcome::SampledOut;
        }

        let settings = TranslationSettings {
            tracker_send: tracker_send.clone(),
            enable_distribution: options.enable_distribution,
            cpm_distribution: options.cpm_distribution,
        };
        let core = Arc::new(ReporterCore {
            settings,
            queue: Mutex::new(CommandQueue::new(self.client.clone())),
        });

        // Events fired before enable, in emission order.
        let mut replayed = 0;
        for recorded in source.past_events() {
            match recorded.decode() {
                Some(event) => {
                    core.handle(&event);
                    replayed += 1;
                }
                None => {
                    metrics::counter!("bid_reporter.events_skipped").increment(1);
                    debug!(event_type = %recorded.event_type, "skipping history entry");
                }
            }
        }

        for kind in EventKind::ALL {
            let listener_core = core.clone();
            source.on(
                kind,
                Arc::new(move |args: &serde_json::Value| listener_core.handle_raw(kind, args)),
            );
        }

        info!(
            adapter = ADAPTER_CODE,
            tracker_send = %core.settings.tracker_send,
            distribution = core.settings.enable_distribution,
            replayed,
            "analytics adapter enabled"
        );

        *phase = Phase::Enabled {
            tracker_send,
            core: Some(core),
        };
        EnableOutcome::Subscribed { replayed }
    }

    /// Sampling gate: absent rate always passes, otherwise one uniform draw
    /// in [0, 1) must fall below the rate.
    fn sampled<R: Rng + ?Sized>(sampling: Option<&SamplingRate>, rng: &mut R) -> bool {
        let Some(sampling) = sampling else {
            return true;
        };
        match sampling.rate() {
            Some(rate) => rng.gen::<f64>() < rate,
            None => {
                warn!(?sampling, "sampling rate is not a number, reporting disabled");
                false
            }
        }
    }

    fn core(&self) -> Option<Arc<ReporterCore>> {
        match &*self.phase.lock() {
            Phase::Enabled { core, .. } => core.clone(),
            Phase::NotEnabled => None,
        }
    }

    pub fn is_enabled(&self) -> bool {
        matches!(*self.phase.lock(), Phase::Enabled { .. })
    }

    /// `Some(true)` once enabled and sampled in, `Some(false)` if sampled out.
    pub fn is_sampled(&self) -> Option<bool> {
        match &*self.phase.lock() {
            Phase::Enabled { core, .. } => Some(core.is_some()),
            Phase::NotEnabled => None,
        }
    }

    /// Tracker send method chosen at enable time, also when sampled out.
    pub fn tracker_send(&self) -> Option<String> {
        match &*self.phase.lock() {
            Phase::Enabled { tracker_send, .. } => Some(tracker_send.clone()),
            Phase::NotEnabled => None,
        }
    }

    /// Re-check the tracker client outside of event delivery, e.g. right
    /// after its script loads. Returns whether commands now flow directly.
    pub fn poll_client(&self) -> bool {
        self.core()
            .map(|core| core.queue.lock().check_client())
            .unwrap_or(false)
    }

    pub fn delivered_count(&self) -> u64 {
        self.core()
            .map(|core| core.queue.lock().delivered_count())
            .unwrap_or(0)
    }

    pub fn buffered_count(&self) -> usize {
        self.core()
            .map(|core| core.queue.lock().buffered_count())
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adaptors::paq::PaqClient;
    use auction_core::event_bus::InMemoryEventBus;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn reporter() -> (BidEventReporter, Arc<PaqClient>) {
        let client = Arc::new(PaqClient::default());
        (BidEventReporter::new(client.clone()), client)
    }

    #[test]
    fn test_enable_without_sampling_always_subscribes() {
        let bus = InMemoryEventBus::new();
        let (reporter, _) = reporter();
        assert_eq!(reporter.is_sampled(), None);

        let outcome = reporter.enable(&bus, EnableOptions::default());
        assert_eq!(outcome, EnableOutcome::Subscribed { replayed: 0 });
        assert_eq!(reporter.is_sampled(), Some(true));
        for kind in EventKind::ALL {
            assert_eq!(bus.listener_count(kind), 1);
        }
    }

    #[test]
    fn test_zero_sampling_never_subscribes() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..100 {
            let bus = InMemoryEventBus::new();
            let (reporter, _) = reporter();
            let options = EnableOptions {
                sampling: Some(0.0.into()),
                ..Default::default()
            };
            assert_eq!(
                reporter.enable_with_rng(&bus, options, &mut rng),
                EnableOutcome::SampledOut
            );
            assert_eq!(bus.listener_count(EventKind::BidWon), 0);
        }
    }

    #[test]
    fn test_unparsable_sampling_disables() {
        let bus = InMemoryEventBus::new();
        let (reporter, _) = reporter();
        let options = EnableOptions {
            sampling: Some("sometimes".into()),
            ..Default::default()
        };
        assert_eq!(reporter.enable(&bus, options), EnableOutcome::SampledOut);
        assert_eq!(reporter.is_sampled(), Some(false));
        assert_eq!(bus.listener_count(EventKind::BidWon), 0);
    }

    #[test]
    fn test_tracker_send_resolved_when_sampled_out() {
        let bus = InMemoryEventBus::new();
        let (reporter, client) = reporter();
        assert_eq!(reporter.tracker_send(), None);

        let options = EnableOptions {
            tracker_name: Some("t".into()),
            sampling: Some("0".into()),
            ..Default::default()
        };
        assert_eq!(reporter.enable(&bus, options), EnableOutcome::SampledOut);
        assert_eq!(reporter.tracker_send().as_deref(), Some("t.send"));

        bus.emit(EventKind::BidRequested, serde_json::json!({"bidderCode": "a"}));
        assert!(client.is_empty());
    }

    #[test]
    fn test_second_enable_is_noop_after_sampling_out() {
        let bus = InMemoryEventBus::new();
        let (reporter, _) = reporter();
        let options = EnableOptions {
            sampling: Some("0".into()),
            ..Default::default()
        };
        assert_eq!(reporter.enable(&bus, options), EnableOutcome::SampledOut);
        assert_eq!(
            reporter.enable(&bus, EnableOptions::default()),
            EnableOutcome::AlreadyEnabled
        );
        assert_eq!(bus.listener_count(EventKind::BidRequested), 0);
        assert!(reporter.is_enabled());
    }

    #[test]
    fn test_tracker_send_name() {
        let bus = InMemoryEventBus::new();
        let (reporter, _) = reporter();
        reporter.enable(
            &bus,
            EnableOptions {
                tracker_name: Some("pbTracker".into()),
                ..Default::default()
            },
        );
        assert_eq!(reporter.tracker_send().as_deref(), Some("pbTracker.send"));
    }

    #[test]
    fn test_live_events_use_enable_settings() {
        let bus = InMemoryEventBus::new();
        let (reporter, client) = reporter();
        reporter.enable(
            &bus,
            EnableOptions {
                enable_distribution: true,
                ..Default::default()
            }
            .with_cpm_distribution(|_| "flat".to_string()),
        );

        bus.emit(
            EventKind::BidResponse,
            serde_json::json!({"bidderCode": "acme", "cpm": 3.1, "timeToRespond": 900}),
        );
        let actions: Vec<_> = client.commands().into_iter().map(|c| c.action).collect();
        assert_eq!(actions, vec!["0800-1000ms", "flat", "Bids", "Bid Load Time"]);
        assert_eq!(reporter.delivered_count(), 4);
    }

    #[test]
    fn test_malformed_live_event_is_skipped() {
        let bus = InMemoryEventBus::new();
        let (reporter, client) = reporter();
        reporter.enable(&bus, EnableOptions::default());

        bus.emit(EventKind::BidTimeout, serde_json::json!({"not": "a list"}));
        bus.emit(EventKind::BidWon, serde_json::json!("garbage"));
        assert!(client.is_empty());
    }
}
