//! Auction analytics adapter: forwards bid lifecycle events from the
//! auction event bus to an external web analytics tracker.
//!
//! # Modules
//!
//! - [`buckets`] — Latency and CPM distribution buckets, cents conversion
//! - [`command`] — Tracking command tuples and their category/action labels
//! - [`translate`] — Auction event → tracking command translators
//! - [`queue`] — Buffering/passthrough command queue
//! - [`adaptors`] — Tracker clients (`_paq` command array)
//! - [`reporter`] — The enable-once reporter wiring it all to the event bus

pub mod adaptors;
pub mod buckets;
pub mod command;
pub mod queue;
pub mod reporter;
pub mod translate;

pub use adaptors::paq::PaqClient;
pub use adaptors::TrackingClient;
pub use command::TrackingCommand;
pub use queue::CommandQueue;
pub use reporter::{BidEventReporter, EnableOptions, EnableOutcome, ADAPTER_CODE};
pub use translate::{CpmDistributionFn, TranslationSettings};
