pub mod config;
pub mod error;
pub mod event_bus;
pub mod history;
pub mod types;

pub use config::{ReporterConfig, SamplingRate};
pub use error::{ReporterError, ReporterResult};
pub use event_bus::{AuctionEventSource, InMemoryEventBus, Listener};
pub use history::{load_history, parse_history};
pub use types::{AuctionEvent, EventKind, RecordedEvent};
