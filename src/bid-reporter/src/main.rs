//! Bid Reporter: replays recorded auction events through the analytics
//! adapter and prints the resulting tracker commands.
//!
//! The history file holds the events fired before the adapter was enabled;
//! the optional live file holds events emitted afterwards. Both are JSON
//! arrays of `{"eventType": ..., "args": ...}` entries.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use auction_analytics::adaptors::paq::{PaqClient, PaqConfig};
use auction_analytics::{BidEventReporter, EnableOptions, EnableOutcome};
use auction_core::config::ReporterConfig;
use auction_core::event_bus::InMemoryEventBus;
use auction_core::history::load_history;
use auction_core::types::{EventKind, RecordedEvent};
use clap::Parser;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "bid-reporter")]
#[command(about = "Replay auction events through the analytics adapter")]
#[command(version)]
struct Cli {
    /// JSON file with the event history recorded before enable
    history: PathBuf,

    /// JSON file with events emitted after enable
    #[arg(long)]
    live: Option<PathBuf>,

    /// Config file (TOML/JSON/YAML); BID_REPORTER__* env vars also apply
    #[arg(long, short)]
    config: Option<PathBuf>,

    /// Tracker name (overrides config)
    #[arg(long, env = "BID_REPORTER__TRACKER_NAME")]
    tracker_name: Option<String>,

    /// Sampling rate in [0, 1] (overrides config)
    #[arg(long)]
    sampling: Option<f64>,

    /// Report latency and CPM distributions (overrides config)
    #[arg(long, default_value_t = false)]
    enable_distribution: bool,

    /// Keep the tracker unloaded until the history has been replayed
    #[arg(long, default_value_t = false)]
    defer_tracker: bool,

    /// Emit logs as JSON
    #[arg(long, default_value_t = false)]
    json_logs: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "bid_reporter=info,auction_analytics=info".into());
    if cli.json_logs {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }

    let mut config =
        ReporterConfig::load(cli.config.as_deref()).context("loading reporter configuration")?;

    // Apply CLI overrides
    if let Some(name) = cli.tracker_name {
        config.tracker_name = Some(name);
    }
    if let Some(rate) = cli.sampling {
        config.sampling = Some(rate.into());
        config.validate()?;
    }
    if cli.enable_distribution {
        config.enable_distribution = true;
    }

    info!(
        tracker_send = %config.tracker_send(),
        sampling = ?config.sampling,
        distribution = config.enable_distribution,
        "configuration loaded"
    );

    let history = read_events(&cli.history)?;
    let live = match &cli.live {
        Some(path) => read_events(path)?,
        None => Vec::new(),
    };

    let bus = InMemoryEventBus::with_history(history);
    let client = Arc::new(PaqClient::new(PaqConfig {
        loaded: !cli.defer_tracker,
        ..Default::default()
    }));
    let reporter = BidEventReporter::new(client.clone());

    match reporter.enable(&bus, EnableOptions::from(config)) {
        EnableOutcome::Subscribed { replayed } => info!(replayed, "history replayed"),
        outcome => warn!(?outcome, "reporter not subscribed"),
    }

    if cli.defer_tracker {
        client.mark_loaded();
        reporter.poll_client();
    }

    for event in live {
        match EventKind::from_tag(&event.event_type) {
            Some(kind) => bus.emit(kind, event.args),
            None => warn!(event_type = %event.event_type, "ignoring unknown live event"),
        }
    }

    info!(delivered = reporter.delivered_count(), "replay finished");
    println!("{}", serde_json::to_string_pretty(&client.to_json())?);

    Ok(())
}

fn read_events(path: &Path) -> anyhow::Result<Vec<RecordedEvent>> {
    load_history(path).with_context(|| format!("reading event file {}", path.display()))
}
