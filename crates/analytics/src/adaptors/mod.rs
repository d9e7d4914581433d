//! Tracker clients that receive finished tracking commands.
//!
//! Each client implements [`TrackingClient`]. The reporter buffers commands
//! until [`TrackingClient::is_ready`] first returns true, then pushes every
//! command straight through.

pub mod paq;

use crate::command::TrackingCommand;

/// External analytics tracker, e.g. a page's `_paq` command array.
pub trait TrackingClient: Send + Sync {
    /// Platform identifier (e.g. "paq").
    fn platform(&self) -> &str;

    /// Whether the tracker library is present and accepting commands.
    fn is_ready(&self) -> bool;

    /// Deliver one command. Called in enqueue order.
    fn push(&self, command: &TrackingCommand);
}
