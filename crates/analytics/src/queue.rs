//! Command queue with a one-way Buffering → Passthrough transition.
//!
//! Commands accumulate while the tracker client is absent. The first
//! [`CommandQueue::check_client`] that finds the client ready delivers the
//! buffer in FIFO order; from then on every enqueue is delivered at once.

use std::sync::Arc;

use tracing::{debug, info};

use crate::adaptors::TrackingClient;
use crate::command::TrackingCommand;

#[derive(Debug)]
pub enum QueueState {
    Buffering(Vec<TrackingCommand>),
    Passthrough,
}

pub struct CommandQueue {
    state: QueueState,
    client: Arc<dyn TrackingClient>,
    delivered: u64,
}

impl CommandQueue {
    pub fn new(client: Arc<dyn TrackingClient>) -> Self {
        Self {
            state: QueueState::Buffering(Vec::new()),
            client,
            delivered: 0,
        }
    }

    pub fn enqueue(&mut self, command: TrackingCommand) {
        match &mut self.state {
            QueueState::Buffering(buffer) => {
                buffer.push(command);
                metrics::counter!("bid_reporter.commands_buffered").increment(1);
            }
            QueueState::Passthrough => self.deliver(&command),
        }
    }

    pub fn enqueue_all(&mut self, commands: impl IntoIterator<Item = TrackingCommand>) {
        for command in commands {
            self.enqueue(command);
        }
    }

    /// Flush the buffer if the client has become ready. Returns whether the
    /// queue is in passthrough.
    pub fn check_client(&mut self) -> bool {
        if let QueueState::Buffering(buffer) = &mut self.state {
            if self.client.is_ready() {
                let pending = std::mem::take(buffer);
                self.state = QueueState::Passthrough;
                info!(
                    platform = self.client.platform(),
                    flushed = pending.len(),
                    "tracker client ready, flushing buffered commands"
                );
                for command in &pending {
                    self.deliver(command);
                }
            }
        }

        debug!(delivered = self.delivered, "event count sent to tracker");
        self.is_passthrough()
    }

    fn deliver(&mut self, command: &TrackingCommand) {
        self.client.push(command);
        self.delivered += 1;
        metrics::counter!("bid_reporter.commands_delivered").increment(1);
    }

    pub fn is_passthrough(&self) -> bool {
        matches!(self.state, QueueState::Passthrough)
    }

    pub fn buffered_count(&self) -> usize {
        match &self.state {
            QueueState::Buffering(buffer) => buffer.len(),
            QueueState::Passthrough => 0,
        }
    }

    /// Cumulative number of commands handed to the client.
    pub fn delivered_count(&self) -> u64 {
        self.delivered
    }
}
