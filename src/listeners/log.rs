//! # LogWriter: diagnostic event logger
//!
//! Consumes a [`Bus`] receiver on a background task and writes every
//! [`Event`] through `tracing`.
//!
//! ## Levels
//! ```text
//! warn   overflow, listener-panicked, failed
//! debug  item-dropped, item-replaced
//! info   everything else
//! ```
//!
//! ## Example
//! ```no_run
//! # async fn demo() {
//! use rillflow::{LogWriter, Source};
//!
//! let source: Source<u32> = Source::new("numbers");
//! let _writer = LogWriter::new().attach(source.bus());
//! # }
//! ```

use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinHandle;

use crate::events::{Bus, Event, EventKind};

/// Event writer backed by `tracing`.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogWriter;

impl LogWriter {
    /// Construct a new [`LogWriter`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Subscribes to `bus` and spawns the writer task.
    pub fn attach(self, bus: &Bus) -> JoinHandle<()> {
        self.spawn(bus.subscribe())
    }

    /// Spawns a task that logs events from `rx` until the bus is closed.
    pub fn spawn(self, mut rx: broadcast::Receiver<Event>) -> JoinHandle<()> {
        tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(ev) => self.write(&ev),
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "[log-writer] lagged behind the event bus");
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        })
    }

    /// Writes one event.
    pub fn write(&self, e: &Event) {
        let source = e.source.as_deref().unwrap_or("-");
        let listener = e.listener.unwrap_or("-");
        let reason = e.reason.as_deref().unwrap_or("-");
        let subscription = e.subscription.map(|id| id.to_string()).unwrap_or_default();

        match e.kind {
            EventKind::Subscribed => {
                tracing::info!(
                    source,
                    listener,
                    subscription = %subscription,
                    policy = ?e.policy,
                    "[subscribed]"
                );
            }
            EventKind::Disposed => {
                tracing::info!(source, listener, subscription = %subscription, "[disposed]");
            }
            EventKind::ItemDropped => {
                tracing::debug!(source, listener, subscription = %subscription, "[item-dropped]");
            }
            EventKind::ItemReplaced => {
                tracing::debug!(source, listener, subscription = %subscription, "[item-replaced]");
            }
            EventKind::Overflow => {
                tracing::warn!(source, listener, subscription = %subscription, reason, "[overflow]");
            }
            EventKind::ListenerPanicked => {
                tracing::warn!(source, listener, subscription = %subscription, reason, "[listener-panicked]");
            }
            EventKind::Completed => {
                tracing::info!(source, "[completed]");
            }
            EventKind::Failed => {
                tracing::warn!(source, reason, "[failed]");
            }
            EventKind::Connected => {
                tracing::info!(source, "[connected]");
            }
            EventKind::TickerStopped => {
                tracing::info!(source, reason, "[ticker-stopped]");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn writer_exits_when_bus_is_dropped() {
        let bus = Bus::new(4);
        let handle = LogWriter::new().attach(&bus);
        bus.publish(Event::new(EventKind::Completed).with_source("numbers"));
        drop(bus);
        handle.await.expect("writer task");
    }
}
