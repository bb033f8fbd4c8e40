//! # Ticker: cancellable periodic producer.
//!
//! A [`Ticker`] emits `make_item(n)` into a [`Source`] once per period on a
//! background task. It knows nothing about listeners or backpressure; it only
//! looks at the source to decide when to stop.
//!
//! ## Stop conditions (checked before every emission)
//! ```text
//! token cancelled                         → TickerExit::Cancelled
//! source terminated                       → TickerExit::SourceTerminated
//! had subscribers, now none (if enabled)  → TickerExit::Unobserved
//! limit reached after an emission         → TickerExit::Exhausted (+ complete() if configured)
//! ```
//!
//! A disposal racing with an emission yields at most one undelivered item.
//!
//! ## Example
//! ```rust
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! use std::time::Duration;
//! use rillflow::{Source, Ticker, TickerExit};
//!
//! let source: Source<u64> = Source::new("seconds");
//! let handle = Ticker::new("seconds", Duration::from_millis(5))
//!     .with_limit(3)
//!     .complete_on_exhaust(true)
//!     .stop_when_unobserved(false)
//!     .spawn(source.clone(), |n| n);
//! assert_eq!(handle.join().await, TickerExit::Exhausted);
//! assert_eq!(source.len(), 3);
//! # }
//! ```

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::events::{Event, EventKind};
use crate::sources::Source;

type Gate = Arc<dyn Fn() -> bool + Send + Sync>;

/// Why a ticker task ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TickerExit {
    /// Stopped through its token or [`TickerHandle::stop`].
    Cancelled,
    /// Every listener went away.
    Unobserved,
    /// Emitted `limit` items.
    Exhausted,
    /// The source completed or failed.
    SourceTerminated,
    /// `make_item` panicked or the task was aborted.
    Panicked,
}

impl TickerExit {
    pub fn as_label(&self) -> &'static str {
        match self {
            TickerExit::Cancelled => "cancelled",
            TickerExit::Unobserved => "unobserved",
            TickerExit::Exhausted => "exhausted",
            TickerExit::SourceTerminated => "source_terminated",
            TickerExit::Panicked => "panicked",
        }
    }
}

impl fmt::Display for TickerExit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_label())
    }
}

/// Periodic producer configuration.
pub struct Ticker {
    name: Arc<str>,
    period: Duration,
    limit: Option<u64>,
    complete_on_exhaust: bool,
    stop_when_unobserved: bool,
    token: CancellationToken,
    gate: Option<Gate>,
}

impl Ticker {
    /// Creates a ticker that fires every `period` (first emission after one period).
    ///
    /// A zero period is raised to one millisecond.
    pub fn new(name: impl Into<Arc<str>>, period: Duration) -> Self {
        Self {
            name: name.into(),
            period: period.max(Duration::from_millis(1)),
            limit: None,
            complete_on_exhaust: false,
            stop_when_unobserved: true,
            token: CancellationToken::new(),
            gate: None,
        }
    }

    /// Stops after `n` emissions.
    pub fn with_limit(mut self, n: u64) -> Self {
        self.limit = Some(n);
        self
    }

    /// Completes the source when the limit is reached.
    pub fn complete_on_exhaust(mut self, on: bool) -> Self {
        self.complete_on_exhaust = on;
        self
    }

    /// Stops once the source loses its last subscriber. Enabled by default.
    pub fn stop_when_unobserved(mut self, on: bool) -> Self {
        self.stop_when_unobserved = on;
        self
    }

    /// Uses `token` (e.g. a child of an application-wide token) as the stop signal.
    pub fn with_token(mut self, token: CancellationToken) -> Self {
        self.token = token;
        self
    }

    /// Skips ticks for which `gate` returns `false`. Skipped ticks do not count
    /// toward the limit.
    pub fn gate(mut self, gate: impl Fn() -> bool + Send + Sync + 'static) -> Self {
        self.gate = Some(Arc::new(gate));
        self
    }

    /// Starts emitting into `source`. Must be called from within a Tokio runtime.
    pub fn spawn<T, F>(self, source: Source<T>, make_item: F) -> TickerHandle
    where
        T: Send + Sync + 'static,
        F: FnMut(u64) -> T + Send + 'static,
    {
        let token = self.token.clone();
        let join = tokio::spawn(self.run(source, make_item));
        TickerHandle { token, join }
    }

    async fn run<T, F>(self, source: Source<T>, mut make_item: F) -> TickerExit
    where
        T: Send + Sync + 'static,
        F: FnMut(u64) -> T + Send + 'static,
    {
        let mut interval = time::interval_at(Instant::now() + self.period, self.period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut emitted: u64 = 0;
        let mut observed = false;
        let exit = loop {
            tokio::select! {
                _ = self.token.cancelled() => break TickerExit::Cancelled,
                _ = interval.tick() => {}
            }
            if self.token.is_cancelled() {
                break TickerExit::Cancelled;
            }
            if source.is_terminated() {
                break TickerExit::SourceTerminated;
            }
            if source.has_subscribers() {
                observed = true;
            } else if observed && self.stop_when_unobserved {
                break TickerExit::Unobserved;
            }
            if let Some(gate) = &self.gate {
                if !gate() {
                    continue;
                }
            }

            source.emit(make_item(emitted));
            emitted += 1;

            if self.limit.is_some_and(|limit| emitted >= limit) {
                if self.complete_on_exhaust {
                    source.complete();
                }
                break TickerExit::Exhausted;
            }
        };

        tracing::debug!(ticker = %self.name, emitted, exit = %exit, "[ticker-stopped]");
        source.bus().publish(
            Event::new(EventKind::TickerStopped)
                .with_source(Arc::clone(&self.name))
                .with_reason(exit.as_label()),
        );
        exit
    }
}

impl fmt::Debug for Ticker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ticker")
            .field("name", &self.name)
            .field("period", &self.period)
            .field("limit", &self.limit)
            .field("complete_on_exhaust", &self.complete_on_exhaust)
            .field("stop_when_unobserved", &self.stop_when_unobserved)
            .field("gated", &self.gate.is_some())
            .finish()
    }
}

/// Handle to a running ticker.
#[derive(Debug)]
pub struct TickerHandle {
    token: CancellationToken,
    join: JoinHandle<TickerExit>,
}

impl TickerHandle {
    /// Requests a stop; the task exits before its next emission.
    pub fn stop(&self) {
        self.token.cancel();
    }

    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }

    /// Waits for the task and reports why it ended.
    pub async fn join(self) -> TickerExit {
        match self.join.await {
            Ok(exit) => exit,
            Err(err) => {
                tracing::warn!(error = %err, "[ticker] task did not finish cleanly");
                TickerExit::Panicked
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::listeners::ListenerFn;

    #[tokio::test(start_paused = true)]
    async fn stops_on_cancel() {
        let source: Source<u64> = Source::new("ticks");
        let handle = Ticker::new("ticks", Duration::from_secs(1))
            .stop_when_unobserved(false)
            .spawn(source.clone(), |n| n);
        time::sleep(Duration::from_millis(3500)).await;
        handle.stop();
        assert_eq!(handle.join().await, TickerExit::Cancelled);
        assert_eq!(source.len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn exhausts_and_completes() {
        let source: Source<u64> = Source::new("ticks");
        let handle = Ticker::new("ticks", Duration::from_secs(1))
            .with_limit(4)
            .complete_on_exhaust(true)
            .stop_when_unobserved(false)
            .spawn(source.clone(), |n| n * 10);
        assert_eq!(handle.join().await, TickerExit::Exhausted);
        assert!(source.is_terminated());
        let values: Vec<u64> = source.history().iter().map(|v| **v).collect();
        assert_eq!(values, vec![0, 10, 20, 30]);
    }

    #[tokio::test(start_paused = true)]
    async fn stops_when_last_listener_leaves() {
        let source: Source<u64> = Source::new("ticks");
        let sub = source.subscribe(ListenerFn::new("noop", |_: Arc<u64>| async {}).into_ref());
        let handle = Ticker::new("ticks", Duration::from_secs(1)).spawn(source.clone(), |n| n);
        time::sleep(Duration::from_millis(2500)).await;
        sub.dispose();
        assert_eq!(handle.join().await, TickerExit::Unobserved);
        assert_eq!(source.len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn stops_when_source_terminates() {
        let source: Source<u64> = Source::new("ticks");
        let handle = Ticker::new("ticks", Duration::from_secs(1))
            .stop_when_unobserved(false)
            .spawn(source.clone(), |n| n);
        source.complete();
        assert_eq!(handle.join().await, TickerExit::SourceTerminated);
        assert_eq!(source.len(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn closed_gate_skips_ticks() {
        let source: Source<u64> = Source::new("ticks");
        let handle = Ticker::new("ticks", Duration::from_secs(1))
            .with_limit(1)
            .stop_when_unobserved(false)
            .gate(|| false)
            .spawn(source.clone(), |n| n);
        time::sleep(Duration::from_secs(10)).await;
        assert!(!handle.is_finished());
        assert!(source.is_empty());
        handle.stop();
        assert_eq!(handle.join().await, TickerExit::Cancelled);
    }
}
