//! # Diagnostic events emitted by sources, subscriptions and tickers.
//!
//! The [`EventKind`] enum classifies events across three categories:
//! - **Subscription events**: a listener joined or left a source
//! - **Backpressure events**: a policy dropped, replaced or refused an item
//! - **Lifecycle events**: completion, failure, connection, ticker exit
//!
//! The [`Event`] struct carries the metadata: timestamps, source name,
//! listener name, subscription id, policy and a free-form reason.
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases monotonically.
//!
//! ## Example
//! ```rust
//! use rillflow::{BackpressurePolicy, Event, EventKind};
//!
//! let ev = Event::new(EventKind::ItemDropped)
//!     .with_source("contacts")
//!     .with_listener("slow-printer")
//!     .with_policy(BackpressurePolicy::DropNew);
//!
//! assert_eq!(ev.kind, EventKind::ItemDropped);
//! assert_eq!(ev.source.as_deref(), Some("contacts"));
//! assert_eq!(ev.listener, Some("slow-printer"));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::SystemTime;

use crate::backpressure::BackpressurePolicy;
use crate::sources::SubscriptionId;

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of diagnostic events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Subscription events ===
    /// A listener subscribed.
    ///
    /// Sets: `source`, `listener`, `subscription`, `policy`
    Subscribed,

    /// A subscription was disposed by its owner.
    ///
    /// Sets: `source`, `listener`, `subscription`
    Disposed,

    // === Backpressure events ===
    /// `DropNew` discarded an item because the listener was busy.
    ///
    /// Sets: `source`, `listener`, `subscription`, `policy`
    ItemDropped,

    /// `Latest` overwrote an undelivered item with a newer one.
    ///
    /// Sets: `source`, `listener`, `subscription`, `policy`
    ItemReplaced,

    /// `Error` refused an item; the subscription fails with an overflow error.
    ///
    /// Sets: `source`, `listener`, `subscription`, `policy`, `reason`
    Overflow,

    /// A listener callback panicked; the panic was caught.
    ///
    /// Sets: `source`, `listener`, `subscription`, `reason` (panic info)
    ListenerPanicked,

    // === Lifecycle events ===
    /// The source completed normally.
    ///
    /// Sets: `source`
    Completed,

    /// The producer failed the source.
    ///
    /// Sets: `source`, `reason`
    Failed,

    /// A connectable source was connected to its upstream.
    ///
    /// Sets: `source`
    Connected,

    /// A ticker stopped emitting.
    ///
    /// Sets: `source`, `reason` (exit label)
    TickerStopped,
}

/// Diagnostic event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,

    /// Name of the source, if applicable.
    pub source: Option<Arc<str>>,
    /// Name of the listener, if applicable.
    pub listener: Option<&'static str>,
    /// Subscription the event relates to.
    pub subscription: Option<SubscriptionId>,
    /// Backpressure policy in force.
    pub policy: Option<BackpressurePolicy>,
    /// Human-readable reason (errors, panic info, exit labels).
    pub reason: Option<Arc<str>>,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            source: None,
            listener: None,
            subscription: None,
            policy: None,
            reason: None,
        }
    }

    /// Attaches a source name.
    #[inline]
    pub fn with_source(mut self, source: impl Into<Arc<str>>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Attaches a listener name.
    #[inline]
    pub fn with_listener(mut self, listener: &'static str) -> Self {
        self.listener = Some(listener);
        self
    }

    /// Attaches a subscription id.
    #[inline]
    pub fn with_subscription(mut self, id: SubscriptionId) -> Self {
        self.subscription = Some(id);
        self
    }

    /// Attaches a backpressure policy.
    #[inline]
    pub fn with_policy(mut self, policy: BackpressurePolicy) -> Self {
        self.policy = Some(policy);
        self
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    #[inline]
    pub fn is_backpressure(&self) -> bool {
        matches!(
            self.kind,
            EventKind::ItemDropped | EventKind::ItemReplaced | EventKind::Overflow
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequence_increases() {
        let a = Event::new(EventKind::Subscribed);
        let b = Event::new(EventKind::Disposed);
        assert!(b.seq > a.seq);
    }

    #[test]
    fn backpressure_classification() {
        assert!(Event::new(EventKind::ItemReplaced).is_backpressure());
        assert!(Event::new(EventKind::Overflow).is_backpressure());
        assert!(!Event::new(EventKind::Completed).is_backpressure());
    }
}
