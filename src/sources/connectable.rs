//! # ConnectableSource: hot multicast view over an upstream source.
//!
//! Listeners attach to an internal **hub** source named `<upstream>.hot`. Nothing
//! flows from upstream to the hub until [`connect`](ConnectableSource::connect) is
//! called; from then on every upstream item is emitted once on the hub and each hub
//! listener receives it according to its own policy.
//!
//! ```text
//! upstream ──(after connect)──► Relay ──► hub.emit ──► Mailbox A ──► listener A
//!                                                 └──► Mailbox B ──► listener B
//! ```
//!
//! ## Rules
//! - `connect` is idempotent: the first call attaches the relay and returns `true`,
//!   later calls return `false` and change nothing.
//! - Items emitted upstream before `connect` are never delivered.
//! - An upstream terminal is forwarded to the hub once.
//! - Once connected, the upstream counts the hub's listeners as its own subscribers,
//!   so producers and tickers see when the last hot listener leaves.
//! - The hub keeps no history of its own; the upstream's is the record.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use crate::backpressure::BackpressurePolicy;
use crate::events::{Event, EventKind};
use crate::listeners::ListenerRef;
use crate::sources::{Sink, Source, SourceBuilder, Subscription, SubscriptionId, Terminal};

/// Deferred start hook run by the first `connect`.
pub(crate) type Starter = Box<dyn FnOnce() + Send>;

struct Inner<T> {
    upstream: Source<T>,
    hub: Source<T>,
    connected: AtomicBool,
    starter: Mutex<Option<Starter>>,
}

/// Connectable, multicasting wrapper around a [`Source`].
pub struct ConnectableSource<T> {
    inner: Arc<Inner<T>>,
}

impl<T> Clone for ConnectableSource<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> ConnectableSource<T>
where
    T: Send + Sync + 'static,
{
    /// Wraps `upstream`. Same as [`Source::publish`].
    pub fn new(upstream: &Source<T>) -> Self {
        Self::with_starter(upstream.clone(), None)
    }

    pub(crate) fn with_starter(upstream: Source<T>, starter: Option<Starter>) -> Self {
        let hub = SourceBuilder::new(format!("{}.hot", upstream.name()))
            .with_config(upstream.config().clone())
            .without_history()
            .with_bus(upstream.bus().clone())
            .build();
        Self {
            inner: Arc::new(Inner {
                upstream,
                hub,
                connected: AtomicBool::new(false),
                starter: Mutex::new(starter),
            }),
        }
    }

    /// Name of the hub (`<upstream>.hot`).
    pub fn name(&self) -> &str {
        self.inner.hub.name()
    }

    pub fn upstream(&self) -> &Source<T> {
        &self.inner.upstream
    }

    /// Attaches `listener` to the hub with the default policy.
    pub fn subscribe(&self, listener: ListenerRef<T>) -> Subscription<T> {
        self.inner.hub.subscribe(listener)
    }

    pub fn subscribe_with(
        &self,
        listener: ListenerRef<T>,
        policy: BackpressurePolicy,
    ) -> Subscription<T> {
        self.inner.hub.subscribe_with(listener, policy)
    }

    /// Starts forwarding upstream items. Returns `true` only on the first call.
    pub fn connect(&self) -> bool {
        if self.inner.connected.swap(true, Ordering::AcqRel) {
            return false;
        }
        let relay = Arc::new(Relay {
            hub: self.inner.hub.clone(),
        });
        let _ = self.inner.upstream.attach(SubscriptionId::next(), relay);

        let starter = self
            .inner
            .starter
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(start) = starter {
            start();
        }

        self.inner
            .hub
            .bus()
            .publish(Event::new(EventKind::Connected).with_source(self.name()));
        true
    }

    pub fn is_connected(&self) -> bool {
        self.inner.connected.load(Ordering::Acquire)
    }

    /// Listeners currently attached to the hub.
    pub fn subscriber_count(&self) -> usize {
        self.inner.hub.subscriber_count()
    }

    pub fn is_terminated(&self) -> bool {
        self.inner.hub.is_terminated()
    }

    /// Waits until every hub listener is idle.
    pub async fn settled(&self) {
        self.inner.hub.settled().await;
    }
}

impl<T> fmt::Debug for ConnectableSource<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectableSource")
            .field("hub", &self.inner.hub)
            .field("connected", &self.inner.connected.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

/// Upstream sink that re-emits into the hub.
struct Relay<T> {
    hub: Source<T>,
}

impl<T> Sink<T> for Relay<T>
where
    T: Send + Sync + 'static,
{
    fn deliver(&self, item: &Arc<T>) {
        self.hub.emit_arc(Arc::clone(item));
    }

    fn terminate(&self, signal: Terminal) {
        self.hub.terminate(signal);
    }

    fn is_closed(&self) -> bool {
        self.hub.is_terminated()
    }

    fn listeners(&self) -> usize {
        self.hub.subscriber_count()
    }
}
