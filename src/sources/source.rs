//! # Source: a hot, multicast data source.
//!
//! A [`Source`] keeps the ordered history of what it emitted and pushes every new
//! item to the listeners attached **at the time of emission**. Late subscribers
//! never see earlier items.
//!
//! ## Architecture
//! ```text
//! emit(item) ──► [emission lock] ──► history.push(item)
//!                                └─► for sink in registry: sink.deliver(item)   (never blocks)
//!
//! complete() / fail(err) ──► [emission lock] ──► terminal = Some(..)
//!                                           └─► drain registry, sink.terminate(..)
//! ```
//!
//! ## Rules
//! - `emit`, `complete` and `fail` never wait for a listener.
//! - The first terminal wins; later emits and terminals are ignored (logged at debug).
//! - Subscribing after the terminal immediately schedules that terminal for the listener.
//! - Listener callbacks run on per-subscription worker tasks, so a Tokio runtime must be
//!   active when subscribing.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::backpressure::{BackpressurePolicy, Mailbox};
use crate::config::SourceConfig;
use crate::error::StreamError;
use crate::events::{Bus, Event, EventKind};
use crate::listeners::ListenerRef;
use crate::sources::{
    ConnectableSource, Registry, Sink, SourceBuilder, Subscription, SubscriptionId, Terminal,
};

/// Everything mutated by emission, guarded by one lock so that history order and
/// delivery order agree.
struct Emission<T> {
    history: Vec<Arc<T>>,
    emitted: u64,
    terminal: Option<Terminal>,
}

struct Inner<T> {
    name: Arc<str>,
    cfg: SourceConfig,
    bus: Bus,
    registry: Arc<Registry<T>>,
    state: Mutex<Emission<T>>,
}

/// Hot multicast source of `T`.
///
/// Cloning is cheap and yields another handle to the same source.
///
/// ## Example
/// ```rust
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// use std::sync::Arc;
/// use rillflow::{ListenerFn, Source};
///
/// let source: Source<&'static str> = Source::new("greetings");
/// source.emit("nobody hears this");
///
/// let sub = source.subscribe(
///     ListenerFn::new("printer", |s: Arc<&'static str>| async move { println!("{s}") }).into_ref(),
/// );
/// source.emit("hello");
/// source.complete();
/// sub.settled().await;
/// assert_eq!(source.history().len(), 2);
/// # }
/// ```
pub struct Source<T> {
    inner: Arc<Inner<T>>,
}

impl<T> Clone for Source<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> Source<T>
where
    T: Send + Sync + 'static,
{
    /// Creates a source with [`SourceConfig::default`] and its own event bus.
    pub fn new(name: impl Into<Arc<str>>) -> Self {
        SourceBuilder::new(name).build()
    }

    /// Creates a source with an explicit configuration.
    pub fn with_config(name: impl Into<Arc<str>>, cfg: SourceConfig) -> Self {
        SourceBuilder::new(name).with_config(cfg).build()
    }

    /// Starts a [`SourceBuilder`].
    pub fn builder(name: impl Into<Arc<str>>) -> SourceBuilder {
        SourceBuilder::new(name)
    }

    pub(crate) fn from_parts(name: Arc<str>, cfg: SourceConfig, bus: Bus) -> Self {
        Self {
            inner: Arc::new(Inner {
                name,
                cfg,
                bus,
                registry: Registry::new(),
                state: Mutex::new(Emission {
                    history: Vec::new(),
                    emitted: 0,
                    terminal: None,
                }),
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn config(&self) -> &SourceConfig {
        &self.inner.cfg
    }

    /// Diagnostic event bus shared by this source and its subscriptions.
    pub fn bus(&self) -> &Bus {
        &self.inner.bus
    }

    /// Emits one item to every current listener.
    pub fn emit(&self, item: T) {
        self.emit_arc(Arc::new(item));
    }

    /// Emits an already shared item.
    pub fn emit_arc(&self, item: Arc<T>) {
        let mut st = self.lock();
        if st.terminal.is_some() {
            tracing::debug!(source = %self.inner.name, "[emit-after-terminal] item ignored");
            return;
        }
        if self.inner.cfg.record_history {
            st.history.push(Arc::clone(&item));
        }
        st.emitted += 1;

        let mut closed = false;
        for sink in self.inner.registry.snapshot() {
            sink.deliver(&item);
            closed |= sink.is_closed();
        }
        if closed {
            self.inner.registry.prune_closed();
        }
    }

    /// Signals normal end of data. Idempotent.
    pub fn complete(&self) {
        self.terminate(Terminal::Complete);
    }

    /// Signals failure to every listener. Ignored after a previous terminal.
    pub fn fail(&self, reason: impl Into<Arc<str>>) {
        self.terminate(Terminal::Fail(StreamError::producer(reason)));
    }

    /// Sends `signal` to every attached sink and detaches them all.
    pub(crate) fn terminate(&self, signal: Terminal) {
        let mut st = self.lock();
        if st.terminal.is_some() {
            tracing::debug!(source = %self.inner.name, "[terminal-after-terminal] ignored");
            return;
        }
        st.terminal = Some(signal.clone());
        for sink in self.inner.registry.drain() {
            sink.terminate(signal.clone());
        }
        drop(st);

        let ev = match &signal {
            Terminal::Complete => Event::new(EventKind::Completed),
            Terminal::Fail(err) => Event::new(EventKind::Failed).with_reason(err.to_string()),
        };
        self.inner.bus.publish(ev.with_source(Arc::clone(&self.inner.name)));
    }

    /// Attaches `listener` with the configured default policy.
    pub fn subscribe(&self, listener: ListenerRef<T>) -> Subscription<T> {
        self.subscribe_with(listener, self.inner.cfg.default_policy)
    }

    /// Attaches `listener` with an explicit backpressure policy.
    ///
    /// Only items emitted after this call are delivered.
    pub fn subscribe_with(
        &self,
        listener: ListenerRef<T>,
        policy: BackpressurePolicy,
    ) -> Subscription<T> {
        let mailbox = Mailbox::new(
            SubscriptionId::next(),
            Arc::clone(&self.inner.name),
            listener.name(),
            policy,
            self.inner.bus.clone(),
        );
        mailbox.spawn(listener);
        if self.attach(mailbox.id(), Arc::clone(&mailbox) as Arc<dyn Sink<T>>) {
            mailbox.report(EventKind::Subscribed);
        }

        Subscription::new(mailbox, Arc::downgrade(&self.inner.registry))
    }

    /// Registers `sink`, or hands it the terminal right away if there already is one.
    ///
    /// Returns `true` if the sink was registered.
    pub(crate) fn attach(&self, id: SubscriptionId, sink: Arc<dyn Sink<T>>) -> bool {
        let st = self.lock();
        match &st.terminal {
            Some(signal) => {
                sink.terminate(signal.clone());
                false
            }
            None => {
                self.inner.registry.insert(id, sink);
                true
            }
        }
    }

    /// Same as [`Subscription::dispose`].
    pub fn unsubscribe(&self, sub: &Subscription<T>) {
        sub.dispose();
    }

    /// Every item emitted so far, in order (empty when history is disabled).
    pub fn history(&self) -> Vec<Arc<T>> {
        self.lock().history.clone()
    }

    /// Number of items emitted so far, whether or not history is recorded.
    pub fn len(&self) -> u64 {
        self.lock().emitted
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of listeners that would receive the next item.
    pub fn subscriber_count(&self) -> usize {
        self.inner.registry.active()
    }

    pub fn has_subscribers(&self) -> bool {
        self.subscriber_count() > 0
    }

    pub fn is_terminated(&self) -> bool {
        self.lock().terminal.is_some()
    }

    /// Waits until every attached listener is idle.
    ///
    /// Listeners already detached by a terminal are not awaited; use
    /// [`Subscription::settled`] for those.
    pub async fn settled(&self) {
        let signals: Vec<_> = self
            .inner
            .registry
            .snapshot()
            .iter()
            .filter_map(|sink| sink.idle_signal())
            .collect();
        for mut rx in signals {
            let _ = rx.wait_for(|idle| *idle).await;
        }
    }

    /// Wraps this source into a [`ConnectableSource`] that forwards nothing until connected.
    pub fn publish(&self) -> ConnectableSource<T> {
        ConnectableSource::new(self)
    }

    fn lock(&self) -> MutexGuard<'_, Emission<T>> {
        self.inner.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T> fmt::Debug for Source<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Source")
            .field("name", &self.inner.name)
            .field("cfg", &self.inner.cfg)
            .finish_non_exhaustive()
    }
}
