//! # ColdSource: one producer run per subscription.
//!
//! A [`ColdSource`] holds a producer function instead of a live stream. Each
//! `subscribe` creates a private source, attaches the listener to it and spawns
//! the producer with an [`Emitter`] bound to that run, so every listener sees the
//! whole sequence from the start.
//!
//! ```text
//! subscribe(A) ──► private source A ◄── producer(Emitter A)   (task A)
//! subscribe(B) ──► private source B ◄── producer(Emitter B)   (task B)
//!
//! publish() ──► ConnectableSource ──connect()──► producer(Emitter) runs once, shared
//! ```
//!
//! The producer should check [`Emitter::is_disposed`] (or await
//! [`Emitter::cancelled`]) between items and return once nobody listens.

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use futures::FutureExt;
use futures::future::BoxFuture;
use tokio_util::sync::CancellationToken;

use crate::backpressure::BackpressurePolicy;
use crate::config::SourceConfig;
use crate::events::Bus;
use crate::listeners::ListenerRef;
use crate::sources::{ConnectableSource, Source, SourceBuilder, Subscription};

type Producer<T> = Arc<dyn Fn(Emitter<T>) -> BoxFuture<'static, ()> + Send + Sync>;

/// Lazily started source; see the module docs.
///
/// ## Example
/// ```rust
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// use std::sync::Arc;
/// use rillflow::{ColdSource, Emitter, ListenerFn};
///
/// let countdown = ColdSource::new("countdown", |em: Emitter<u32>| async move {
///     for i in (1..=3).rev() {
///         if em.is_disposed() {
///             return;
///         }
///         em.emit(i);
///     }
///     em.complete();
/// });
///
/// let sub = countdown.subscribe(
///     ListenerFn::new("printer", |n: Arc<u32>| async move { println!("{n}") }).into_ref(),
/// );
/// sub.settled().await;
/// # }
/// ```
pub struct ColdSource<T> {
    name: Arc<str>,
    cfg: SourceConfig,
    bus: Bus,
    producer: Producer<T>,
}

impl<T> Clone for ColdSource<T> {
    fn clone(&self) -> Self {
        Self {
            name: Arc::clone(&self.name),
            cfg: self.cfg.clone(),
            bus: self.bus.clone(),
            producer: Arc::clone(&self.producer),
        }
    }
}

impl<T> ColdSource<T>
where
    T: Send + Sync + 'static,
{
    /// Creates a cold source with the default configuration.
    pub fn new<F, Fut>(name: impl Into<Arc<str>>, producer: F) -> Self
    where
        F: Fn(Emitter<T>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        SourceBuilder::new(name).build_cold(producer)
    }

    pub(crate) fn from_parts<F, Fut>(name: Arc<str>, cfg: SourceConfig, bus: Bus, f: F) -> Self
    where
        F: Fn(Emitter<T>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let producer: Producer<T> = Arc::new(move |em: Emitter<T>| f(em).boxed());
        Self {
            name,
            cfg,
            bus,
            producer,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn bus(&self) -> &Bus {
        &self.bus
    }

    /// Starts a fresh producer run for `listener` with the default policy.
    pub fn subscribe(&self, listener: ListenerRef<T>) -> Subscription<T> {
        self.subscribe_with(listener, self.cfg.default_policy)
    }

    /// Starts a fresh producer run for `listener`.
    ///
    /// The run is cancelled when the returned subscription is disposed.
    pub fn subscribe_with(
        &self,
        listener: ListenerRef<T>,
        policy: BackpressurePolicy,
    ) -> Subscription<T> {
        let run = self.private_source();
        let sub = run.subscribe_with(listener, policy);
        let emitter = Emitter::new(run, sub.token(), true);
        tokio::spawn((self.producer)(emitter));
        sub
    }

    /// Shares one producer run between all listeners; it starts on the first `connect`.
    pub fn publish(&self) -> ConnectableSource<T> {
        let shared = self.private_source();
        let emitter = Emitter::new(shared.clone(), CancellationToken::new(), false);
        let producer = Arc::clone(&self.producer);
        ConnectableSource::with_starter(
            shared,
            Some(Box::new(move || {
                tokio::spawn(producer(emitter));
            })),
        )
    }

    fn private_source(&self) -> Source<T> {
        Source::from_parts(Arc::clone(&self.name), self.cfg.clone(), self.bus.clone())
    }
}

impl<T> fmt::Debug for ColdSource<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ColdSource")
            .field("name", &self.name)
            .field("cfg", &self.cfg)
            .finish_non_exhaustive()
    }
}

/// Producer-side handle for one cold run.
pub struct Emitter<T> {
    source: Source<T>,
    token: CancellationToken,
    /// Someone listened at least once.
    observed: AtomicBool,
}

impl<T> Emitter<T>
where
    T: Send + Sync + 'static,
{
    fn new(source: Source<T>, token: CancellationToken, observed: bool) -> Self {
        Self {
            source,
            token,
            observed: AtomicBool::new(observed),
        }
    }

    /// Emits one item; ignored once the run is over.
    pub fn emit(&self, item: T) {
        if !self.token.is_cancelled() {
            self.source.emit(item);
        }
    }

    pub fn complete(&self) {
        self.source.complete();
    }

    pub fn fail(&self, reason: impl Into<Arc<str>>) {
        self.source.fail(reason);
    }

    /// True once nobody can receive further items.
    ///
    /// For a shared run this becomes true when the last hot listener leaves; a run
    /// connected before anyone subscribed keeps going until the first one arrives
    /// and leaves.
    pub fn is_disposed(&self) -> bool {
        if self.token.is_cancelled() || self.source.is_terminated() {
            return true;
        }
        if self.source.has_subscribers() {
            self.observed.store(true, Ordering::Relaxed);
            return false;
        }
        self.observed.load(Ordering::Relaxed)
    }

    /// Resolves when the subscription driving this run is disposed.
    ///
    /// Never resolves for a shared run started by [`ConnectableSource::connect`];
    /// poll [`is_disposed`](Self::is_disposed) there.
    pub async fn cancelled(&self) {
        self.token.cancelled().await;
    }
}

impl<T> fmt::Debug for Emitter<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Emitter")
            .field("source", &self.source)
            .field("cancelled", &self.token.is_cancelled())
            .finish()
    }
}
