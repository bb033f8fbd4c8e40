//! # Mailbox: per-subscription backpressure buffer and delivery worker.
//!
//! Every subscription owns exactly one mailbox. The source calls
//! [`deliver`](Sink::deliver) from its emission path; the mailbox decides on the
//! spot (under its own lock) whether to queue, drop, overwrite or fail, and a
//! dedicated worker task hands accepted items to the listener one at a time.
//!
//! ## Architecture
//! ```text
//! Source::emit ──► deliver(item) ──► [pending] ──► worker task ──► listener.on_data_ready()
//!                       │                                     └─► panic caught → ListenerPanicked
//!                       └─ busy? apply policy (push / drop / overwrite / overflow)
//! ```
//!
//! ## Rules
//! - The listener is **busy** while an item is pending or a callback is in flight.
//!   `Error` only counts the callback: items already queued are not an overflow.
//! - Callbacks of one subscription never overlap; items keep emission order.
//! - After [`dispose`](Mailbox::dispose) returns, no further callback starts
//!   (the check and the pop happen under the same lock); one already running may finish.
//! - A terminal notification is delivered after the items accepted before it.
//! - Panics in callbacks are caught and published; the worker keeps going.

use std::any::Any;
use std::collections::VecDeque;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures::FutureExt;
use tokio::sync::{Notify, watch};
use tokio_util::sync::CancellationToken;

use crate::backpressure::BackpressurePolicy;
use crate::error::StreamError;
use crate::events::{Bus, Event, EventKind};
use crate::listeners::Listener;
use crate::sources::{Sink, SubscriptionId, Terminal};

/// Mutable part of the mailbox, guarded by one mutex.
struct State<T> {
    /// Accepted, not yet delivered items.
    pending: VecDeque<Arc<T>>,
    /// A callback is currently running.
    in_flight: bool,
    /// New items and terminals are still accepted.
    accepting: bool,
    /// Terminal queued behind `pending`.
    terminal: Option<Terminal>,
    /// No further callback may start.
    disposed: bool,
}

impl<T> State<T> {
    fn is_busy(&self) -> bool {
        self.in_flight || !self.pending.is_empty()
    }
}

/// What the worker does next.
enum Step<T> {
    Deliver(Arc<T>),
    Finish(Terminal),
    Wait,
    Stop,
}

/// Backpressure buffer plus worker state for one subscription.
pub(crate) struct Mailbox<T> {
    id: SubscriptionId,
    source: Arc<str>,
    listener: &'static str,
    policy: BackpressurePolicy,
    state: Mutex<State<T>>,
    wake: Notify,
    idle: watch::Sender<bool>,
    token: CancellationToken,
    bus: Bus,
}

impl<T> Mailbox<T>
where
    T: Send + Sync + 'static,
{
    /// Creates an idle mailbox. Nothing is delivered until [`spawn`](Self::spawn).
    pub(crate) fn new(
        id: SubscriptionId,
        source: Arc<str>,
        listener: &'static str,
        policy: BackpressurePolicy,
        bus: Bus,
    ) -> Arc<Self> {
        let (idle, _rx) = watch::channel(true);
        Arc::new(Self {
            id,
            source,
            listener,
            policy,
            state: Mutex::new(State {
                pending: VecDeque::new(),
                in_flight: false,
                accepting: true,
                terminal: None,
                disposed: false,
            }),
            wake: Notify::new(),
            idle,
            token: CancellationToken::new(),
            bus,
        })
    }

    /// Spawns the delivery worker for `listener`.
    ///
    /// Must be called from within a Tokio runtime.
    pub(crate) fn spawn(self: &Arc<Self>, listener: Arc<dyn Listener<T>>) {
        let me = Arc::clone(self);
        tokio::spawn(async move { me.run(listener).await });
    }

    pub(crate) fn id(&self) -> SubscriptionId {
        self.id
    }

    pub(crate) fn source(&self) -> &Arc<str> {
        &self.source
    }

    pub(crate) fn listener(&self) -> &'static str {
        self.listener
    }

    pub(crate) fn policy(&self) -> BackpressurePolicy {
        self.policy
    }

    /// Token cancelled once the subscription is over (disposed or terminal delivered).
    pub(crate) fn token(&self) -> &CancellationToken {
        &self.token
    }

    pub(crate) fn is_disposed(&self) -> bool {
        self.lock().disposed
    }

    /// Stops the subscription. Returns `true` only for the call that disposed it.
    pub(crate) fn dispose(&self) -> bool {
        let mut st = self.lock();
        if st.disposed {
            return false;
        }
        st.disposed = true;
        st.accepting = false;
        st.pending.clear();
        st.terminal = None;
        if !st.in_flight {
            self.idle.send_replace(true);
        }
        drop(st);

        self.token.cancel();
        true
    }

    /// Waits until nothing is pending or in flight (or the mailbox is finished).
    pub(crate) async fn settled(&self) {
        let mut rx = self.idle.subscribe();
        let _ = rx.wait_for(|idle| *idle).await;
    }

    /// Worker loop: one callback at a time until disposed or terminated.
    async fn run(self: Arc<Self>, listener: Arc<dyn Listener<T>>) {
        loop {
            match self.next_step() {
                Step::Deliver(item) => self.guarded(listener.on_data_ready(item)).await,
                Step::Finish(Terminal::Complete) => {
                    self.guarded(listener.on_data_complete()).await;
                    break;
                }
                Step::Finish(Terminal::Fail(err)) => {
                    self.guarded(listener.on_data_error(&err)).await;
                    break;
                }
                Step::Wait => {
                    tokio::select! {
                        _ = self.token.cancelled() => break,
                        _ = self.wake.notified() => {}
                    }
                }
                Step::Stop => break,
            }
        }
        self.finish();
    }

    fn next_step(&self) -> Step<T> {
        let mut st = self.lock();
        st.in_flight = false;
        if st.disposed {
            return Step::Stop;
        }
        if let Some(item) = st.pending.pop_front() {
            st.in_flight = true;
            return Step::Deliver(item);
        }
        if let Some(signal) = st.terminal.take() {
            st.in_flight = true;
            st.disposed = true;
            return Step::Finish(signal);
        }
        self.idle.send_replace(true);
        Step::Wait
    }

    fn finish(&self) {
        let mut st = self.lock();
        st.in_flight = false;
        st.disposed = true;
        st.accepting = false;
        st.pending.clear();
        drop(st);

        self.idle.send_replace(true);
        self.token.cancel();
    }

    /// Runs one callback, converting a panic into a `ListenerPanicked` event.
    async fn guarded<F>(&self, fut: F)
    where
        F: Future<Output = ()>,
    {
        if let Err(payload) = AssertUnwindSafe(fut).catch_unwind().await {
            let err = StreamError::ListenerPanicked {
                listener: self.listener,
                info: panic_info(payload.as_ref()),
            };
            self.bus
                .publish(self.event(EventKind::ListenerPanicked).with_reason(err.to_string()));
        }
    }

    /// Publishes a diagnostic event tagged with this subscription.
    pub(crate) fn report(&self, kind: EventKind) {
        self.bus.publish(self.event(kind));
    }

    fn event(&self, kind: EventKind) -> Event {
        Event::new(kind)
            .with_source(Arc::clone(&self.source))
            .with_listener(self.listener)
            .with_subscription(self.id)
            .with_policy(self.policy)
    }

    fn lock(&self) -> MutexGuard<'_, State<T>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    #[cfg(test)]
    fn pending(&self) -> Vec<Arc<T>> {
        self.lock().pending.iter().cloned().collect()
    }
}

impl<T> Sink<T> for Mailbox<T>
where
    T: Send + Sync + 'static,
{
    fn deliver(&self, item: &Arc<T>) {
        let mut st = self.lock();
        if !st.accepting {
            return;
        }
        let busy = match self.policy {
            BackpressurePolicy::Error => st.in_flight,
            _ => st.is_busy(),
        };
        if !busy {
            st.pending.push_back(Arc::clone(item));
            self.idle.send_replace(false);
            drop(st);
            self.wake.notify_one();
            return;
        }

        match self.policy {
            BackpressurePolicy::Unbounded => {
                st.pending.push_back(Arc::clone(item));
                drop(st);
                self.wake.notify_one();
            }
            BackpressurePolicy::DropNew => {
                drop(st);
                self.report(EventKind::ItemDropped);
            }
            BackpressurePolicy::Latest => {
                let replaced = match st.pending.back_mut() {
                    Some(slot) => {
                        *slot = Arc::clone(item);
                        true
                    }
                    None => {
                        st.pending.push_back(Arc::clone(item));
                        false
                    }
                };
                drop(st);
                if replaced {
                    self.report(EventKind::ItemReplaced);
                } else {
                    self.wake.notify_one();
                }
            }
            BackpressurePolicy::Error => {
                let err = StreamError::Overflow {
                    listener: self.listener,
                    policy: self.policy,
                };
                st.accepting = false;
                st.terminal = Some(Terminal::Fail(err.clone()));
                drop(st);
                self.wake.notify_one();
                self.bus
                    .publish(self.event(EventKind::Overflow).with_reason(err.to_string()));
            }
        }
    }

    fn terminate(&self, signal: Terminal) {
        let mut st = self.lock();
        if !st.accepting {
            return;
        }
        st.accepting = false;
        st.terminal = Some(signal);
        self.idle.send_replace(false);
        drop(st);
        self.wake.notify_one();
    }

    fn is_closed(&self) -> bool {
        !self.lock().accepting
    }

    fn idle_signal(&self) -> Option<watch::Receiver<bool>> {
        Some(self.idle.subscribe())
    }
}

fn panic_info(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&'static str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Without a worker the first item stays pending, so every later item
    // arrives while the mailbox is busy (`Error` only counts a running callback).
    fn idle_mailbox(policy: BackpressurePolicy) -> Arc<Mailbox<u32>> {
        Mailbox::new(SubscriptionId::next(), "test".into(), "tester", policy, Bus::new(16))
    }

    fn offer(mb: &Mailbox<u32>, items: &[u32]) {
        for i in items {
            mb.deliver(&Arc::new(*i));
        }
    }

    fn values(mb: &Mailbox<u32>) -> Vec<u32> {
        mb.pending().iter().map(|v| **v).collect()
    }

    #[test]
    fn unbounded_queues_everything() {
        let mb = idle_mailbox(BackpressurePolicy::Unbounded);
        offer(&mb, &[1, 2, 3]);
        assert_eq!(values(&mb), vec![1, 2, 3]);
    }

    #[test]
    fn drop_new_keeps_only_the_first() {
        let mb = idle_mailbox(BackpressurePolicy::DropNew);
        offer(&mb, &[1, 2, 3]);
        assert_eq!(values(&mb), vec![1]);
        assert!(!mb.is_closed());
    }

    #[test]
    fn latest_overwrites_undelivered_item() {
        let mb = idle_mailbox(BackpressurePolicy::Latest);
        offer(&mb, &[1, 2, 3]);
        assert_eq!(values(&mb), vec![3]);
    }

    #[test]
    fn error_queues_while_no_callback_runs() {
        let mb = idle_mailbox(BackpressurePolicy::Error);
        offer(&mb, &[1, 2, 3]);
        assert_eq!(values(&mb), vec![1, 2, 3]);
        assert!(!mb.is_closed());
    }

    #[test]
    fn error_closes_on_arrival_during_callback() {
        let mb = idle_mailbox(BackpressurePolicy::Error);
        offer(&mb, &[1, 2]);
        mb.lock().in_flight = true;
        offer(&mb, &[3]);
        assert!(mb.is_closed());
        assert_eq!(values(&mb), vec![1, 2]);
        assert!(matches!(
            mb.lock().terminal,
            Some(Terminal::Fail(StreamError::Overflow { .. }))
        ));
        offer(&mb, &[4]);
        assert_eq!(values(&mb), vec![1, 2]);
    }

    #[test]
    fn drops_are_published() {
        let mb = idle_mailbox(BackpressurePolicy::DropNew);
        let mut rx = mb.bus.subscribe();
        offer(&mb, &[1, 2]);
        let ev = rx.try_recv().expect("drop event");
        assert_eq!(ev.kind, EventKind::ItemDropped);
        assert_eq!(ev.listener, Some("tester"));
        assert_eq!(ev.subscription, Some(mb.id()));
    }

    #[test]
    fn dispose_is_idempotent_and_clears() {
        let mb = idle_mailbox(BackpressurePolicy::Unbounded);
        offer(&mb, &[1, 2]);
        assert!(mb.dispose());
        assert!(!mb.dispose());
        assert!(mb.is_disposed());
        assert!(mb.token().is_cancelled());
        assert!(values(&mb).is_empty());
        offer(&mb, &[3]);
        assert!(values(&mb).is_empty());
    }

    #[test]
    fn terminal_after_dispose_is_ignored() {
        let mb = idle_mailbox(BackpressurePolicy::Unbounded);
        mb.dispose();
        mb.terminate(Terminal::Complete);
        assert!(mb.lock().terminal.is_none());
    }

    #[test]
    fn panic_payloads_render() {
        let boxed: Box<dyn Any + Send> = Box::new("static");
        assert_eq!(panic_info(boxed.as_ref()), "static");
        let boxed: Box<dyn Any + Send> = Box::new(String::from("owned"));
        assert_eq!(panic_info(boxed.as_ref()), "owned");
        let boxed: Box<dyn Any + Send> = Box::new(7u8);
        assert_eq!(panic_info(boxed.as_ref()), "unknown panic");
    }
}
