//! Registry of the sinks attached to one source.
//!
//! Emission takes a snapshot and delivers outside the registry lock, so a
//! listener disposing itself (or another) never deadlocks the fan-out.

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::sources::{Sink, SubscriptionId};

struct Entry<T> {
    id: SubscriptionId,
    sink: Arc<dyn Sink<T>>,
}

pub(crate) struct Registry<T> {
    entries: RwLock<Vec<Entry<T>>>,
}

impl<T> Registry<T> {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self {
            entries: RwLock::new(Vec::new()),
        })
    }

    pub(crate) fn insert(&self, id: SubscriptionId, sink: Arc<dyn Sink<T>>) {
        self.write().push(Entry { id, sink });
    }

    /// Removes the entry with `id`. Returns `false` if it was not registered.
    pub(crate) fn remove(&self, id: SubscriptionId) -> bool {
        let mut entries = self.write();
        let before = entries.len();
        entries.retain(|e| e.id != id);
        entries.len() != before
    }

    /// Sinks in attachment order.
    pub(crate) fn snapshot(&self) -> Vec<Arc<dyn Sink<T>>> {
        self.read().iter().map(|e| Arc::clone(&e.sink)).collect()
    }

    /// Drops every sink that no longer accepts items. Returns how many were removed.
    pub(crate) fn prune_closed(&self) -> usize {
        let mut entries = self.write();
        let before = entries.len();
        entries.retain(|e| !e.sink.is_closed());
        before - entries.len()
    }

    /// Empties the registry, returning the sinks in attachment order.
    pub(crate) fn drain(&self) -> Vec<Arc<dyn Sink<T>>> {
        self.write().drain(..).map(|e| e.sink).collect()
    }

    /// Number of listeners the next item would reach, counted through relays.
    pub(crate) fn active(&self) -> usize {
        self.read().iter().map(|e| e.sink.listeners()).sum()
    }

    fn read(&self) -> RwLockReadGuard<'_, Vec<Entry<T>>> {
        self.entries.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Vec<Entry<T>>> {
        self.entries.write().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::Terminal;
    use std::sync::atomic::{AtomicBool, Ordering};

    #[derive(Default)]
    struct StubSink {
        closed: AtomicBool,
    }

    impl Sink<u8> for StubSink {
        fn deliver(&self, _item: &Arc<u8>) {}

        fn terminate(&self, _signal: Terminal) {
            self.closed.store(true, Ordering::SeqCst);
        }

        fn is_closed(&self) -> bool {
            self.closed.load(Ordering::SeqCst)
        }
    }

    #[test]
    fn insert_remove_and_prune() {
        let reg = Registry::<u8>::new();
        let a = Arc::new(StubSink::default());
        let b = Arc::new(StubSink::default());
        let (ida, idb) = (SubscriptionId::next(), SubscriptionId::next());
        reg.insert(ida, a.clone());
        reg.insert(idb, b.clone());
        assert_eq!(reg.active(), 2);

        b.terminate(Terminal::Complete);
        assert_eq!(reg.active(), 1);
        assert_eq!(reg.prune_closed(), 1);
        assert_eq!(reg.snapshot().len(), 1);

        assert!(reg.remove(ida));
        assert!(!reg.remove(ida));
        assert!(reg.drain().is_empty());
    }
}
