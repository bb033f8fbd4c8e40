//! # Subscription handle.
//!
//! A [`Subscription`] is returned by every `subscribe` call. It identifies one
//! listener attachment and is the only way to stop it.
//!
//! ## Rules
//! - [`dispose`](Subscription::dispose) is idempotent; the first call removes the
//!   mailbox from the source and publishes `EventKind::Disposed`.
//! - After `dispose` returns no further callback starts; one already running may finish.
//! - Dropping the handle does **not** dispose; the listener keeps receiving until the
//!   source terminates.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use tokio_util::sync::CancellationToken;

use crate::backpressure::{BackpressurePolicy, Mailbox};
use crate::events::EventKind;
use crate::sources::Registry;

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique subscription identifier, rendered as `sub-N`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubscriptionId(u64);

impl SubscriptionId {
    pub(crate) fn next() -> Self {
        Self(NEXT_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Raw numeric value.
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub-{}", self.0)
    }
}

/// Handle to one listener attachment.
pub struct Subscription<T> {
    mailbox: Arc<Mailbox<T>>,
    registry: Weak<Registry<T>>,
}

impl<T> Clone for Subscription<T> {
    fn clone(&self) -> Self {
        Self {
            mailbox: Arc::clone(&self.mailbox),
            registry: Weak::clone(&self.registry),
        }
    }
}

impl<T> Subscription<T>
where
    T: Send + Sync + 'static,
{
    pub(crate) fn new(mailbox: Arc<Mailbox<T>>, registry: Weak<Registry<T>>) -> Self {
        Self { mailbox, registry }
    }

    pub fn id(&self) -> SubscriptionId {
        self.mailbox.id()
    }

    /// Name of the source this subscription is attached to.
    pub fn source(&self) -> &str {
        self.mailbox.source()
    }

    /// Name reported by the listener.
    pub fn listener(&self) -> &'static str {
        self.mailbox.listener()
    }

    pub fn policy(&self) -> BackpressurePolicy {
        self.mailbox.policy()
    }

    /// Detaches the listener. Safe to call any number of times, from any thread.
    pub fn dispose(&self) {
        if !self.mailbox.dispose() {
            return;
        }
        if let Some(registry) = self.registry.upgrade() {
            registry.remove(self.id());
        }
        self.mailbox.report(EventKind::Disposed);
    }

    /// True once disposed, overflowed, or after the terminal callback started.
    pub fn is_disposed(&self) -> bool {
        self.mailbox.is_disposed()
    }

    /// Waits until this listener has nothing pending and no callback running.
    pub async fn settled(&self) {
        self.mailbox.settled().await;
    }

    /// Cancelled once the subscription is over.
    pub(crate) fn token(&self) -> CancellationToken {
        self.mailbox.token().clone()
    }
}

impl<T> fmt::Debug for Subscription<T>
where
    T: Send + Sync + 'static,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id())
            .field("source", &self.source())
            .field("listener", &self.listener())
            .field("policy", &self.policy())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_unique_and_displayed() {
        let a = SubscriptionId::next();
        let b = SubscriptionId::next();
        assert_ne!(a, b);
        assert!(b.as_u64() > a.as_u64());
        assert_eq!(a.to_string(), format!("sub-{}", a.as_u64()));
    }
}
