//! Internal delivery seam between a source's registry and whatever receives items.
//!
//! Two kinds of sinks exist:
//! - `Mailbox` one per subscription, applies backpressure and runs the listener worker;
//! - `Relay` installed by `ConnectableSource::connect`, forwards into the hub source.

use std::sync::Arc;

use tokio::sync::watch;

use crate::error::StreamError;

/// Terminal notification carried to every sink.
#[derive(Clone, Debug)]
pub(crate) enum Terminal {
    Complete,
    Fail(StreamError),
}

/// Receiver side of a source's fan-out.
///
/// Every method is called with the source's emission lock held and must not block.
pub(crate) trait Sink<T>: Send + Sync {
    /// Offers one item.
    fn deliver(&self, item: &Arc<T>);

    /// Offers the terminal notification; no item follows it.
    fn terminate(&self, signal: Terminal);

    /// True once the sink accepts nothing more (disposed, overflowed, terminated).
    fn is_closed(&self) -> bool;

    /// Listeners reached through this sink; a relay counts those of its hub.
    fn listeners(&self) -> usize {
        usize::from(!self.is_closed())
    }

    /// Watch that flips to `true` whenever the sink has nothing pending or in flight.
    fn idle_signal(&self) -> Option<watch::Receiver<bool>> {
        None
    }
}
