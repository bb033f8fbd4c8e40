//! # Sources: where items come from.
//!
//! - [`Source`] hot multicast source with history; the core type.
//! - [`ConnectableSource`] hot view that starts forwarding on `connect()`.
//! - [`ColdSource`] producer function run once per subscriber, driven through an [`Emitter`].
//! - [`Subscription`] handle returned by every `subscribe`.
//!
//! ## Architecture
//! ```text
//! Source ──► Registry ──► Sink ──► Mailbox ──► Listener      (subscribe)
//!                           └────► Relay ──► hub Source ...   (ConnectableSource::connect)
//! ```

mod builder;
mod cold;
mod connectable;
mod registry;
mod sink;
mod source;
mod subscription;

pub use builder::SourceBuilder;
pub use cold::{ColdSource, Emitter};
pub use connectable::ConnectableSource;
pub use source::Source;
pub use subscription::{Subscription, SubscriptionId};

pub(crate) use registry::Registry;
pub(crate) use sink::{Sink, Terminal};
