//! Diagnostic events: types and broadcast bus.
//!
//! This module groups the event **data model** and the **bus** used to observe
//! what sources, subscriptions and tickers do at runtime (who subscribed, which
//! items a policy dropped, which listener panicked).
//!
//! ## Contents
//! - [`EventKind`], [`Event`] event classification and payload metadata
//! - [`Bus`] thin wrapper over `tokio::sync::broadcast`
//!
//! ## Quick reference
//! - **Publishers**: `Source` (subscribe/terminal), `Mailbox` (drop/replace/overflow/panic),
//!   `Subscription::dispose`, `ConnectableSource::connect`, `Ticker`.
//! - **Consumers**: [`LogWriter`](crate::LogWriter) or any task holding `bus.subscribe()`.

mod bus;
mod event;

pub use bus::Bus;
pub use event::{Event, EventKind};
