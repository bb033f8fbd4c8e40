//! # rillflow
//!
//! **Rillflow** is a small push-based event source library for async Rust.
//!
//! A producer emits items into a [`Source`]; every listener attached at that
//! moment receives them through its own mailbox, governed by a per-subscription
//! [`BackpressurePolicy`]. A slow listener never slows the producer or the other
//! listeners. Sources can be hot ([`Source`]), connectable ([`ConnectableSource`])
//! or cold ([`ColdSource`]), and a [`Ticker`] drives them on a fixed period.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!   producer code          Ticker (period)        ColdSource producer
//!        │                      │                        │ (Emitter)
//!        ▼                      ▼                        ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  Source<T>                                                        │
//! │  - history (ordered, optional)                                    │
//! │  - Registry (attachment order, snapshot for fan-out)              │
//! │  - terminal (Complete | Fail), first one wins                     │
//! └──────┬──────────────────┬──────────────────┬──────────────────────┘
//!        ▼                  ▼                  ▼
//!   ┌──────────┐       ┌──────────┐       ┌──────────┐
//!   │ Mailbox  │       │ Mailbox  │       │  Relay   │──► hub Source (ConnectableSource)
//!   │ (policy) │       │ (policy) │       └──────────┘        └──► Mailbox ... (after connect)
//!   └────┬─────┘       └────┬─────┘
//!        ▼                  ▼
//!     worker             worker          one task per subscription, panics caught
//!        ▼                  ▼
//!  on_data_ready()    on_data_ready()
//!  on_data_complete() / on_data_error()
//!
//!   Mailbox, Source, Subscription, Ticker ──► Bus (broadcast) ──► LogWriter ──► tracing
//! ```
//!
//! ### Delivery
//! ```text
//! emit(item)
//!   ├─► terminal already set? ─► ignore (debug log)
//!   ├─► history.push(item)
//!   └─► for each mailbox:
//!         idle      ─► queue, wake worker
//!         busy      ─► Unbounded: queue
//!                      DropNew:   discard            (ItemDropped)
//!                      Latest:    overwrite pending  (ItemReplaced)
//!                      Error:     close, fail listener with Overflow (Overflow)
//! ```
//!
//! ## Features
//! | Area              | Description                                                 | Key types / traits                              |
//! |-------------------|-------------------------------------------------------------|-------------------------------------------------|
//! | **Sources**       | Hot multicast with history, connectable and cold variants.  | [`Source`], [`ConnectableSource`], [`ColdSource`] |
//! | **Listeners**     | Items, completion and errors; closures or custom types.     | [`Listener`], [`ListenerFn`]                    |
//! | **Backpressure**  | Per-subscription policy fixed at subscribe time.            | [`BackpressurePolicy`]                          |
//! | **Scheduling**    | Cancellable periodic producer.                              | [`Ticker`], [`TickerHandle`]                    |
//! | **Diagnostics**   | Broadcast events, `tracing` writer.                         | [`Bus`], [`Event`], [`LogWriter`]               |
//! | **Errors**        | Typed stream errors.                                        | [`StreamError`]                                 |
//! | **Configuration** | Bus capacity, default policy, history.                      | [`SourceConfig`], [`SourceBuilder`]             |
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use rillflow::{BackpressurePolicy, ListenerFn, LogWriter, Source};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() {
//!     let source: Source<String> = Source::new("names");
//!     let _log = LogWriter::new().attach(source.bus());
//!
//!     let sub = source.subscribe_with(
//!         ListenerFn::new("printer", |name: Arc<String>| async move {
//!             println!("hello {name}");
//!         })
//!         .into_ref(),
//!         BackpressurePolicy::Unbounded,
//!     );
//!
//!     source.emit("ada".to_string());
//!     source.emit("grace".to_string());
//!     source.complete();
//!     sub.settled().await;
//! }
//! ```
mod backpressure;
mod config;
mod error;
mod events;
mod listeners;
mod sources;
mod ticker;

// ---- Public re-exports ----

pub use backpressure::BackpressurePolicy;
pub use config::SourceConfig;
pub use error::StreamError;
pub use events::{Bus, Event, EventKind};
pub use listeners::{Listener, ListenerFn, ListenerRef, LogWriter};
pub use sources::{
    ColdSource, ConnectableSource, Emitter, Source, SourceBuilder, Subscription, SubscriptionId,
};
pub use ticker::{Ticker, TickerExit, TickerHandle};
