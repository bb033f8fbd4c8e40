//! # Listeners: the receiving end of a source.
//!
//! This module provides the [`Listener`] trait and built-in helpers.
//!
//! ## Architecture
//! ```text
//! Source::emit ──► Mailbox (per subscription) ──► worker ──► Listener::on_data_ready(item)
//!                                                       ├──► Listener::on_data_complete()
//!                                                       └──► Listener::on_data_error(&err)
//!
//! Bus (diagnostics) ──► LogWriter ──► tracing
//! ```
//!
//! ## Listener types
//! - **Custom listeners**: implement [`Listener`] on your own type
//! - **Closure listeners**: [`ListenerFn`] for quick wiring
//! - **Diagnostics**: [`LogWriter`] logs bus events, it is not a data listener

mod listener;
mod listener_fn;
mod log;

pub use listener::Listener;
pub use listener_fn::{ListenerFn, ListenerRef};
pub use log::LogWriter;
