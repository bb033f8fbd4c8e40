//! # Listener trait.
//!
//! Provides [`Listener`], the capability set every subscriber implements:
//! items, completion and errors.
//!
//! Each subscription gets:
//! - **Dedicated worker task** (runs independently of the producer)
//! - **Per-subscription mailbox** governed by a [`BackpressurePolicy`](crate::BackpressurePolicy)
//! - **Panic isolation** (panics are caught and reported as `EventKind::ListenerPanicked`)
//!
//! ## Rules
//! - A slow listener only affects its own mailbox.
//! - Callbacks are invoked sequentially (FIFO) per subscription, never concurrently.
//! - After `on_data_complete` or `on_data_error` nothing else is delivered.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use async_trait::async_trait;
//! use rillflow::{Listener, StreamError};
//!
//! struct Printer;
//!
//! #[async_trait]
//! impl Listener<String> for Printer {
//!     async fn on_data_ready(&self, item: Arc<String>) {
//!         println!("got {item}");
//!     }
//!
//!     async fn on_data_error(&self, error: &StreamError) {
//!         eprintln!("stream failed: {error}");
//!     }
//!
//!     fn name(&self) -> &'static str { "printer" }
//! }
//! ```

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::StreamError;

/// Receiver of a source's notifications.
///
/// ### Implementation requirements
/// - Prefer async waits over blocking the executor; a blocking callback stalls the
///   worker thread it runs on (the producer is never blocked).
/// - Handle errors internally; a panic is caught but the item is lost.
#[async_trait]
pub trait Listener<T>: Send + Sync + 'static
where
    T: Send + Sync + 'static,
{
    /// Handles one item.
    ///
    /// Called from the subscription's worker task, not in the producer context.
    async fn on_data_ready(&self, item: Arc<T>);

    /// Called once when the source completes. Default: no-op.
    async fn on_data_complete(&self) {}

    /// Called once when the source fails or this subscription overflows. Default: no-op.
    async fn on_data_error(&self, error: &StreamError) {
        let _ = error;
    }

    /// Returns the listener name used in logs and events.
    ///
    /// The default uses `type_name::<Self>()`, which can be verbose - override it when possible.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}
