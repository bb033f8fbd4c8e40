//! Backpressure: per-subscription policies and the mailbox that applies them.
//!
//! ## Contents
//! - [`BackpressurePolicy`] what to do with items that arrive while a listener is busy
//! - `Mailbox` (crate-private) the per-subscription buffer + delivery worker
//!
//! ## Quick wiring
//! ```text
//! Source::emit(item)
//!      └─► Mailbox::deliver(item)            (non-blocking, decides per policy)
//!              ├─ idle    → pending.push, wake worker
//!              └─ busy    → Unbounded: push | DropNew: drop | Latest: overwrite | Error: fail
//! worker task
//!      └─► listener.on_data_ready(item)      (one at a time, FIFO)
//! ```

mod mailbox;
mod policy;

pub(crate) use mailbox::Mailbox;
pub use policy::BackpressurePolicy;
