//! # Backpressure policies for subscriptions.
//!
//! [`BackpressurePolicy`] decides what a subscription does with an item that
//! arrives while its listener is still **busy** (an item is pending or a callback
//! is in flight).
//!
//! - [`BackpressurePolicy::Unbounded`] queue it; every item is delivered (default).
//! - [`BackpressurePolicy::Error`] fail the subscription with an overflow error if a
//!   callback is still running.
//! - [`BackpressurePolicy::DropNew`] discard the new item.
//! - [`BackpressurePolicy::Latest`] keep only the newest undelivered item.
//!
//! ## Choosing the right policy
//!
//! **Every item matters** (audit, bookkeeping):
//! ```text
//! BackpressurePolicy::Unbounded  → nothing lost, memory grows under sustained overload
//! ```
//!
//! **Consumer must keep up or stop** (contract violations should be loud):
//! ```text
//! BackpressurePolicy::Error      → first arrival during a callback ends the subscription
//! ```
//!
//! **Sampling, UI refresh, sensor readings**:
//! ```text
//! BackpressurePolicy::DropNew    → finish the current item, ignore what came meanwhile
//! BackpressurePolicy::Latest     → finish the current item, then jump to the newest
//! ```

use std::fmt;

/// Policy applied when an item arrives while the listener is busy.
///
/// Fixed at subscribe time; a subscription never changes policy.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum BackpressurePolicy {
    /// Queue every item (default).
    #[default]
    Unbounded,
    /// Fail the subscription on the first item that arrives while a callback is running.
    ///
    /// Items emitted back to back before the worker picks them up are queued.
    Error,
    /// Discard items that arrive while busy.
    DropNew,
    /// Keep the most recent undelivered item, overwriting older ones.
    Latest,
}

impl BackpressurePolicy {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            BackpressurePolicy::Unbounded => "unbounded",
            BackpressurePolicy::Error => "error",
            BackpressurePolicy::DropNew => "drop_new",
            BackpressurePolicy::Latest => "latest",
        }
    }
}

impl fmt::Display for BackpressurePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_unbounded() {
        assert_eq!(BackpressurePolicy::default(), BackpressurePolicy::Unbounded);
    }

    #[test]
    fn labels_are_stable() {
        assert_eq!(BackpressurePolicy::Unbounded.as_label(), "unbounded");
        assert_eq!(BackpressurePolicy::Error.as_label(), "error");
        assert_eq!(BackpressurePolicy::Latest.as_label(), "latest");
    }

    #[test]
    fn display_uses_label() {
        assert_eq!(BackpressurePolicy::DropNew.to_string(), "drop_new");
    }
}
