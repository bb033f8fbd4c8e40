//! Error types delivered to listeners and reported on the event bus.
//!
//! [`StreamError`] covers the three ways a subscription can end badly:
//!
//! - [`StreamError::Overflow`]: the `Error` backpressure policy saw an item arrive
//!   while its listener was still busy. Terminal for **that subscription only**.
//! - [`StreamError::Producer`]: the producer called [`Source::fail`](crate::Source::fail).
//!   Terminal for the **whole source**: every listener receives it.
//! - [`StreamError::ListenerPanicked`]: a listener callback panicked. It is caught at
//!   the delivery boundary and published as an event; it never reaches other listeners.
//!
//! Helpers (`as_label`, `as_message`) mirror each other so the same error can be
//! used for log lines and for metric labels.

use std::sync::Arc;

use thiserror::Error;

use crate::backpressure::BackpressurePolicy;

/// # Errors surfaced by sources and subscriptions.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StreamError {
    /// The listener could not keep up and its policy does not tolerate that.
    #[error("backpressure overflow: listener '{listener}' could not keep up (policy={policy})")]
    Overflow {
        /// Name of the listener that overflowed.
        listener: &'static str,
        /// Policy that was in force (always [`BackpressurePolicy::Error`] today).
        policy: BackpressurePolicy,
    },

    /// The producer terminated the source with an error.
    #[error("producer failed: {reason}")]
    Producer {
        /// Reason given to [`Source::fail`](crate::Source::fail).
        reason: Arc<str>,
    },

    /// A listener callback panicked while handling a notification.
    #[error("listener '{listener}' panicked: {info}")]
    ListenerPanicked {
        /// Name of the listener.
        listener: &'static str,
        /// Panic payload rendered as text.
        info: String,
    },
}

impl StreamError {
    /// Creates a producer error from any string-like reason.
    pub fn producer(reason: impl Into<Arc<str>>) -> Self {
        StreamError::Producer {
            reason: reason.into(),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use rillflow::StreamError;
    ///
    /// let err = StreamError::producer("disk gone");
    /// assert_eq!(err.as_label(), "stream_producer_failed");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            StreamError::Overflow { .. } => "stream_overflow",
            StreamError::Producer { .. } => "stream_producer_failed",
            StreamError::ListenerPanicked { .. } => "stream_listener_panicked",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            StreamError::Overflow { listener, policy } => {
                format!("overflow: listener={listener} policy={policy}")
            }
            StreamError::Producer { reason } => format!("producer: {reason}"),
            StreamError::ListenerPanicked { listener, info } => {
                format!("panic: listener={listener} info={info}")
            }
        }
    }

    /// Indicates whether the error ends the source for every listener.
    ///
    /// Only producer failures are global; overflow and panics stay local.
    ///
    /// # Example
    /// ```
    /// use rillflow::{BackpressurePolicy, StreamError};
    ///
    /// assert!(StreamError::producer("boom").is_terminal_for_source());
    ///
    /// let local = StreamError::Overflow { listener: "slow", policy: BackpressurePolicy::Error };
    /// assert!(!local.is_terminal_for_source());
    /// ```
    pub fn is_terminal_for_source(&self) -> bool {
        matches!(self, StreamError::Producer { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overflow_message_mentions_backpressure() {
        let err = StreamError::Overflow {
            listener: "slow",
            policy: BackpressurePolicy::Error,
        };
        assert!(err.to_string().starts_with("backpressure overflow"));
        assert_eq!(err.as_label(), "stream_overflow");
        assert_eq!(err.as_message(), "overflow: listener=slow policy=error");
    }

    #[test]
    fn producer_error_keeps_reason() {
        let err = StreamError::producer("upstream closed");
        assert_eq!(err.to_string(), "producer failed: upstream closed");
        assert!(err.is_terminal_for_source());
    }

    #[test]
    fn panics_are_local() {
        let err = StreamError::ListenerPanicked {
            listener: "printer",
            info: "boom".into(),
        };
        assert!(!err.is_terminal_for_source());
        assert_eq!(err.as_label(), "stream_listener_panicked");
    }
}
