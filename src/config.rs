//! # Source configuration.
//!
//! Provides [`SourceConfig`], the settings shared by a [`Source`](crate::Source)
//! and everything derived from it (converters, cold runs, tickers).
//!
//! ## Sentinel values
//! - `bus_capacity = 0` → clamped to 1 by [`SourceConfig::bus_capacity_clamped`]

use crate::backpressure::BackpressurePolicy;

/// Configuration for a source.
///
/// ## Field semantics
/// - `bus_capacity`: diagnostic event bus ring buffer size (min 1; clamped)
/// - `default_policy`: policy used by `subscribe()` when none is given
/// - `record_history`: keep every emitted item for replay/debugging
#[derive(Clone, Debug)]
pub struct SourceConfig {
    /// Capacity of the diagnostic event bus broadcast ring buffer.
    ///
    /// Slow bus receivers that lag behind more than `bus_capacity` events
    /// observe `Lagged` and skip older events.
    pub bus_capacity: usize,

    /// Backpressure policy applied by [`Source::subscribe`](crate::Source::subscribe).
    ///
    /// [`Source::subscribe_with`](crate::Source::subscribe_with) overrides it per subscription.
    pub default_policy: BackpressurePolicy,

    /// Whether the source keeps the ordered history of every emitted item.
    ///
    /// Disable for long-running background producers where the history would
    /// only grow.
    pub record_history: bool,
}

impl SourceConfig {
    /// Returns a bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }
}

impl Default for SourceConfig {
    /// Default configuration:
    ///
    /// - `bus_capacity = 1024`
    /// - `default_policy = BackpressurePolicy::Unbounded`
    /// - `record_history = true`
    fn default() -> Self {
        Self {
            bus_capacity: 1024,
            default_policy: BackpressurePolicy::default(),
            record_history: true,
        }
    }
}
