//! Builder for [`Source`] and [`ColdSource`].
//!
//! Lets several sources share one diagnostic [`Bus`] so a single
//! [`LogWriter`](crate::LogWriter) observes all of them.

use std::future::Future;
use std::sync::Arc;

use crate::backpressure::BackpressurePolicy;
use crate::config::SourceConfig;
use crate::events::Bus;
use crate::sources::{ColdSource, Emitter, Source};

/// Builder for sources.
///
/// ## Example
/// ```rust
/// use rillflow::{BackpressurePolicy, Bus, Source};
///
/// let bus = Bus::new(256);
/// let prices: Source<f64> = Source::<f64>::builder("prices")
///     .with_policy(BackpressurePolicy::Latest)
///     .with_bus(bus.clone())
///     .build();
/// assert_eq!(prices.name(), "prices");
/// ```
#[derive(Debug)]
pub struct SourceBuilder {
    name: Arc<str>,
    cfg: SourceConfig,
    bus: Option<Bus>,
}

impl SourceBuilder {
    pub fn new(name: impl Into<Arc<str>>) -> Self {
        Self {
            name: name.into(),
            cfg: SourceConfig::default(),
            bus: None,
        }
    }

    pub fn with_config(mut self, cfg: SourceConfig) -> Self {
        self.cfg = cfg;
        self
    }

    /// Default policy for `subscribe()`.
    pub fn with_policy(mut self, policy: BackpressurePolicy) -> Self {
        self.cfg.default_policy = policy;
        self
    }

    pub fn without_history(mut self) -> Self {
        self.cfg.record_history = false;
        self
    }

    /// Publishes events on `bus` instead of a private one.
    pub fn with_bus(mut self, bus: Bus) -> Self {
        self.bus = Some(bus);
        self
    }

    pub fn build<T>(self) -> Source<T>
    where
        T: Send + Sync + 'static,
    {
        let (name, cfg, bus) = self.into_parts();
        Source::from_parts(name, cfg, bus)
    }

    /// Builds a cold source whose `producer` runs once per subscription.
    pub fn build_cold<T, F, Fut>(self, producer: F) -> ColdSource<T>
    where
        T: Send + Sync + 'static,
        F: Fn(Emitter<T>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let (name, cfg, bus) = self.into_parts();
        ColdSource::from_parts(name, cfg, bus, producer)
    }

    fn into_parts(self) -> (Arc<str>, SourceConfig, Bus) {
        let bus = self
            .bus
            .unwrap_or_else(|| Bus::new(self.cfg.bus_capacity_clamped()));
        (self.name, self.cfg, bus)
    }
}
