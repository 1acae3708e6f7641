//! Abstract metric source trait and the synthetic walk.
//!
//! Every source implements [`MetricSource`]: metadata via [`SourceInfo`]
//! plus one snapshot per sampling tick. The synthetic variant advances a
//! bounded random walk; the provider-backed variant lives in
//! [`crate::provider`].

use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::metrics::{step_value, unix_ms_now, Channel, MetricSnapshot};

/// Metadata about a metric source.
#[derive(Debug, Clone)]
pub struct SourceInfo {
    /// Unique identifier (e.g. `"synthetic_walk"`).
    pub name: &'static str,
    /// One-line human-readable description.
    pub description: &'static str,
    /// Whether readings are generated locally rather than fetched.
    pub synthetic: bool,
}

/// Trait that every metric source must implement.
#[async_trait]
pub trait MetricSource: Send {
    /// Source metadata.
    fn info(&self) -> &SourceInfo;

    /// Produce the reading for the current sampling tick.
    ///
    /// Never fails: sources that depend on an external collaborator retain
    /// their previous reading when the collaborator is unavailable.
    async fn sample(&mut self) -> MetricSnapshot;

    /// Convenience: name from info.
    fn name(&self) -> &'static str {
        self.info().name
    }
}

static SYNTHETIC_INFO: SourceInfo = SourceInfo {
    name: "synthetic_walk",
    description: "Bounded per-channel random walk from the canonical initial reading",
    synthetic: true,
};

/// Synthetic source: independent bounded random walk per channel.
///
/// Each tick moves every channel by a uniform draw in
/// `[-movement, +movement]`, rounded to one decimal and clamped to the
/// channel bounds. Seedable for reproducible runs.
pub struct SyntheticSource {
    current: MetricSnapshot,
    rng: StdRng,
}

impl SyntheticSource {
    pub fn new() -> Self {
        Self::from_rng(StdRng::from_os_rng())
    }

    /// Reproducible walk for tests and recorded comparisons.
    pub fn with_seed(seed: u64) -> Self {
        Self::from_rng(StdRng::seed_from_u64(seed))
    }

    fn from_rng(rng: StdRng) -> Self {
        Self { current: MetricSnapshot::initial(unix_ms_now()), rng }
    }

    fn advance(&mut self) -> MetricSnapshot {
        // Capture timestamps never run backwards within one source.
        let now = unix_ms_now().max(self.current.captured_unix_ms);
        let mut next = self.current.clone();
        next.captured_unix_ms = now;
        for channel in Channel::ALL {
            let bounds = channel.bounds();
            let delta = self.rng.random_range(-bounds.movement..=bounds.movement);
            next.set(channel, step_value(self.current.get(channel), delta, bounds));
        }
        self.current = next.clone();
        next
    }
}

impl Default for SyntheticSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MetricSource for SyntheticSource {
    fn info(&self) -> &SourceInfo {
        &SYNTHETIC_INFO
    }

    async fn sample(&mut self) -> MetricSnapshot {
        self.advance()
    }
}
