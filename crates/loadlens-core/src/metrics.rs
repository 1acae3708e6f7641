//! Metric channels and snapshots.
//!
//! A [`MetricSnapshot`] is one synchronized reading of every monitored
//! channel. Each [`Channel`] declares the bounds and per-tick movement used
//! by the synthetic walk; provider-backed readings are reported as-is.

use serde::{Deserialize, Serialize};

/// A named telemetry dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    /// Processor utilization, percent.
    Cpu,
    /// Memory utilization, percent.
    Ram,
    /// Disk activity, percent.
    Disk,
    /// Network activity, percent.
    Network,
    /// Package temperature, degrees Celsius.
    Temperature,
    /// Power draw, watts.
    Power,
}

impl Channel {
    /// Every channel, in canonical order.
    pub const ALL: [Channel; 6] = [
        Channel::Cpu,
        Channel::Ram,
        Channel::Disk,
        Channel::Network,
        Channel::Temperature,
        Channel::Power,
    ];

    /// Valid range and per-tick movement for this channel.
    pub fn bounds(self) -> ChannelBounds {
        match self {
            Channel::Cpu => ChannelBounds { min: 8.0, max: 95.0, movement: 6.0, unit: "%" },
            Channel::Ram => ChannelBounds { min: 15.0, max: 98.0, movement: 5.0, unit: "%" },
            Channel::Disk => ChannelBounds { min: 20.0, max: 96.0, movement: 4.0, unit: "%" },
            Channel::Network => ChannelBounds { min: 4.0, max: 92.0, movement: 8.0, unit: "%" },
            Channel::Temperature => {
                ChannelBounds { min: 36.0, max: 89.0, movement: 2.2, unit: "°C" }
            }
            Channel::Power => ChannelBounds { min: 38.0, max: 180.0, movement: 7.0, unit: "W" },
        }
    }
}

impl std::fmt::Display for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cpu => write!(f, "cpu"),
            Self::Ram => write!(f, "ram"),
            Self::Disk => write!(f, "disk"),
            Self::Network => write!(f, "network"),
            Self::Temperature => write!(f, "temperature"),
            Self::Power => write!(f, "power"),
        }
    }
}

/// Declared range and synthetic-walk step size for one channel.
#[derive(Debug, Clone, Copy)]
pub struct ChannelBounds {
    pub min: f64,
    pub max: f64,
    /// Maximum absolute change per sampling tick.
    pub movement: f64,
    /// Display unit.
    pub unit: &'static str,
}

/// One synchronized reading of all channels at a point in time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricSnapshot {
    pub cpu: f64,
    pub ram: f64,
    pub disk: f64,
    pub network: f64,
    pub temperature: f64,
    pub power: f64,
    /// Capture time, milliseconds since the Unix epoch.
    pub captured_unix_ms: u64,
}

impl MetricSnapshot {
    /// The reading every source starts from.
    pub fn initial(captured_unix_ms: u64) -> Self {
        Self {
            cpu: 34.0,
            ram: 47.0,
            disk: 43.0,
            network: 31.0,
            temperature: 58.0,
            power: 68.0,
            captured_unix_ms,
        }
    }

    /// Value of one channel.
    pub fn get(&self, channel: Channel) -> f64 {
        match channel {
            Channel::Cpu => self.cpu,
            Channel::Ram => self.ram,
            Channel::Disk => self.disk,
            Channel::Network => self.network,
            Channel::Temperature => self.temperature,
            Channel::Power => self.power,
        }
    }

    /// Set one channel.
    pub fn set(&mut self, channel: Channel, value: f64) {
        match channel {
            Channel::Cpu => self.cpu = value,
            Channel::Ram => self.ram = value,
            Channel::Disk => self.disk = value,
            Channel::Network => self.network = value,
            Channel::Temperature => self.temperature = value,
            Channel::Power => self.power = value,
        }
    }

    /// Whether every channel lies within its declared bounds.
    ///
    /// Holds for synthetic readings by construction. Provider-backed
    /// readings may fall outside (absent channels are reported as zero).
    pub fn in_bounds(&self) -> bool {
        Channel::ALL.iter().all(|&ch| {
            let b = ch.bounds();
            let v = self.get(ch);
            v >= b.min && v <= b.max
        })
    }
}

/// Round to one decimal place.
pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Advance one channel value by `delta`, rounding then clamping to bounds.
///
/// Pure; the caller supplies the random draw. For any `delta` the result
/// stays within `[bounds.min, bounds.max]`.
pub fn step_value(previous: f64, delta: f64, bounds: ChannelBounds) -> f64 {
    round1(previous + delta).clamp(bounds.min, bounds.max)
}

/// Current wall-clock time in milliseconds since the Unix epoch.
pub fn unix_ms_now() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
