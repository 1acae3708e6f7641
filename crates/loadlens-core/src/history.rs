//! Bounded sampling history.
//!
//! [`HistoryBuffer`] keeps the most recent N points in arrival order,
//! evicting from the head on overflow. One mutator (the pipeline loop),
//! no locking. Appending never fails.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::metrics::MetricSnapshot;

/// Default number of points retained.
pub const DEFAULT_CAPACITY: usize = 24;

/// Projection of one snapshot onto the charted channels, with a clock label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryPoint {
    /// `MM:SS` of the capture time.
    pub time: String,
    pub cpu: f64,
    pub ram: f64,
    pub temperature: f64,
    pub power: f64,
}

impl HistoryPoint {
    pub fn from_snapshot(snapshot: &MetricSnapshot) -> Self {
        Self {
            time: clock_label(snapshot.captured_unix_ms),
            cpu: snapshot.cpu,
            ram: snapshot.ram,
            temperature: snapshot.temperature,
            power: snapshot.power,
        }
    }
}

/// `MM:SS` wall-clock label for a Unix-epoch millisecond timestamp.
pub fn clock_label(unix_ms: u64) -> String {
    let secs = unix_ms / 1000;
    format!("{:02}:{:02}", (secs / 60) % 60, secs % 60)
}

/// Fixed-capacity FIFO of history points.
#[derive(Debug, Clone)]
pub struct HistoryBuffer {
    points: VecDeque<HistoryPoint>,
    capacity: usize,
}

impl HistoryBuffer {
    /// Capacity is at least 1.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self { points: VecDeque::with_capacity(capacity), capacity }
    }

    /// Append to the tail, evicting from the head past capacity.
    pub fn append(&mut self, point: HistoryPoint) {
        self.points.push_back(point);
        while self.points.len() > self.capacity {
            self.points.pop_front();
        }
    }

    /// The full ordered content, oldest first.
    pub fn snapshot(&self) -> Vec<HistoryPoint> {
        self.points.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for HistoryBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
