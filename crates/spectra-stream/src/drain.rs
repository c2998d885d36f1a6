//! Adaptive drain rate for consumers of a [`SpectrumRing`].
//!
//! A consumer normally removes one row per tick. While the backlog exceeds
//! the threshold it removes two, which bounds latency growth after a burst
//! without changing the steady-state rate.

use serde::{Deserialize, Serialize};

use crate::ring::SpectrumRing;

/// Backlog above which consumers catch up.
pub const DEFAULT_BACKLOG_THRESHOLD: usize = 16;

/// Rows-per-tick policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DrainPolicy {
    /// Rows drained per tick while the backlog is at or below the threshold.
    pub normal_rate: usize,
    /// Rows drained per tick while the backlog exceeds the threshold.
    pub catch_up_rate: usize,
    /// Backlog size that triggers catch-up.
    pub backlog_threshold: usize,
}

impl Default for DrainPolicy {
    fn default() -> Self {
        Self {
            normal_rate: 1,
            catch_up_rate: 2,
            backlog_threshold: DEFAULT_BACKLOG_THRESHOLD,
        }
    }
}

impl DrainPolicy {
    /// Policy with the default rates and a custom threshold.
    pub fn with_threshold(backlog_threshold: usize) -> Self {
        Self {
            backlog_threshold,
            ..Self::default()
        }
    }

    /// Rows to drain this tick given the current backlog.
    pub fn rate_for(&self, available: usize) -> usize {
        let rate = if available > self.backlog_threshold {
            self.catch_up_rate
        } else {
            self.normal_rate
        };
        rate.min(available)
    }
}

/// Applies a [`DrainPolicy`] tick by tick and remembers what it did.
#[derive(Debug, Clone, Default)]
pub struct Drainer {
    policy: DrainPolicy,
    last_rate: usize,
    ticks: u64,
    catch_up_ticks: u64,
    rows_drained: u64,
}

impl Drainer {
    /// Creates a drainer for `policy`.
    pub fn new(policy: DrainPolicy) -> Self {
        Self {
            policy,
            ..Self::default()
        }
    }

    /// The policy in use.
    pub fn policy(&self) -> &DrainPolicy {
        &self.policy
    }

    /// Rows drained on the most recent tick.
    pub fn last_rate(&self) -> usize {
        self.last_rate
    }

    /// Ticks seen so far.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Ticks that drained at the catch-up rate.
    pub fn catch_up_ticks(&self) -> u64 {
        self.catch_up_ticks
    }

    /// Rows drained so far.
    pub fn rows_drained(&self) -> u64 {
        self.rows_drained
    }

    /// Drains one tick's worth of rows, passing each to `visit` oldest first.
    /// Returns the number of rows drained.
    pub fn tick(&mut self, ring: &mut SpectrumRing, mut visit: impl FnMut(&[f32])) -> usize {
        let available = ring.available();
        let rate = self.policy.rate_for(available);
        if available > self.policy.backlog_threshold {
            self.catch_up_ticks += 1;
        }

        let block = ring.assemble_block(rate);
        let rows = block.rows();
        block.iter().for_each(&mut visit);
        ring.consume(rows);

        if rows != self.last_rate && self.ticks > 0 {
            tracing::trace!(from = self.last_rate, to = rows, available, "drainer: rate changed");
        }
        self.last_rate = rows;
        self.ticks += 1;
        self.rows_drained += rows as u64;
        rows
    }
}
