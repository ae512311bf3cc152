//! Sample timestamp handling.
//!
//! Media Foundation timestamps are in 100-nanosecond units. Capture
//! devices report them on their own clock, so every recording rebases them
//! to start at zero.

use std::time::Duration;

/// 100 ns ticks per millisecond.
pub const HNS_PER_MS: i64 = 10_000;

/// Milliseconds to 100 ns ticks.
pub fn ms_to_hns(ms: u32) -> i64 {
    i64::from(ms) * HNS_PER_MS
}

/// 100 ns ticks to a `Duration`; negative values clamp to zero.
pub fn hns_to_duration(hns: i64) -> Duration {
    Duration::from_nanos(hns.max(0) as u64 * 100)
}

/// Rebases timestamps so the first sample of a recording is at zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TimestampRebaser {
    base: Option<i64>,
}

impl TimestampRebaser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget the base; the next sample becomes time zero.
    pub fn reset(&mut self) {
        self.base = None;
    }

    /// Whether no sample has been seen since the last reset.
    pub fn is_first(&self) -> bool {
        self.base.is_none()
    }

    pub fn base(&self) -> Option<i64> {
        self.base
    }

    /// `timestamp - base`, taking the first timestamp seen as the base.
    pub fn rebase(&mut self, timestamp: i64) -> i64 {
        let base = *self.base.get_or_insert(timestamp);
        timestamp - base
    }
}

/// Rebasing plus a duration limit for synchronous recordings.
#[derive(Debug, Clone, Copy)]
pub struct RecordingClock {
    rebaser: TimestampRebaser,
    limit_hns: i64,
    last_hns: i64,
}

impl RecordingClock {
    pub fn new(duration_ms: u32) -> Self {
        Self {
            rebaser: TimestampRebaser::new(),
            limit_hns: ms_to_hns(duration_ms),
            last_hns: 0,
        }
    }

    /// Rebased time for a sample, or `None` once the limit is reached.
    pub fn admit(&mut self, timestamp: i64) -> Option<i64> {
        let rebased = self.rebaser.rebase(timestamp);
        if rebased >= self.limit_hns {
            return None;
        }
        self.last_hns = rebased;
        Some(rebased)
    }

    /// Rebased time of the last admitted sample.
    pub fn elapsed(&self) -> Duration {
        hns_to_duration(self.last_hns)
    }
}
