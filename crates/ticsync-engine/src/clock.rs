//! Wall-clock to logical-step conversion.

use ticsync_core::TICRATE;

/// Convert elapsed milliseconds plus a signed latency offset into whole
/// logical steps at [`TICRATE`], truncating toward zero.
pub fn ms_to_steps(elapsed_ms: u64, offset_ms: i32) -> i64 {
    let ms = elapsed_ms as i64 + offset_ms as i64;
    ms * TICRATE as i64 / 1000
}

/// Step clock anchored at the session's start time.
///
/// Only the networked bounded policy feeds a non-zero offset; every other
/// configuration passes `0`.
#[derive(Clone, Copy, Debug)]
pub struct ClockAdapter {
    origin_ms: u64,
}

impl ClockAdapter {
    /// Anchor step zero at `origin_ms`.
    pub fn new(origin_ms: u64) -> Self {
        Self { origin_ms }
    }

    /// Logical steps elapsed at `now_ms`, with `offset_ms` applied.
    ///
    /// Times before the origin count as zero elapsed.
    pub fn steps_at(&self, now_ms: u64, offset_ms: i32) -> i64 {
        ms_to_steps(now_ms.saturating_sub(self.origin_ms), offset_ms)
    }

    /// The anchoring time.
    pub fn origin_ms(&self) -> u64 {
        self.origin_ms
    }
}
