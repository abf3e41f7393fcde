//! Frame-driven tick source.
//!
//! The host calls [`FrameClock::tick`] once per animation frame with its own
//! timestamp (milliseconds, e.g. from `requestAnimationFrame`). The clock turns
//! those into a monotonically increasing elapsed time and a per-tick delta in
//! seconds. Deltas larger than `max_delta` are clamped so a stalled tab does
//! not produce one huge step on the next frame.

use serde::Serialize;
use tracing::debug;

/// Default stall clamp, in seconds.
pub const DEFAULT_MAX_DELTA: f64 = 0.05;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FrameTick {
    /// Seconds since the previous tick, after clamping.
    pub delta: f64,
    /// Seconds since the previous tick, before clamping.
    pub raw: f64,
    /// Sum of all clamped deltas since the last reset.
    pub elapsed: f64,
    pub frame: u64,
    pub clamped: bool,
}

#[derive(Debug, Clone)]
pub struct FrameClock {
    max_delta: f64,
    last_timestamp_ms: Option<f64>,
    elapsed: f64,
    frame: u64,
}

impl FrameClock {
    pub fn new(max_delta: f64) -> Self {
        Self {
            max_delta,
            last_timestamp_ms: None,
            elapsed: 0.0,
            frame: 0,
        }
    }

    pub fn tick(&mut self, now_ms: f64) -> FrameTick {
        let raw = match self.last_timestamp_ms {
            Some(last) if now_ms.is_finite() && now_ms > last => (now_ms - last) / 1000.0,
            _ => 0.0,
        };
        if now_ms.is_finite() {
            self.last_timestamp_ms = Some(match self.last_timestamp_ms {
                Some(last) => last.max(now_ms),
                None => now_ms,
            });
        }

        let clamped = raw > self.max_delta;
        let delta = if clamped {
            debug!(raw, max = self.max_delta, "frame delta clamped after stall");
            self.max_delta
        } else {
            raw
        };

        self.elapsed += delta;
        self.frame += 1;

        FrameTick {
            delta,
            raw,
            elapsed: self.elapsed,
            frame: self.frame,
            clamped,
        }
    }

    /// Forgets the previous timestamp so the next tick reports a zero delta.
    /// Used when resuming so the paused interval is not replayed.
    pub fn rebase(&mut self) {
        self.last_timestamp_ms = None;
    }

    pub fn reset(&mut self) {
        self.last_timestamp_ms = None;
        self.elapsed = 0.0;
        self.frame = 0;
    }

    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }

    pub fn frame_count(&self) -> u64 {
        self.frame
    }

    pub fn max_delta(&self) -> f64 {
        self.max_delta
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_DELTA)
    }
}

/// Converts frame deltas into a count of fixed-interval firings.
#[derive(Debug, Clone, Default)]
pub struct IntervalTimer {
    pending: f64,
}

impl IntervalTimer {
    /// Adds `delta` seconds and returns how many whole `interval`s are now due.
    pub fn accumulate(&mut self, delta: f64, interval: f64) -> usize {
        if !(interval > 0.0) || !delta.is_finite() || delta <= 0.0 {
            return 0;
        }
        self.pending += delta;
        let due = (self.pending / interval).floor();
        self.pending -= due * interval;
        due as usize
    }

    pub fn clear(&mut self) {
        self.pending = 0.0;
    }

    pub fn pending(&self) -> f64 {
        self.pending
    }
}
