//! Interrupt-driven pulse-rate estimation.
//!
//! Split in two halves: [`EdgeCapture`] runs in interrupt context and only
//! stamps timestamps (bounce rejection is a single compare), while
//! [`RateEstimator`] runs in the main control cycle and does all the
//! arithmetic: instantaneous rate, slew-limited smoothing for presentation,
//! and the logging-period average.

use core::cell::Cell;

use critical_section::Mutex;

use crate::config::{
    PULSE_MIN_GAP_MS, PULSES_PER_REV, RPM_MAX_STEP, RPM_SAMPLE_MS, RPM_TIMEOUT_MS,
};

/// The last two accepted edge timestamps.
#[derive(Clone, Copy, Debug, Default)]
pub struct EdgeSnapshot {
    pub last_ms: Option<u64>,
    pub prev_ms: Option<u64>,
}

/// Timestamp capture cell shared between the pulse-edge interrupt and the
/// main cycle.
///
/// The interrupt only writes and the main cycle only reads, so a short
/// critical section around each access is the entire synchronization story;
/// it exists to keep the two-word snapshot from tearing.
pub struct EdgeCapture {
    edges: Mutex<Cell<EdgeSnapshot>>,
}

impl EdgeCapture {
    pub const fn new() -> Self {
        Self {
            edges: Mutex::new(Cell::new(EdgeSnapshot {
                last_ms: None,
                prev_ms: None,
            })),
        }
    }

    /// Record one qualifying edge. Interrupt context; edges closer than the
    /// minimum gap are rejected as contact bounce.
    pub fn on_edge(&self, now_ms: u64) {
        critical_section::with(|cs| {
            let cell = self.edges.borrow(cs);
            let mut snapshot = cell.get();
            if let Some(last) = snapshot.last_ms {
                if now_ms.wrapping_sub(last) < PULSE_MIN_GAP_MS {
                    return;
                }
                snapshot.prev_ms = Some(last);
            }
            snapshot.last_ms = Some(now_ms);
            cell.set(snapshot);
        });
    }

    /// Torn-read-free snapshot for the sampler.
    pub fn snapshot(&self) -> EdgeSnapshot {
        critical_section::with(|cs| self.edges.borrow(cs).get())
    }
}

/// Main-cycle half of the estimator.
pub struct RateEstimator {
    last_sample_ms: u64,
    display_rpm: u32,
    accum_sum: u64,
    accum_count: u32,
}

impl RateEstimator {
    pub const fn new() -> Self {
        Self {
            last_sample_ms: 0,
            display_rpm: 0,
            accum_sum: 0,
            accum_count: 0,
        }
    }

    /// Instantaneous rate from the two most recent accepted edges, or None
    /// when there is no fresh, plausible interval this tick.
    pub fn instantaneous(edges: EdgeSnapshot, now_ms: u64) -> Option<u32> {
        let last = edges.last_ms?;
        let prev = edges.prev_ms?;
        if now_ms.saturating_sub(last) > RPM_TIMEOUT_MS {
            return None;
        }
        let interval_ms = last.saturating_sub(prev);
        if interval_ms == 0 || interval_ms > RPM_TIMEOUT_MS {
            return None;
        }
        Some((60_000 / (interval_ms * PULSES_PER_REV as u64)) as u32)
    }

    /// Run one sampler tick if the cadence is due.
    ///
    /// Every tick accumulates the smoothed value so the per-record average
    /// reflects the whole logging period, not just the instant of sampling.
    pub fn poll(&mut self, edges: EdgeSnapshot, now_ms: u64) {
        if now_ms.wrapping_sub(self.last_sample_ms) < RPM_SAMPLE_MS {
            return;
        }
        self.last_sample_ms = now_ms;

        let timed_out = match edges.last_ms {
            Some(last) => now_ms.saturating_sub(last) > RPM_TIMEOUT_MS,
            None => true,
        };
        if timed_out {
            self.display_rpm = 0;
        } else if let Some(instant_rpm) = Self::instantaneous(edges, now_ms) {
            self.display_rpm = slew(self.display_rpm, instant_rpm, RPM_MAX_STEP);
        }
        // No fresh interval: hold the current value this tick.

        self.accum_sum += self.display_rpm as u64;
        self.accum_count += 1;
    }

    /// Smoothed value for presentation.
    pub fn display_rpm(&self) -> u32 {
        self.display_rpm
    }

    /// Consume the logging-period average, resetting the accumulator.
    pub fn take_average(&mut self) -> u32 {
        let average = if self.accum_count == 0 {
            self.display_rpm
        } else {
            (self.accum_sum / self.accum_count as u64) as u32
        };
        self.accum_sum = 0;
        self.accum_count = 0;
        average
    }

    /// Drop accumulated samples at a session boundary.
    pub fn reset_average(&mut self) {
        self.accum_sum = 0;
        self.accum_count = 0;
    }
}

impl Default for RateEstimator {
    fn default() -> Self {
        Self::new()
    }
}

/// Move `current` toward `target` by at most `max_step`.
fn slew(current: u32, target: u32, max_step: u32) -> u32 {
    if target > current {
        current + (target - current).min(max_step)
    } else {
        current - (current - target).min(max_step)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn edges(prev_ms: u64, last_ms: u64) -> EdgeSnapshot {
        EdgeSnapshot {
            last_ms: Some(last_ms),
            prev_ms: Some(prev_ms),
        }
    }

    #[test]
    fn edges_500ms_apart_at_two_pulses_per_rev_read_60() {
        assert_eq!(RateEstimator::instantaneous(edges(1_000, 1_500), 1_600), Some(60));
    }

    #[test]
    fn zero_and_stale_intervals_are_not_data() {
        // Duplicate timestamp.
        assert_eq!(RateEstimator::instantaneous(edges(1_500, 1_500), 1_600), None);
        // Interval older than the timeout.
        assert_eq!(RateEstimator::instantaneous(edges(0, 5_000), 5_100), None);
        // Last edge itself is stale.
        assert_eq!(RateEstimator::instantaneous(edges(1_000, 1_500), 9_000), None);
    }

    #[test]
    fn display_clears_to_zero_after_timeout() {
        let mut estimator = RateEstimator::new();
        estimator.poll(edges(1_000, 1_500), 1_600);
        assert_eq!(estimator.display_rpm(), 60);

        estimator.poll(edges(1_000, 1_500), 4_000);
        assert_eq!(estimator.display_rpm(), 0);
    }

    #[test]
    fn display_is_slew_limited() {
        let mut estimator = RateEstimator::new();
        // 10 ms interval at 2 pulses/rev is 3000 rpm instantaneous.
        let fast = edges(1_000, 1_010);
        estimator.poll(fast, 1_033);
        assert_eq!(estimator.display_rpm(), RPM_MAX_STEP);
        estimator.poll(fast, 1_066);
        assert_eq!(estimator.display_rpm(), 2 * RPM_MAX_STEP);
    }

    #[test]
    fn sampler_cadence_is_rate_limited() {
        let mut estimator = RateEstimator::new();
        estimator.poll(edges(1_000, 1_500), 1_600);
        // Within the same cadence window, nothing accumulates.
        estimator.poll(edges(1_000, 1_500), 1_610);
        assert_eq!(estimator.take_average(), 60);
    }

    #[test]
    fn average_consumes_and_resets() {
        let mut estimator = RateEstimator::new();
        estimator.poll(edges(1_000, 1_500), 1_600);
        estimator.poll(edges(1_000, 1_500), 1_640);
        assert_eq!(estimator.take_average(), 60);
        // Accumulator was reset; with no new ticks the fallback is the
        // current display value.
        assert_eq!(estimator.take_average(), 60);
    }

    #[test]
    fn edge_capture_rejects_bounce() {
        let capture = EdgeCapture::new();
        capture.on_edge(1_000);
        capture.on_edge(1_004); // bounce, inside the minimum gap
        capture.on_edge(1_500);

        let snapshot = capture.snapshot();
        assert_eq!(snapshot.prev_ms, Some(1_000));
        assert_eq!(snapshot.last_ms, Some(1_500));
    }
}
