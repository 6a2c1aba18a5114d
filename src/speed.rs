use itertools::Itertools;

use crate::history::{History, Sample};
use crate::util::secs_between;
use crate::{Count, Timestamp};

const SECS_PER_HOUR: f64 = 3600.0;

/// Window sizes used for sampling, retention, smoothing and decay, all in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EstimatorWindows {
    /// Samples closer together than this are not recorded
    pub min_sample_interval_ms: i64,
    /// Samples older than this are pruned from history
    pub retention_ms: i64,
    /// Only samples this recent contribute to the rate
    pub lookback_ms: i64,
    /// While idle, the rate fades to zero over this span
    pub decay_window_ms: i64,
}

impl Default for EstimatorWindows {
    fn default() -> Self {
        Self {
            min_sample_interval_ms: 1_000,
            retention_ms: 30_000,
            lookback_ms: 10_000,
            decay_window_ms: 5_000,
        }
    }
}

/// Smoothed composition speed over a short, recency weighted window of samples.
#[derive(Debug, Clone, Default)]
pub struct SpeedEstimator {
    history: History,
    windows: EstimatorWindows,
}

impl SpeedEstimator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_windows(windows: EstimatorWindows) -> Self {
        Self {
            history: History::new(),
            windows,
        }
    }

    pub fn windows(&self) -> &EstimatorWindows {
        &self.windows
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn clear(&mut self) {
        self.history.clear();
    }

    /// Record a sample unless one was taken less than `min_sample_interval_ms` ago,
    /// then prune anything past retention.
    pub fn record_sample(&mut self, now: Timestamp, count: Count) {
        let due = match self.history.last() {
            None => true,
            Some(last) => now - last.ts >= self.windows.min_sample_interval_ms,
        };

        if due {
            self.history.push(Sample::new(now, count));
            log::debug!("recorded sample count={count} at {now}");
        }

        self.history.prune(now, self.windows.retention_ms);
    }

    /// Instantaneous rate in units per hour.
    ///
    /// Consecutive samples inside the lookback window (and not before `session_start`)
    /// form segments. Each segment's speed is weighted by its length and how recent it
    /// is. While idle, the result decays linearly to zero over the decay window.
    pub fn instantaneous_rate(
        &self,
        now: Timestamp,
        session_start: Timestamp,
        is_idle: bool,
        last_activity_time: Timestamp,
    ) -> f64 {
        let window = self
            .history
            .window(now, self.windows.lookback_ms, session_start);

        if window.len() < 2 {
            return 0.0;
        }

        let lookback = self.windows.lookback_ms as f64;
        let (weighted_sum, total_weight) = window
            .iter()
            .tuple_windows()
            .filter_map(|(prev, curr)| {
                let delta_time = secs_between(prev.ts, curr.ts);
                if delta_time <= 0.0 {
                    return None;
                }
                let delta_count = curr.count as f64 - prev.count as f64;
                let speed = delta_count / delta_time * SECS_PER_HOUR;
                let recency = (1.0 - (now - curr.ts) as f64 / lookback).clamp(0.0, 1.0);
                let weight = delta_time * (0.5 + 0.5 * recency);
                Some((speed * weight, weight))
            })
            .fold((0.0, 0.0), |(sum, total), (sw, w)| (sum + sw, total + w));

        if total_weight <= 0.0 {
            return 0.0;
        }

        let rate = weighted_sum / total_weight;

        if is_idle {
            rate * self.idle_decay(now, last_activity_time)
        } else {
            rate
        }
    }

    fn idle_decay(&self, now: Timestamp, last_activity_time: Timestamp) -> f64 {
        let idle_secs = secs_between(last_activity_time, now);
        let decay_secs = self.windows.decay_window_ms as f64 / 1000.0;
        (1.0 - idle_secs / decay_secs).max(0.0)
    }
}
