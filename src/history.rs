use std::collections::VecDeque;

use crate::{Count, Timestamp};

/// One recorded observation: when it happened and the session-relative count at that time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sample {
    pub ts: Timestamp,
    pub count: Count,
}

impl Sample {
    pub fn new(ts: Timestamp, count: Count) -> Self {
        Self { ts, count }
    }
}

impl From<(Timestamp, Count)> for Sample {
    fn from(v: (Timestamp, Count)) -> Self {
        Sample {
            ts: v.0,
            count: v.1,
        }
    }
}

impl From<Sample> for (Timestamp, Count) {
    fn from(s: Sample) -> Self {
        (s.ts, s.count)
    }
}

/// Arrival-ordered samples. Removal only ever happens at the front.
#[derive(Debug, Clone, Default)]
pub struct History {
    samples: VecDeque<Sample>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, sample: Sample) {
        self.samples.push_back(sample);
    }

    pub fn last(&self) -> Option<&Sample> {
        self.samples.back()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = &Sample> {
        self.samples.iter()
    }

    /// Drop leading samples older than `retention_ms` relative to `now`.
    /// Returns how many were removed.
    pub fn prune(&mut self, now: Timestamp, retention_ms: i64) -> usize {
        let mut removed = 0;
        while let Some(front) = self.samples.front() {
            if now - front.ts > retention_ms {
                self.samples.pop_front();
                removed += 1;
            } else {
                break;
            }
        }
        removed
    }

    /// Samples no older than `lookback_ms` and not earlier than `not_before`, in arrival order.
    pub fn window(&self, now: Timestamp, lookback_ms: i64, not_before: Timestamp) -> Vec<Sample> {
        self.samples
            .iter()
            .filter(|s| now - s.ts <= lookback_ms && s.ts >= not_before)
            .copied()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn history_of(points: &[(Timestamp, Count)]) -> History {
        let mut history = History::new();
        for &p in points {
            history.push(p.into());
        }
        history
    }

    #[test]
    fn test_sample_tuple_conversions() {
        let s: Sample = (1_500, 42).into();
        assert_eq!(s, Sample::new(1_500, 42));
        let t: (Timestamp, Count) = s.into();
        assert_eq!(t, (1_500, 42));
    }

    #[test]
    fn test_prune_drops_only_old_front_samples() {
        let mut history = history_of(&[(0, 0), (10_000, 5), (25_000, 9), (40_000, 12)]);

        let removed = history.prune(40_000, 30_000);

        assert_eq!(removed, 1);
        assert_eq!(history.len(), 3);
        assert_eq!(history.iter().next().map(|s| s.ts), Some(10_000));
    }

    #[test]
    fn test_prune_keeps_sample_exactly_at_retention_edge() {
        let mut history = history_of(&[(10_000, 1)]);
        assert_eq!(history.prune(40_000, 30_000), 0);
        assert_eq!(history.len(), 1);
    }

    #[test]
    fn test_prune_stops_at_first_recent_sample() {
        // an out-of-order stale sample behind a recent one is left alone
        let mut history = history_of(&[(35_000, 1), (1_000, 2)]);
        assert_eq!(history.prune(40_000, 30_000), 0);
        assert_eq!(history.len(), 2);
    }

    #[test]
    fn test_window_applies_lookback_and_session_start() {
        let history = history_of(&[(1_000, 0), (5_000, 3), (8_000, 6), (12_000, 9)]);

        let window = history.window(12_000, 10_000, 5_000);

        let ts: Vec<Timestamp> = window.iter().map(|s| s.ts).collect();
        assert_eq!(ts, vec![5_000, 8_000, 12_000]);
    }

    #[test]
    fn test_window_on_empty_history() {
        let history = History::new();
        assert!(history.window(0, 10_000, 0).is_empty());
        assert!(history.is_empty());
        assert!(history.last().is_none());
    }
}
