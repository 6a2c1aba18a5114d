use crate::config::{Config, ConfigError, SettingField};
use crate::session::{Session, Snapshot, TrackerState};
use crate::speed::{EstimatorWindows, SpeedEstimator};
use crate::summary::Summary;
use crate::util::{format_duration, secs_between};
use crate::{Count, Timestamp};

const SECS_PER_HOUR: f64 = 3600.0;

/// Owns the live session and drives its state machine.
///
/// Hosts feed it content changes (`notify_activity`) and heartbeats (`tick`), always passing
/// the current wall-clock time in milliseconds. Nothing here reads a clock on its own.
#[derive(Debug, Clone, Default)]
pub struct SessionTracker {
    session: Session,
    estimator: SpeedEstimator,
    config: Config,
}

impl SessionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: Config) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            ..Self::default()
        })
    }

    pub fn with_estimator_windows(mut self, windows: EstimatorWindows) -> Self {
        self.estimator = SpeedEstimator::with_windows(windows);
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Replace the configuration. An invalid one is rejected and the current one kept.
    pub fn configure(&mut self, config: Config) -> Result<(), ConfigError> {
        config.validate()?;
        self.config = config;
        Ok(())
    }

    /// Apply one user-edited setting, keeping the previous value on error.
    pub fn update_setting(&mut self, field: SettingField, input: &str) -> Result<(), ConfigError> {
        self.config.set(field, input).inspect_err(|e| {
            log::warn!("rejected setting: {e}");
        })
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn estimator(&self) -> &SpeedEstimator {
        &self.estimator
    }

    pub fn state(&self) -> TrackerState {
        self.session.state
    }

    pub fn snapshot(&self) -> Snapshot {
        self.session.snapshot()
    }

    /// Host entry point for content changes.
    pub fn notify_activity(&mut self, current_total_count: Count, now: Timestamp) {
        self.on_activity(current_total_count, now);
    }

    /// Host entry point for the periodic heartbeat.
    pub fn tick(&mut self, now: Timestamp) {
        self.on_tick(now);
    }

    /// The user moved to another document. Returns the finished session's summary.
    pub fn notify_context_switch(&mut self, now: Timestamp) -> Option<Summary> {
        log::info!("context switch at {now}");
        let summary = self.end_session(now);
        self.reset();
        summary
    }

    /// Explicit stop: freeze the session. Typing afterwards starts a new one.
    pub fn stop(&mut self, now: Timestamp) -> Option<Summary> {
        self.end_session(now)
    }

    /// Explicit restart: discard everything.
    pub fn restart(&mut self, now: Timestamp) {
        log::info!("restart at {now}");
        self.reset();
    }

    pub fn on_activity(&mut self, count: Count, now: Timestamp) {
        // an empty document is never activity
        if count == 0 {
            return;
        }

        if self.session.state == TrackerState::Paused {
            if let Some(start) = self.session.start_time.as_mut() {
                let stop_ms = self.config.stop_threshold_secs as i64 * 1000;
                let pause_gap_ms = (now - self.session.last_activity_time) - stop_ms;
                *start += pause_gap_ms;
                log::info!(
                    "resuming after pause, start shifted by {:.1}s",
                    pause_gap_ms as f64 / 1000.0
                );
            }
            self.session.state = TrackerState::Active;
        }

        if self.session.start_time.is_none() {
            self.session = Session {
                start_time: Some(now),
                baseline_count: Some(count),
                ..Session::default()
            };
            log::debug!("session started at {now} with baseline {count}");
        } else if self.session.baseline_count.is_none() {
            self.session.baseline_count = Some(count);
        }

        let baseline = self.session.baseline_count.unwrap_or(count);
        self.session.session_count = count.saturating_sub(baseline);
        self.session.last_activity_time = now;

        if self.session.state == TrackerState::Idle {
            log::debug!("leaving idle at {now}");
        }
        self.session.state = TrackerState::Active;

        self.estimator
            .record_sample(now, self.session.session_count);
    }

    pub fn on_tick(&mut self, now: Timestamp) {
        let Some(start) = self.session.start_time else {
            return;
        };
        if self.session.state.is_paused() {
            return;
        }

        let elapsed = secs_between(start, now).max(0.0);
        let gap = secs_between(self.session.last_activity_time, now);

        if gap > self.config.idle_threshold_secs as f64 {
            if self.session.state != TrackerState::Idle {
                log::debug!("entering idle after {gap:.1}s without activity");
                self.session.state = TrackerState::Idle;
            }
            self.session.idle_duration += self.config.tick_secs();

            if gap > self.config.stop_threshold_secs as f64 {
                log::info!("pausing after {gap:.1}s without activity");
                self.session.state = TrackerState::Paused;
                // total stays frozen at the last good value
                self.session.recompute_effective();
                return;
            }
        } else if self.session.state == TrackerState::Idle {
            log::debug!("idle cleared at {now}");
            self.session.state = TrackerState::Active;
        }

        self.session.total_duration = elapsed;
        self.session.recompute_effective();
    }

    /// Freeze the session. Durations stay readable until `reset`.
    ///
    /// Returns the final summary, taken before the counts are cleared.
    pub fn end_session(&mut self, now: Timestamp) -> Option<Summary> {
        let start = self.session.start_time?;
        let instantaneous = self.instantaneous_rate(now);

        self.session.start_time = None;
        self.session.total_duration = secs_between(start, now).max(0.0);
        self.session.last_activity_time = 0;
        self.session.recompute_effective();
        self.session.state = TrackerState::Stopped;

        let summary = Summary::new(now, self.snapshot(), self.average_rate(), instantaneous);

        self.session.baseline_count = None;
        self.session.session_count = 0;

        log::info!(
            "session ended: total {} effective {}",
            format_duration(self.session.total_duration),
            format_duration(self.session.effective_duration)
        );
        Some(summary)
    }

    pub fn reset(&mut self) {
        self.session = Session::default();
        self.estimator.clear();
        log::debug!("tracker reset");
    }

    /// Smoothed current speed in units per hour, zero without a running session.
    pub fn instantaneous_rate(&self, now: Timestamp) -> f64 {
        let Some(start) = self.session.start_time else {
            return 0.0;
        };
        self.estimator.instantaneous_rate(
            now,
            start,
            self.session.state.is_idle(),
            self.session.last_activity_time,
        )
    }

    /// Session count over effective time, in units per hour.
    pub fn average_rate(&self) -> f64 {
        if self.session.effective_duration > 0.0 {
            self.session.session_count as f64 / (self.session.effective_duration / SECS_PER_HOUR)
        } else {
            0.0
        }
    }

    pub fn summary(&self, now: Timestamp) -> Summary {
        Summary::new(
            now,
            self.snapshot(),
            self.average_rate(),
            self.instantaneous_rate(now),
        )
    }

    /// Plain text block for clipboard or document insertion.
    pub fn export_summary(&self, now: Timestamp) -> String {
        self.summary(now).to_string()
    }

    /// One-line status, in the order a status bar shows it.
    pub fn status_line(&self, now: Timestamp) -> String {
        let s = &self.session;
        format!(
            "[{}] total {} | idle {} | writing {} | count {} | now {:.1}/h | avg {:.1}/h",
            s.state,
            format_duration(s.total_duration),
            format_duration(s.idle_duration),
            format_duration(s.effective_duration),
            s.session_count,
            self.instantaneous_rate(now),
            self.average_rate(),
        )
    }
}
