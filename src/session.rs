use serde::Serialize;

use crate::{Count, Seconds, Timestamp};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, strum_macros::Display)]
#[serde(rename_all = "lowercase")]
pub enum TrackerState {
    /// No session has started since the last reset
    #[default]
    Uninitialized,
    Active,
    /// Running, but nothing typed for longer than the idle threshold
    Idle,
    /// Accumulation frozen after the stop threshold passed without activity
    Paused,
    /// Frozen by an explicit stop
    Stopped,
}

impl TrackerState {
    /// True when duration accumulation is frozen
    pub fn is_paused(&self) -> bool {
        matches!(self, TrackerState::Paused | TrackerState::Stopped)
    }

    /// True once the idle threshold has passed, including after the session pauses
    pub fn is_idle(&self) -> bool {
        matches!(self, TrackerState::Idle | TrackerState::Paused)
    }
}

/// Timing and count state of the live session
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Session {
    pub start_time: Option<Timestamp>,
    /// Zero until the first activity
    pub last_activity_time: Timestamp,
    pub total_duration: Seconds,
    pub idle_duration: Seconds,
    pub effective_duration: Seconds,
    pub baseline_count: Option<Count>,
    pub session_count: Count,
    pub state: TrackerState,
}

impl Session {
    pub fn has_started(&self) -> bool {
        self.start_time.is_some()
    }

    pub(crate) fn recompute_effective(&mut self) {
        self.effective_duration = (self.total_duration - self.idle_duration).max(0.0);
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            total_duration: self.total_duration,
            idle_duration: self.idle_duration,
            effective_duration: self.effective_duration,
            session_count: self.session_count,
            state: self.state,
        }
    }
}

/// Read-only view handed to hosts for display
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Snapshot {
    pub total_duration: Seconds,
    pub idle_duration: Seconds,
    pub effective_duration: Seconds,
    pub session_count: Count,
    pub state: TrackerState,
}
