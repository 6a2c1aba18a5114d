use chrono::{DateTime, Local, TimeZone};
use serde::Serialize;
use std::fmt;

use crate::session::{Snapshot, TrackerState};
use crate::util::format_duration;
use crate::{Count, Seconds, Timestamp};

/// Exportable view of a session, taken at `generated_at`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub generated_at: DateTime<Local>,
    pub state: TrackerState,
    pub total_duration: Seconds,
    pub effective_duration: Seconds,
    pub idle_duration: Seconds,
    pub session_count: Count,
    pub average_rate: f64,
    pub instantaneous_rate: f64,
}

impl Summary {
    pub fn new(now: Timestamp, snapshot: Snapshot, average_rate: f64, instantaneous_rate: f64) -> Self {
        Self {
            generated_at: local_time(now),
            state: snapshot.state,
            total_duration: snapshot.total_duration,
            effective_duration: snapshot.effective_duration,
            idle_duration: snapshot.idle_duration,
            session_count: snapshot.session_count,
            average_rate,
            instantaneous_rate,
        }
    }
}

/// Millisecond timestamp as local time, falling back to the current time if out of range.
pub fn local_time(ts: Timestamp) -> DateTime<Local> {
    Local.timestamp_millis_opt(ts).single().unwrap_or_else(Local::now)
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Writing session ({})",
            self.generated_at.format("%Y-%m-%d %H:%M:%S")
        )?;
        writeln!(f, "Total time:     {}", format_duration(self.total_duration))?;
        writeln!(f, "Writing time:   {}", format_duration(self.effective_duration))?;
        writeln!(f, "Idle time:      {}", format_duration(self.idle_duration))?;
        writeln!(f, "Characters:     {}", self.session_count)?;
        write!(f, "Average speed:  {:.1} chars/hour", self.average_rate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot() -> Snapshot {
        Snapshot {
            total_duration: 3661.0,
            idle_duration: 61.0,
            effective_duration: 3600.0,
            session_count: 1200,
            state: TrackerState::Active,
        }
    }

    #[test]
    fn test_summary_text_block() {
        let summary = Summary::new(0, snapshot(), 1200.0, 0.0);
        let text = summary.to_string();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines.len(), 6);
        assert!(lines[0].starts_with("Writing session ("));
        assert_eq!(lines[1], "Total time:     01:01:01");
        assert_eq!(lines[2], "Writing time:   01:00:00");
        assert_eq!(lines[3], "Idle time:      00:01:01");
        assert_eq!(lines[4], "Characters:     1200");
        assert_eq!(lines[5], "Average speed:  1200.0 chars/hour");
    }

    #[test]
    fn test_summary_timestamp_matches_input() {
        let ts = 1_700_000_000_000;
        let summary = Summary::new(ts, snapshot(), 0.0, 0.0);
        assert_eq!(summary.generated_at.timestamp_millis(), ts);
    }

    #[test]
    fn test_summary_serializes_to_json() {
        let summary = Summary::new(0, snapshot(), 1200.0, 42.5);
        let value = serde_json::to_value(&summary).unwrap();
        assert_eq!(value["session_count"], 1200);
        assert_eq!(value["state"], "active");
        assert_eq!(value["instantaneous_rate"], 42.5);
        assert!(value["generated_at"].is_string());
    }
}
