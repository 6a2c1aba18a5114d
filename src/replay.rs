use serde::Deserialize;
use std::io::Read;
use thiserror::Error;

use crate::runtime::{apply, Flow, PaceEvent};
use crate::summary::Summary;
use crate::tracker::SessionTracker;
use crate::{Count, Timestamp};

#[derive(Error, Debug)]
pub enum ReplayError {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("line {line}: activity without a count")]
    MissingCount { line: u64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TraceEvent {
    Activity,
    Tick,
    Switch,
    Stop,
    Restart,
}

/// One row of a recorded trace: `t_ms,event,count`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TraceRecord {
    pub t_ms: Timestamp,
    pub event: TraceEvent,
    pub count: Option<Count>,
}

impl TraceRecord {
    fn to_event(&self, line: u64) -> Result<PaceEvent, ReplayError> {
        Ok(match self.event {
            TraceEvent::Activity => {
                let count = self.count.ok_or(ReplayError::MissingCount { line })?;
                PaceEvent::Activity(count)
            }
            TraceEvent::Tick => PaceEvent::Tick,
            TraceEvent::Switch => PaceEvent::ContextSwitch,
            TraceEvent::Stop => PaceEvent::Stop,
            TraceEvent::Restart => PaceEvent::Restart,
        })
    }
}

/// What a replay left behind
#[derive(Debug, Clone, Default)]
pub struct ReplayOutcome {
    /// Timestamp of the last record, if any
    pub last_ts: Option<Timestamp>,
    /// Final summaries of sessions ended by `stop` or `switch` records
    pub ended: Vec<Summary>,
}

/// Feed a CSV trace (with header) to the tracker in file order.
pub fn replay<R: Read>(reader: R, tracker: &mut SessionTracker) -> Result<ReplayOutcome, ReplayError> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut outcome = ReplayOutcome::default();
    for (idx, result) in rdr.deserialize::<TraceRecord>().enumerate() {
        let record = result?;
        // header is line 1
        let event = record.to_event(idx as u64 + 2)?;
        if let Flow::Ended(summary) = apply(tracker, &event, record.t_ms) {
            outcome.ended.push(summary);
        }
        outcome.last_ts = Some(record.t_ms);
    }

    log::debug!(
        "replayed trace up to {:?}, {} session(s) ended",
        outcome.last_ts,
        outcome.ended.len()
    );
    Ok(outcome)
}
