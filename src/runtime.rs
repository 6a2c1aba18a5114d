use std::io::{BufRead, BufReader};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::time::{Duration, Instant};

use crate::summary::Summary;
use crate::tracker::SessionTracker;
use crate::util::count_non_whitespace;
use crate::{Count, Timestamp};

/// Unified event type consumed by the host loop
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PaceEvent {
    /// Content changed; carries the document's total non-whitespace count
    Activity(Count),
    ContextSwitch,
    Stop,
    Restart,
    Status,
    Summary,
    Quit,
    Tick,
}

/// Source of host events (content changes, commands)
pub trait PaceEventSource: Send + 'static {
    /// Block for up to `timeout` waiting for an event.
    /// Returns Ok(event) if an event arrives before the timeout, or Err(Timeout) if it expires.
    fn recv_timeout(&self, timeout: Duration) -> Result<PaceEvent, RecvTimeoutError>;
}

/// The text composed so far, reduced to what the tracker needs
#[derive(Debug, Clone, Default)]
pub struct Document {
    count: Count,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self) -> Count {
        self.count
    }

    /// Turn one input line into an event. Lines starting with `:` are commands,
    /// anything else is appended to the document.
    pub fn handle_line(&mut self, line: &str) -> Option<PaceEvent> {
        if let Some(command) = line.trim().strip_prefix(':') {
            return match command.trim() {
                "stop" => Some(PaceEvent::Stop),
                "restart" => Some(PaceEvent::Restart),
                "switch" => {
                    self.count = 0;
                    Some(PaceEvent::ContextSwitch)
                }
                "status" => Some(PaceEvent::Status),
                "summary" => Some(PaceEvent::Summary),
                "quit" | "q" => Some(PaceEvent::Quit),
                other => {
                    log::warn!("unknown command :{other}");
                    None
                }
            };
        }

        self.count += count_non_whitespace(line);
        Some(PaceEvent::Activity(self.count))
    }
}

/// Production event source reading composed text from stdin
pub struct StdinEventSource {
    rx: Receiver<PaceEvent>,
}

impl StdinEventSource {
    pub fn new() -> Self {
        Self::from_reader(BufReader::new(std::io::stdin()))
    }

    pub fn from_reader<R: BufRead + Send + 'static>(reader: R) -> Self {
        let (tx, rx) = mpsc::channel();

        std::thread::spawn(move || {
            let mut document = Document::new();
            for line in reader.lines() {
                let Ok(line) = line else { break };
                if let Some(event) = document.handle_line(&line) {
                    if tx.send(event).is_err() {
                        return;
                    }
                }
            }
            let _ = tx.send(PaceEvent::Quit);
        });

        Self { rx }
    }
}

impl Default for StdinEventSource {
    fn default() -> Self {
        Self::new()
    }
}

impl PaceEventSource for StdinEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<PaceEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// Test event source for unit tests
pub struct TestEventSource {
    rx: Receiver<PaceEvent>,
}

impl TestEventSource {
    pub fn new(rx: Receiver<PaceEvent>) -> Self {
        Self { rx }
    }
}

impl PaceEventSource for TestEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<PaceEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// Configurable ticker interface
pub trait Ticker: Send + Sync + 'static {
    fn interval(&self) -> Duration;
}

/// Fixed interval ticker
#[derive(Clone, Copy, Debug)]
pub struct FixedTicker {
    interval: Duration,
}

impl FixedTicker {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }

    pub fn from_millis(ms: u64) -> Self {
        Self::new(Duration::from_millis(ms))
    }
}

impl Ticker for FixedTicker {
    fn interval(&self) -> Duration {
        self.interval
    }
}

/// Wall-clock source in milliseconds
pub trait Clock {
    fn now_ms(&self) -> Timestamp;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> Timestamp {
        chrono::Utc::now().timestamp_millis()
    }
}

/// Runner that advances the host one event/tick at a time.
///
/// Ticks are scheduled against a deadline, so a steady stream of input does not
/// starve the heartbeat.
pub struct Runner<E: PaceEventSource, T: Ticker> {
    event_source: E,
    ticker: T,
    next_tick: Instant,
    disconnected: bool,
}

impl<E: PaceEventSource, T: Ticker> Runner<E, T> {
    pub fn new(event_source: E, ticker: T) -> Self {
        let next_tick = Instant::now() + ticker.interval();
        Self {
            event_source,
            ticker,
            next_tick,
            disconnected: false,
        }
    }

    /// Blocks until the next event, or returns Tick once the heartbeat is due
    pub fn step(&mut self) -> PaceEvent {
        let now = Instant::now();
        if now >= self.next_tick {
            return self.fire_tick(now);
        }

        if self.disconnected {
            std::thread::sleep(self.next_tick - now);
            return self.fire_tick(Instant::now());
        }

        match self.event_source.recv_timeout(self.next_tick - now) {
            Ok(ev) => ev,
            Err(RecvTimeoutError::Timeout) => self.fire_tick(Instant::now()),
            Err(RecvTimeoutError::Disconnected) => {
                self.disconnected = true;
                self.fire_tick(Instant::now())
            }
        }
    }

    fn fire_tick(&mut self, now: Instant) -> PaceEvent {
        self.next_tick += self.ticker.interval();
        // after a long stall, schedule from now instead of bursting
        if self.next_tick <= now {
            self.next_tick = now + self.ticker.interval();
        }
        PaceEvent::Tick
    }
}

/// What the host loop should do after an event
#[derive(Clone, Debug, PartialEq)]
pub enum Flow {
    Continue,
    ShowStatus,
    ShowSummary,
    /// A session was finalized by a stop or a document switch
    Ended(Summary),
    Quit,
}

/// Map one host event onto the tracker's entry points.
pub fn apply(tracker: &mut SessionTracker, event: &PaceEvent, now: Timestamp) -> Flow {
    match event {
        PaceEvent::Activity(count) => tracker.notify_activity(*count, now),
        PaceEvent::Tick => tracker.tick(now),
        PaceEvent::ContextSwitch => {
            if let Some(summary) = tracker.notify_context_switch(now) {
                return Flow::Ended(summary);
            }
        }
        PaceEvent::Stop => {
            if let Some(summary) = tracker.stop(now) {
                return Flow::Ended(summary);
            }
        }
        PaceEvent::Restart => tracker.restart(now),
        PaceEvent::Status => return Flow::ShowStatus,
        PaceEvent::Summary => return Flow::ShowSummary,
        PaceEvent::Quit => return Flow::Quit,
    }
    Flow::Continue
}
