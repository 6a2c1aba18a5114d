use std::sync::mpsc;
use std::time::Duration;

use penpace::runtime::{apply, FixedTicker, Flow, PaceEvent, Runner, TestEventSource};
use penpace::{SessionTracker, TrackerState};

// Headless integration using the internal runtime + tracker without stdin.
// Wall time is simulated: every step advances a synthetic clock.
#[test]
fn headless_writing_flow_tracks_session() {
    let mut tracker = SessionTracker::new();

    let (tx, rx) = mpsc::channel();
    let es = TestEventSource::new(rx);
    // long enough that only queued events are delivered
    let ticker = FixedTicker::new(Duration::from_secs(60));
    let mut runner = Runner::new(es, ticker);

    for count in [100, 110, 125, 140] {
        tx.send(PaceEvent::Activity(count)).unwrap();
    }
    tx.send(PaceEvent::Quit).unwrap();

    let mut now = 0;
    let mut ended = None;
    for _ in 0..100u32 {
        let event = runner.step();
        match apply(&mut tracker, &event, now) {
            Flow::Quit => {
                ended = tracker.end_session(now);
                break;
            }
            _ => now += 1_000,
        }
    }

    let summary = ended.expect("a session should have been running");
    assert_eq!(summary.session_count, 40);
    assert_eq!(now, 4_000);
    assert_eq!(summary.total_duration, 4.0);
    assert_eq!(summary.idle_duration, 0.0);
    assert_eq!(tracker.state(), TrackerState::Stopped);
}

#[test]
fn headless_ticks_drive_idle_and_pause() {
    let mut tracker = SessionTracker::new();
    tracker.notify_activity(50, 0);

    let (_tx, rx) = mpsc::channel();
    let es = TestEventSource::new(rx);
    let mut runner = Runner::new(es, FixedTicker::from_millis(1));

    // each heartbeat is one simulated second
    let mut now = 0;
    let mut saw_idle = false;
    for _ in 0..200u32 {
        if let PaceEvent::Tick = runner.step() {
            now += 1_000;
            tracker.tick(now);
            saw_idle |= tracker.state() == TrackerState::Idle;
        }
        if tracker.state() == TrackerState::Paused {
            break;
        }
    }

    assert!(saw_idle, "session should pass through idle");
    assert_eq!(tracker.state(), TrackerState::Paused);
    assert_eq!(now, 121_000);

    let snap = tracker.snapshot();
    assert_eq!(snap.total_duration, 120.0);
    // idle ticks at 11s..=121s
    assert_eq!(snap.idle_duration, 111.0);
    assert_eq!(snap.effective_duration, 9.0);
}
