use crate::{Seconds, Timestamp};

/// Render seconds as `HH:MM:SS`. Hours are not wrapped at 24.
pub fn format_duration(seconds: Seconds) -> String {
    let whole = if seconds.is_finite() && seconds > 0.0 {
        seconds.floor() as u64
    } else {
        0
    };

    let hours = whole / 3600;
    let minutes = (whole % 3600) / 60;
    let secs = whole % 60;

    format!("{hours:02}:{minutes:02}:{secs:02}")
}

/// Seconds elapsed from `from` to `to`, negative when the clock went backwards.
pub fn secs_between(from: Timestamp, to: Timestamp) -> Seconds {
    (to - from) as f64 / 1000.0
}

/// Number of characters that are not whitespace.
pub fn count_non_whitespace(text: &str) -> u64 {
    text.chars().filter(|c| !c.is_whitespace()).count() as u64
}
