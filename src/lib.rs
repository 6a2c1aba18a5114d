// Library surface for the host binary, integration tests and embedding.
// The core (tracker, speed, session) never reads a clock; callers pass `now`.
pub mod app_dirs;
pub mod config;
pub mod history;
pub mod replay;
pub mod runtime;
pub mod session;
pub mod speed;
pub mod summary;
pub mod tracker;
pub mod util;

pub use config::{Config, ConfigError, ConfigStore, FileConfigStore, SettingField};
pub use session::{Snapshot, TrackerState};
pub use speed::{EstimatorWindows, SpeedEstimator};
pub use tracker::SessionTracker;
pub use util::format_duration;

/// Wall-clock milliseconds. May jump backwards.
pub type Timestamp = i64;
/// Durations in seconds
pub type Seconds = f64;
/// Non-whitespace character count
pub type Count = u64;
