use clap::{error::ErrorKind, CommandFactory, Parser};
use penpace::{
    replay::replay,
    runtime::{apply, Clock, FixedTicker, Flow, PaceEvent, Runner, StdinEventSource, SystemClock},
    summary::Summary,
    Config, ConfigStore, FileConfigStore, SessionTracker, SettingField,
};
use std::{error::Error, fs::File, path::PathBuf};

/// writing-session tracker: idle time, effective time and composition speed
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "Tracks a writing session from text typed on stdin (or a recorded trace): total, idle and effective time, plus smoothed and average characters per hour. Lines starting with ':' are commands: :status, :summary, :stop, :restart, :switch, :quit."
)]
pub struct Cli {
    /// config file to use instead of the default location
    #[clap(short = 'c', long)]
    config: Option<PathBuf>,

    /// heartbeat period in milliseconds
    #[clap(long)]
    update_interval_ms: Option<String>,

    /// seconds without typing before time counts as idle
    #[clap(long)]
    idle_threshold: Option<String>,

    /// seconds without typing before the session pauses
    #[clap(long)]
    stop_threshold: Option<String>,

    /// write the effective settings back to the config file
    #[clap(long)]
    save_config: bool,

    /// replay a recorded CSV trace (t_ms,event,count) instead of reading stdin
    #[clap(short = 'r', long)]
    replay: Option<PathBuf>,

    /// print summaries as JSON
    #[clap(long)]
    json: bool,

    /// print the status line on every heartbeat
    #[clap(short = 'w', long)]
    watch: bool,
}

impl Cli {
    /// Layer command-line overrides on the stored configuration.
    /// A rejected value is reported and the stored one kept.
    fn resolve_config(&self, mut config: Config) -> Config {
        let mut pending: Vec<(SettingField, &str)> = [
            (SettingField::UpdateIntervalMs, &self.update_interval_ms),
            (SettingField::IdleThresholdSecs, &self.idle_threshold),
            (SettingField::StopThresholdSecs, &self.stop_threshold),
        ]
        .into_iter()
        .filter_map(|(field, raw)| raw.as_deref().map(|raw| (field, raw)))
        .collect();

        // thresholds are checked against each other, so retry until nothing more applies
        loop {
            let before = pending.len();
            pending.retain(|&(field, raw)| config.set(field, raw).is_err());
            if pending.is_empty() || pending.len() == before {
                break;
            }
        }

        for (field, raw) in pending {
            if let Err(e) = config.set(field, raw) {
                log::warn!("ignoring {field} override: {e}");
            }
        }
        config
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    let store = match &cli.config {
        Some(path) => FileConfigStore::with_path(path),
        None => FileConfigStore::new(),
    };
    let config = cli.resolve_config(store.load());

    if cli.save_config {
        store.save(&config)?;
        log::info!("saved settings to {}", store.path().display());
    }

    let mut tracker = SessionTracker::with_config(config)?;

    if let Some(path) = &cli.replay {
        let file = File::open(path).unwrap_or_else(|e| {
            let mut cmd = Cli::command();
            cmd.error(ErrorKind::Io, format!("cannot open {}: {e}", path.display()))
                .exit()
        });

        let outcome = replay(file, &mut tracker)?;
        for summary in &outcome.ended {
            print_summary(summary, cli.json)?;
        }
        if tracker.session().has_started() {
            let now = outcome.last_ts.unwrap_or_else(|| SystemClock.now_ms());
            print_summary(&tracker.summary(now), cli.json)?;
        }
        return Ok(());
    }

    run_interactive(&cli, &mut tracker)
}

fn run_interactive(cli: &Cli, tracker: &mut SessionTracker) -> Result<(), Box<dyn Error>> {
    let clock = SystemClock;
    let ticker = FixedTicker::from_millis(tracker.config().update_interval_ms);
    let mut runner = Runner::new(StdinEventSource::new(), ticker);

    loop {
        let event = runner.step();
        let now = clock.now_ms();

        match apply(tracker, &event, now) {
            Flow::Continue => {
                if cli.watch && event == PaceEvent::Tick && tracker.session().has_started() {
                    eprintln!("{}", tracker.status_line(now));
                }
            }
            Flow::ShowStatus => println!("{}", tracker.status_line(now)),
            Flow::ShowSummary => print_summary(&tracker.summary(now), cli.json)?,
            Flow::Ended(summary) => print_summary(&summary, cli.json)?,
            Flow::Quit => {
                if let Some(summary) = tracker.end_session(now) {
                    print_summary(&summary, cli.json)?;
                }
                break;
            }
        }
    }

    Ok(())
}

fn print_summary(summary: &Summary, json: bool) -> Result<(), Box<dyn Error>> {
    if json {
        println!("{}", serde_json::to_string_pretty(summary)?);
    } else {
        println!("{summary}");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_defaults() {
        let cli = Cli::parse_from(["penpace"]);
        assert!(cli.replay.is_none());
        assert!(!cli.json);
        assert!(!cli.save_config);
        assert_eq!(cli.resolve_config(Config::default()), Config::default());
    }

    #[test]
    fn cli_overrides_apply_valid_values() {
        let cli = Cli::parse_from([
            "penpace",
            "--update-interval-ms",
            "500",
            "--idle-threshold",
            "20",
            "--stop-threshold",
            "300",
        ]);
        let cfg = cli.resolve_config(Config::default());
        assert_eq!(cfg.update_interval_ms, 500);
        assert_eq!(cfg.idle_threshold_secs, 20);
        assert_eq!(cfg.stop_threshold_secs, 300);
    }

    #[test]
    fn cli_overrides_apply_regardless_of_order() {
        let cli = Cli::parse_from(["penpace", "--idle-threshold", "200", "--stop-threshold", "300"]);
        let cfg = cli.resolve_config(Config::default());
        assert_eq!(cfg.idle_threshold_secs, 200);
        assert_eq!(cfg.stop_threshold_secs, 300);
    }

    #[test]
    fn cli_overrides_reject_invalid_values() {
        let cli = Cli::parse_from([
            "penpace",
            "--update-interval-ms",
            "fast",
            "--idle-threshold",
            "0",
            "--stop-threshold",
            "5",
        ]);
        assert_eq!(cli.resolve_config(Config::default()), Config::default());
    }

    #[test]
    fn cli_parses_replay_and_flags() {
        let cli = Cli::parse_from(["penpace", "-r", "trace.csv", "--json", "-w"]);
        assert_eq!(cli.replay, Some(PathBuf::from("trace.csv")));
        assert!(cli.json);
        assert!(cli.watch);
    }

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }
}
