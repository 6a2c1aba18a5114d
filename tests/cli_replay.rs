// Drives the compiled binary in replay mode; no terminal needed.

use assert_cmd::Command;
use std::fs;
use tempfile::tempdir;

const TRACE: &str = "t_ms,event,count\n\
                     0,activity,100\n\
                     2000,activity,120\n\
                     4000,activity,160\n\
                     5000,tick,\n\
                     6000,tick,\n";

#[test]
fn replay_prints_text_summary() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let trace = dir.path().join("trace.csv");
    fs::write(&trace, TRACE)?;
    let config = dir.path().join("config.json");

    let output = Command::cargo_bin("penpace")?
        .arg("--config")
        .arg(&config)
        .arg("--replay")
        .arg(&trace)
        .output()?;

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout)?;
    assert!(stdout.contains("Total time:     00:00:06"), "{stdout}");
    assert!(stdout.contains("Characters:     60"), "{stdout}");
    Ok(())
}

#[test]
fn replay_prints_json_summary() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let trace = dir.path().join("trace.csv");
    fs::write(&trace, format!("{TRACE}7000,stop,\n"))?;

    let output = Command::cargo_bin("penpace")?
        .arg("--config")
        .arg(dir.path().join("config.json"))
        .arg("--replay")
        .arg(&trace)
        .arg("--json")
        .output()?;

    assert!(output.status.success());
    let value: serde_json::Value = serde_json::from_slice(&output.stdout)?;
    assert_eq!(value["state"], "stopped");
    assert_eq!(value["session_count"], 60);
    assert_eq!(value["total_duration"], 7.0);
    Ok(())
}

#[test]
fn save_config_persists_valid_overrides_only() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let trace = dir.path().join("trace.csv");
    fs::write(&trace, "t_ms,event,count\n")?;
    let config = dir.path().join("config.json");

    Command::cargo_bin("penpace")?
        .arg("--config")
        .arg(&config)
        .args(["--idle-threshold", "30", "--stop-threshold", "oops", "--save-config"])
        .arg("--replay")
        .arg(&trace)
        .assert()
        .success();

    let saved: serde_json::Value = serde_json::from_slice(&fs::read(&config)?)?;
    assert_eq!(saved["idle_threshold_secs"], 30);
    assert_eq!(saved["stop_threshold_secs"], 120);
    Ok(())
}

#[test]
fn missing_trace_file_fails() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    Command::cargo_bin("penpace")?
        .arg("--config")
        .arg(dir.path().join("config.json"))
        .arg("--replay")
        .arg(dir.path().join("nope.csv"))
        .assert()
        .failure();
    Ok(())
}
