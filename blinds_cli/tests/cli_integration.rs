use assert_cmd::prelude::*;
use predicates::prelude::*;
use rstest::rstest;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::tempdir;

// Short travel so motion commands finish well under a second in sim mode
fn write_config(dir: &Path, tilt: bool) -> PathBuf {
    let state = dir.join("state.toml");
    let mut toml = format!(
        r#"
[cover]
name = "Test blind"

[switches]
up = "switch.test_up"
down = "switch.test_down"

[travel]
up_s = 0.4
down_s = 0.3

[control]
poll_interval_ms = 10

[state]
file = "{}"
"#,
        state.display().to_string().replace('\\', "/")
    );
    if tilt {
        toml.push_str("\n[tilt]\nopen_s = 0.2\nclosed_s = 0.2\n");
    }
    let path = dir.join("cfg.toml");
    fs::write(&path, toml).unwrap();
    path
}

fn blinds(cfg: &Path) -> Command {
    let mut cmd = Command::cargo_bin("blinds").unwrap();
    cmd.arg("--config").arg(cfg).arg("--log-level").arg("warn");
    cmd
}

fn run_json(cfg: &Path, args: &[&str]) -> serde_json::Value {
    let out = blinds(cfg).arg("--json").args(args).output().unwrap();
    assert!(
        out.status.success(),
        "{args:?} failed: {}",
        String::from_utf8_lossy(&out.stderr)
    );
    let stdout = String::from_utf8(out.stdout).unwrap();
    let line = stdout.lines().last().expect("one JSON line");
    serde_json::from_str(line).unwrap()
}

#[rstest]
#[case(&["--help"], 0, "Usage:", "stdout")]
#[case(&["self-check"], 0, "OK", "stdout")]
#[case(&["set-position"], 2, "required", "stderr")]
#[case(&["set-position", "--position", "101"], 2, "invalid value", "stderr")]
#[case(&["open-tilt"], 1, "no tilt axis", "stderr")]
fn cli_table_cases(
    #[case] args: &[&str],
    #[case] exit_code: i32,
    #[case] needle: &str,
    #[case] stream: &str,
) {
    let dir = tempdir().unwrap();
    let cfg = write_config(dir.path(), false);

    let assert = blinds(&cfg).args(args).assert().code(exit_code);
    match stream {
        "stdout" => {
            assert.stdout(predicate::str::contains(needle));
        }
        "stderr" => {
            assert.stderr(predicate::str::contains(needle));
        }
        other => panic!("unknown stream: {other}"),
    }
}

#[test]
fn open_travels_to_fully_open_and_persists() {
    let dir = tempdir().unwrap();
    let cfg = write_config(dir.path(), false);

    let v = run_json(&cfg, &["open"]);
    assert_eq!(v["command"], "open");
    assert_eq!(v["outcome"], "moving_up");
    assert_eq!(v["position"], 100);
    assert_eq!(v["is_closed"], false);
    assert_eq!(v["is_opening"], false);
    assert!(v["ticks"].as_u64().unwrap() > 0);

    let saved: toml::Value =
        toml::from_str(&fs::read_to_string(dir.path().join("state.toml")).unwrap()).unwrap();
    assert_eq!(saved["position"].as_integer(), Some(100));
}

#[test]
fn position_survives_between_runs() {
    let dir = tempdir().unwrap();
    let cfg = write_config(dir.path(), false);

    let v = run_json(&cfg, &["set-position", "--position", "50"]);
    assert_eq!(v["position"], 50);

    let v = run_json(&cfg, &["status"]);
    assert_eq!(v["position"], 50);
    assert!(v["outcome"].is_null());
    assert!(v["ticks"].is_null());

    // moving down from the restored estimate
    let v = run_json(&cfg, &["close"]);
    assert_eq!(v["outcome"], "moving_down");
    assert_eq!(v["position"], 0);
    assert_eq!(v["is_closed"], true);
}

#[test]
fn close_when_closed_does_not_move() {
    let dir = tempdir().unwrap();
    let cfg = write_config(dir.path(), false);

    let v = run_json(&cfg, &["close"]);
    assert_eq!(v["outcome"], "at_target");
    assert_eq!(v["position"], 0);
    assert!(v["ticks"].is_null());
}

#[test]
fn set_known_position_overrides_estimate_without_motion() {
    let dir = tempdir().unwrap();
    let cfg = write_config(dir.path(), true);

    let v = run_json(&cfg, &["set-known-position", "--position", "30"]);
    assert_eq!(v["position"], 30);
    assert!(v["ticks"].is_null());

    let v = run_json(&cfg, &["set-known-tilt", "--position", "70"]);
    assert_eq!(v["position"], 30);
    assert_eq!(v["tilt_position"], 70);

    let v = run_json(&cfg, &["status"]);
    assert_eq!(v["position"], 30);
    assert_eq!(v["tilt_position"], 70);
}

#[test]
fn tilt_commands_move_the_slats_only() {
    let dir = tempdir().unwrap();
    let cfg = write_config(dir.path(), true);

    let v = run_json(&cfg, &["set-known-position", "--position", "40"]);
    assert_eq!(v["tilt_position"], 0);

    let v = run_json(&cfg, &["open-tilt"]);
    assert_eq!(v["outcome"], "moving_up");
    assert_eq!(v["tilt_position"], 100);
    assert_eq!(v["position"], 40);

    let v = run_json(&cfg, &["set-tilt", "--position", "25"]);
    assert_eq!(v["outcome"], "moving_down");
    assert_eq!(v["tilt_position"], 25);
}

#[test]
fn text_output_names_the_cover() {
    let dir = tempdir().unwrap();
    let cfg = write_config(dir.path(), false);

    blinds(&cfg)
        .arg("open")
        .assert()
        .success()
        .stdout(predicate::str::contains("Test blind: position 100"));
}

#[test]
fn unavailable_switch_fails_the_command() {
    let dir = tempdir().unwrap();
    let cfg = write_config(dir.path(), false);

    blinds(&cfg)
        .env("BLINDS_SIM_UNAVAILABLE", "up")
        .arg("open")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("A switch is unavailable"));

    // nothing moved, nothing saved
    assert!(!dir.path().join("state.toml").exists());
}

#[test]
fn missing_config_is_reported() {
    let dir = tempdir().unwrap();
    let mut cmd = Command::cargo_bin("blinds").unwrap();
    cmd.arg("--config")
        .arg(dir.path().join("nope.toml"))
        .arg("status")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Could not read the config file"));
}

#[test]
fn invalid_config_is_reported() {
    let dir = tempdir().unwrap();
    let cfg = dir.path().join("cfg.toml");
    fs::write(
        &cfg,
        "[switches]\nup = \"a\"\ndown = \"a\"\n[travel]\nup_s = 1.0\ndown_s = 1.0\n",
    )
    .unwrap();

    blinds(&cfg)
        .arg("status")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Configuration is invalid"));
}
