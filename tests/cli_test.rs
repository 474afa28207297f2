use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;

fn trackwatch() -> Command {
    Command::cargo_bin("trackwatch").unwrap()
}

#[test]
fn check_lists_bindings() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("a.wav"), b"RIFF").unwrap();
    let map = dir.path().join("tracks.json");
    fs::write(&map, r#"{"1": "a.wav"}"#).unwrap();

    trackwatch()
        .arg("check")
        .arg(&map)
        .assert()
        .success()
        .stdout(predicate::str::contains("Song number 1 bound to"))
        .stdout(predicate::str::contains("Track map OK (1 song(s))"));
}

#[test]
fn check_rejects_missing_song() {
    let dir = tempfile::tempdir().unwrap();
    let map = dir.path().join("tracks.json");
    fs::write(&map, r#"{"4": "missing.ogg"}"#).unwrap();

    trackwatch()
        .arg("check")
        .arg(&map)
        .assert()
        .failure()
        .stderr(predicate::str::contains("missing.ogg"));
}

#[test]
fn watch_refuses_to_start_without_tracks() {
    let dir = tempfile::tempdir().unwrap();
    let trigger = dir.path().join("scene.txt");
    fs::write(&trigger, "1").unwrap();

    trackwatch()
        .current_dir(dir.path())
        .arg("watch")
        .arg("--trigger")
        .arg(&trigger)
        .arg("--settings")
        .arg(dir.path().join("previous_settings.txt"))
        .arg("--no-stdin")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Please specify a path to the config file"));
}

#[test]
fn settings_show_reads_both_lines() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("previous_settings.txt");
    fs::write(&path, "/tmp/scene.txt\n/tmp/tracks.json\n").unwrap();

    trackwatch()
        .current_dir(dir.path())
        .args(["settings", "--show", "--settings"])
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("Trigger file: /tmp/scene.txt"))
        .stdout(predicate::str::contains("Track map: /tmp/tracks.json"));
}

#[test]
fn system_info_reports_a_player() {
    trackwatch()
        .args(["system-info", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"player\""));
}

#[test]
fn watch_rejects_an_oversized_poll_interval() {
    let dir = tempfile::tempdir().unwrap();

    trackwatch()
        .current_dir(dir.path())
        .args(["watch", "--no-stdin", "--poll-ms"])
        .arg(u64::MAX.to_string())
        .assert()
        .failure()
        .stderr(predicate::str::contains("poll_interval_ms must be at most"));
}
