use std::{env, fs, path::PathBuf, process::Command};

const CHART: &str = "osu file format v14

[General]
Mode: 3

[Metadata]
Title:CLI Song
Version:Easy

[Difficulty]
CircleSize:4

[TimingPoints]
0,500,4,1,0,100,1,0

[HitObjects]
64,192,1000,1,0,0:0:0:0:
192,192,1500,128,0,2000:0:0:0:0:
";

fn norm_newlines(s: &str) -> String {
    s.replace("\r\n", "\n").replace('\r', "")
}

fn work_dir(tag: &str) -> PathBuf {
    let dir = env::temp_dir().join(format!("fourkey_cli_{tag}_{}", std::process::id()));
    fs::create_dir_all(&dir).unwrap();
    dir
}

#[test]
fn parse_writes_beatmap_json_next_to_input() {
    let exe = env!("CARGO_BIN_EXE_fourkey");
    let dir = work_dir("parse_default");
    let input = dir.join("song.osu");
    fs::write(&input, CHART).unwrap();

    let out = Command::new(exe)
        .args(["parse", input.to_str().unwrap()])
        .output()
        .unwrap();
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));

    let json = fs::read_to_string(dir.join("song.beatmap.json")).unwrap();
    let v: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(v["metadata"]["Title"], "CLI Song");
    assert_eq!(v["hit_objects"].as_array().unwrap().len(), 2);
    assert!(v["sv"]["segments"][0]["end"].is_null());
}

#[test]
fn parse_honours_output_path() {
    let exe = env!("CARGO_BIN_EXE_fourkey");
    let dir = work_dir("parse_output");
    let input = dir.join("song.osu");
    let output_path = dir.join("custom.json");
    fs::write(&input, CHART).unwrap();

    let out = Command::new(exe)
        .args(["parse", input.to_str().unwrap(), "-o", output_path.to_str().unwrap()])
        .output()
        .unwrap();
    assert!(out.status.success());
    assert!(output_path.exists());
}

#[test]
fn parse_error_output_format_is_stable() {
    let exe = env!("CARGO_BIN_EXE_fourkey");
    let dir = work_dir("parse_error");
    let input = dir.join("broken.osu");
    fs::write(&input, "[General]\nMode: 3\n").unwrap();

    let output = Command::new(exe)
        .args(["parse", input.to_str().unwrap()])
        .output()
        .unwrap();

    assert!(!output.status.success());
    assert_eq!(output.status.code(), Some(1));
    let stderr = norm_newlines(&String::from_utf8_lossy(&output.stderr));
    assert!(stderr.contains("Error: failed to load chart: "));
    assert!(stderr.contains("Caused by:"));
    assert!(stderr.contains("E3001: missing [HitObjects] section (line 0)"));
}

#[test]
fn missing_input_file_is_e2001() {
    let exe = env!("CARGO_BIN_EXE_fourkey");
    let missing = env::temp_dir().join(format!("fourkey_cli_missing_{}.osu", std::process::id()));
    let _ = fs::remove_file(&missing);

    let output = Command::new(exe)
        .args(["inspect", missing.to_str().unwrap()])
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(1));
    let stderr = norm_newlines(&String::from_utf8_lossy(&output.stderr));
    assert!(stderr.contains("E2001: failed to read chart:"));
    assert!(stderr.contains("(line 0)"));
}

#[test]
fn parse_warnings_are_printed() {
    let exe = env!("CARGO_BIN_EXE_fourkey");
    let dir = work_dir("parse_warnings");
    let input = dir.join("warn.osu");
    fs::write(&input, CHART.replace("[HitObjects]\n", "[HitObjects]\nnot,a,row\n")).unwrap();

    let out = Command::new(exe)
        .args(["parse", input.to_str().unwrap()])
        .output()
        .unwrap();
    assert!(out.status.success());
    let stderr = norm_newlines(&String::from_utf8_lossy(&out.stderr));
    assert!(stderr.contains("warning: W2002"));
}

#[test]
fn inspect_prints_summary() {
    let exe = env!("CARGO_BIN_EXE_fourkey");
    let dir = work_dir("inspect");
    let input = dir.join("song.osu");
    fs::write(&input, CHART).unwrap();

    let out = Command::new(exe)
        .args(["inspect", input.to_str().unwrap()])
        .output()
        .unwrap();
    assert!(out.status.success());
    let stdout = norm_newlines(&String::from_utf8_lossy(&out.stdout));
    assert!(stdout.contains("title: CLI Song"));
    assert!(stdout.contains("objects: 2 (1 long notes)"));
    assert!(stdout.contains("measures: 6"));
}

#[test]
fn simulate_auto_prints_perfect_stats() {
    let exe = env!("CARGO_BIN_EXE_fourkey");
    let dir = work_dir("simulate_auto");
    let input = dir.join("song.osu");
    fs::write(&input, CHART).unwrap();

    let out = Command::new(exe)
        .args(["simulate", input.to_str().unwrap(), "--auto"])
        .output()
        .unwrap();
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));

    let stats: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(stats["counts"]["Perfect"], 3);
    assert_eq!(stats["max_combo"], 3);
    assert_eq!(stats["accuracy"], 100.0);
}

#[test]
fn simulate_reads_scripted_inputs() {
    let exe = env!("CARGO_BIN_EXE_fourkey");
    let dir = work_dir("simulate_inputs");
    let input = dir.join("song.osu");
    let inputs = dir.join("inputs.json");
    fs::write(&input, CHART).unwrap();
    fs::write(
        &inputs,
        r#"[{"lane": 0, "pressed": true, "time_ms": 1000}, {"lane": 0, "pressed": false, "time_ms": 1050}]"#,
    )
    .unwrap();

    let out = Command::new(exe)
        .args(["simulate", input.to_str().unwrap(), "--inputs", inputs.to_str().unwrap()])
        .output()
        .unwrap();
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));

    let stats: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(stats["counts"]["Perfect"], 1);
    assert_eq!(stats["counts"]["Miss"], 2);
}

#[test]
fn bad_config_is_reported() {
    let exe = env!("CARGO_BIN_EXE_fourkey");
    let dir = work_dir("simulate_config");
    let input = dir.join("song.osu");
    let config = dir.join("config.json");
    fs::write(&input, CHART).unwrap();
    fs::write(&config, r#"{"key_bindings": ["a", "a", "b", "c"]}"#).unwrap();

    let out = Command::new(exe)
        .args(["simulate", input.to_str().unwrap(), "--config", config.to_str().unwrap()])
        .output()
        .unwrap();
    assert_eq!(out.status.code(), Some(1));
    let stderr = norm_newlines(&String::from_utf8_lossy(&out.stderr));
    assert!(stderr.contains("Error: failed to load config:"));
    assert!(stderr.contains("bound twice"));
}

#[test]
fn help_lists_subcommands() {
    let exe = env!("CARGO_BIN_EXE_fourkey");
    let output = Command::new(exe).arg("--help").output().unwrap();
    assert!(output.status.success());
    let stdout = norm_newlines(&String::from_utf8_lossy(&output.stdout));
    assert!(stdout.contains("parse"));
    assert!(stdout.contains("inspect"));
    assert!(stdout.contains("simulate"));
}
