use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use serde_json::Value;

use room_fingerprint::wav::{read_wav, write_wav};

fn cli() -> Command {
    Command::new(env!("CARGO_BIN_EXE_room_cli"))
}

fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("room_cli_{}_{}", std::process::id(), name));
    fs::create_dir_all(&dir).expect("create scratch dir");
    dir
}

fn run(args: &[&str]) -> Output {
    cli().args(args).output().expect("failed to run room_cli")
}

fn stdout_json(output: &Output) -> Value {
    let stdout = String::from_utf8(output.stdout.clone()).expect("stdout UTF-8");
    serde_json::from_str(stdout.trim()).expect("JSON payload on stdout")
}

fn path_str(path: &Path) -> &str {
    path.to_str().expect("UTF-8 path")
}

/// Write the probe via the CLI, then a recording of it with one echo
fn probe_and_recording(dir: &Path) -> (PathBuf, PathBuf) {
    let reference = dir.join("probe.wav");
    let output = run(&["chirp", "--sample-rate", "48000", "--output", path_str(&reference)]);
    assert!(output.status.success(), "chirp exited with {:?}", output.status.code());
    let json = stdout_json(&output);
    assert_eq!(json["samples"], 24_000);
    assert_eq!(json["config"]["mode"], "audible");

    let (chirp, rate) = read_wav(&reference).unwrap();
    assert_eq!(rate, 48_000);
    let mut recorded = vec![0.0f32; chirp.len() + 48_000];
    for (i, &x) in chirp.iter().enumerate() {
        recorded[i + 480] += 0.8 * x;
        recorded[i + 480 + 1200] += 0.3 * x;
    }
    let recording = dir.join("recording.wav");
    write_wav(&recording, &recorded, rate).unwrap();
    (reference, recording)
}

#[test]
fn features_from_recorded_probe() {
    let dir = scratch_dir("features");
    let (reference, recording) = probe_and_recording(&dir);

    let output = run(&[
        "features",
        "--recorded",
        path_str(&recording),
        "--reference",
        path_str(&reference),
    ]);
    assert!(output.status.success(), "features exited with {:?}", output.status.code());
    let json = stdout_json(&output);
    assert_eq!(json["raw"].as_array().map(Vec::len), Some(60));

    let output = run(&[
        "features",
        "--recorded",
        path_str(&recording),
        "--reference",
        path_str(&reference),
        "--orientation-aware",
    ]);
    assert!(output.status.success());
    let json = stdout_json(&output);
    assert_eq!(json["raw"].as_array().map(Vec::len), Some(68));
    assert!(json["metadata"]["mixing_time_ms"].as_f64().is_some());

    fs::remove_dir_all(&dir).ok();
}

#[test]
fn impulse_writes_trimmed_response() {
    let dir = scratch_dir("impulse");
    let (reference, recording) = probe_and_recording(&dir);
    let ir_path = dir.join("ir.wav");

    let output = run(&[
        "impulse",
        "--recorded",
        path_str(&recording),
        "--reference",
        path_str(&reference),
        "--output",
        path_str(&ir_path),
    ]);
    assert!(output.status.success(), "impulse exited with {:?}", output.status.code());
    let json = stdout_json(&output);
    let samples = json["samples"].as_u64().unwrap_or_default() as usize;
    let rt60 = json["rt60"].as_f64().unwrap_or_default();
    assert!(samples >= 4_800, "trimmed IR too short: {samples}");
    assert!((0.1..=5.0).contains(&rt60), "rt60 {rt60}");

    let (ir, rate) = read_wav(&ir_path).unwrap();
    assert_eq!(rate, 48_000);
    assert_eq!(ir.len(), samples);

    fs::remove_dir_all(&dir).ok();
}

#[test]
fn ambient_reports_full_vector() {
    let dir = scratch_dir("ambient");
    let input = dir.join("room.wav");
    let audio: Vec<f32> = (0..16_000)
        .map(|i| 0.2 * (i as f32 * 0.05).sin() + ((i * 7919) % 101) as f32 / 2000.0)
        .collect();
    write_wav(&input, &audio, 16_000).unwrap();

    let output = run(&["ambient", "--input", path_str(&input)]);
    assert!(output.status.success(), "ambient exited with {:?}", output.status.code());
    let json = stdout_json(&output);
    assert_eq!(json["raw"].as_array().map(Vec::len), Some(73));
    assert_eq!(json["hvac_peaks"].as_array().map(Vec::len), Some(6));

    fs::remove_dir_all(&dir).ok();
}

#[test]
fn diversity_gate_sets_exit_code() {
    let dir = scratch_dir("diversity");
    let clustered = dir.join("clustered.json");
    fs::write(
        &clustered,
        r#"[{"alpha": 10.0, "beta": 20.0, "gamma": 5.0}, {"alpha": 12.0, "beta": 21.0, "gamma": 4.0}]"#,
    )
    .unwrap();

    let output = run(&["diversity", "--input", path_str(&clustered)]);
    assert_eq!(output.status.code(), Some(2));
    let json = stdout_json(&output);
    assert_eq!(json["octants_covered"], 1);
    let stderr = String::from_utf8(output.stderr).expect("stderr UTF-8");
    assert!(stderr.contains("warning:"), "expected warnings, got {stderr}");

    let diverse = dir.join("diverse.json");
    let poses = [
        (0.0, 60.0),
        (300.0, 0.0),
        (0.0, -60.0),
        (60.0, 0.0),
        (180.0, 60.0),
        (240.0, 0.0),
        (180.0, -60.0),
        (120.0, 0.0),
    ];
    let list: Vec<Value> = poses
        .iter()
        .map(|&(alpha, beta)| serde_json::json!({"alpha": alpha, "beta": beta, "gamma": 0.0}))
        .collect();
    fs::write(&diverse, serde_json::to_string(&list).unwrap()).unwrap();

    let output = run(&["diversity", "--input", path_str(&diverse)]);
    assert_eq!(output.status.code(), Some(0));
    assert_eq!(stdout_json(&output)["octants_covered"], 8);

    fs::remove_dir_all(&dir).ok();
}

#[test]
fn missing_input_fails_with_context() {
    let output = run(&["ambient", "--input", "/nonexistent/room.wav"]);
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8(output.stderr).expect("stderr UTF-8");
    assert!(stderr.contains("/nonexistent/room.wav"), "got {stderr}");
}
