use std::process::Command;

fn temp_path(label: &str) -> std::path::PathBuf {
    std::env::temp_dir().join(format!(
        "nottingham-cli-{label}-{}",
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos()
    ))
}

#[test]
fn cli_list_inspectors_writes_output() {
    let exe = env!("CARGO_BIN_EXE_nottingham-tester");
    let output_path = temp_path("list");
    let status = Command::new(exe)
        .args(["--list-inspectors", "--output"])
        .arg(&output_path)
        .status()
        .expect("run cli");
    assert!(status.success());
    let content = std::fs::read_to_string(output_path).expect("read output");
    assert!(content.contains("Available inspectors"));
    assert!(content.contains("trigger_happy"));
}

#[test]
fn cli_runs_json_report() {
    let exe = env!("CARGO_BIN_EXE_nottingham-tester");
    let output_path = temp_path("run");
    let output = Command::new(exe)
        .args([
            "--inspectors",
            "greedy,smart",
            "--seeds",
            "1,2",
            "--rounds",
            "20",
            "--report",
            "json",
            "--output",
        ])
        .arg(&output_path)
        .output()
        .expect("run cli");
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    let content = std::fs::read_to_string(output_path).expect("read output");
    let results: serde_json::Value = serde_json::from_str(&content).expect("json report");
    let runs = results.as_array().expect("array of runs");
    assert_eq!(runs.len(), 4);
    assert!(runs.iter().all(|run| run["rounds_played"] == 20));
}

#[test]
fn cli_rejects_unknown_inspector() {
    let exe = env!("CARGO_BIN_EXE_nottingham-tester");
    let output = Command::new(exe)
        .args(["--inspectors", "lenient", "--rounds", "1"])
        .output()
        .expect("run cli");
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("lenient"));
}
