use std::process::Command;

fn temp_path(label: &str) -> std::path::PathBuf {
    std::env::temp_dir().join(format!(
        "beifa-cli-{label}-{}",
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos()
    ))
}

#[test]
fn cli_list_strategies_writes_output() {
    let exe = env!("CARGO_BIN_EXE_beifa-tester");
    let output_path = temp_path("list");
    let status = Command::new(exe)
        .args(["--list-strategies", "--output"])
        .arg(&output_path)
        .status()
        .expect("run cli");
    assert!(status.success());
    let content = std::fs::read_to_string(output_path).expect("read output");
    assert!(content.contains("Available strategies"));
    assert!(content.contains("monte-carlo"));
}

#[test]
fn cli_json_report_with_replay_check() {
    let exe = env!("CARGO_BIN_EXE_beifa-tester");
    let output_path = temp_path("json");
    let status = Command::new(exe)
        .args([
            "--report",
            "json",
            "--seeds",
            "3..4",
            "--runs",
            "1",
            "--strategies",
            "balanced,cautious",
            "--verify-replay",
            "--output",
        ])
        .arg(&output_path)
        .status()
        .expect("run cli");
    assert!(status.success());

    let content = std::fs::read_to_string(output_path).expect("read output");
    let report: serde_json::Value = serde_json::from_str(&content).expect("valid json");
    let runs = report["runs"].as_array().expect("runs array");
    assert_eq!(runs.len(), 4);
    assert!(runs.iter().all(|run| run["replay_verified"] == true));
    assert_eq!(report["summaries"].as_array().map(Vec::len), Some(2));
}

#[test]
fn cli_rejects_bad_seed_tokens() {
    let exe = env!("CARGO_BIN_EXE_beifa-tester");
    let output = Command::new(exe)
        .args(["--seeds", "not-a-seed", "--runs", "1"])
        .output()
        .expect("run cli");
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("not-a-seed"));
}

#[test]
fn cli_rejects_unknown_strategies() {
    let exe = env!("CARGO_BIN_EXE_beifa-tester");
    let output = Command::new(exe)
        .args(["--strategies", "reckless", "--runs", "1"])
        .output()
        .expect("run cli");
    assert!(!output.status.success());
}
