use std::path::PathBuf;
use std::process::Command;

fn demo(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("../../demos")
        .join(name)
}

fn bt() -> Command {
    Command::new(env!("CARGO_BIN_EXE_bt"))
}

#[test]
fn validate_accepts_the_patrol_demo() {
    let output = bt().arg("validate").arg(demo("patrol.json")).output().unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("ok (15 nodes)"), "{stdout}");
}

#[test]
fn run_ticks_the_requested_number_of_times() {
    let output = bt()
        .args(["run", "--ticks", "5"])
        .arg(demo("patrol.json"))
        .output()
        .unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(stdout.lines().filter(|l| l.starts_with("tick")).count(), 5);
    assert!(stdout.contains("Pool: 15 kept"), "{stdout}");
}

#[test]
fn run_with_trace_prints_json_events() {
    let output = bt()
        .args(["run", "--ticks", "3", "--trace"])
        .arg(demo("patrol.json"))
        .output()
        .unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    let events: Vec<serde_json::Value> = stdout
        .lines()
        .filter(|l| l.starts_with('{'))
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    assert!(!events.is_empty());
    assert!(events.iter().any(|e| e["tag"] == "bt.node.start"));
}

#[test]
fn missing_file_fails_with_context() {
    let output = bt().args(["validate", "no-such-tree.json"]).output().unwrap();
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Failed to read tree"), "{stderr}");
}
