use assert_cmd::Command;
use tempfile::TempDir;

#[test]
fn help_lists_subcommands() {
    let output = Command::cargo_bin("kira-zonemap")
        .unwrap()
        .arg("--help")
        .output()
        .unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    for sub in ["zones", "analyze", "validate"] {
        assert!(stdout.contains(sub), "missing {} in help", sub);
    }
}

#[test]
fn analyze_requires_output_directory() {
    Command::cargo_bin("kira-zonemap")
        .unwrap()
        .arg("analyze")
        .assert()
        .failure();
}

#[test]
fn unsupported_level_is_rejected() {
    let tmp = TempDir::new().unwrap();
    let output = Command::cargo_bin("kira-zonemap")
        .unwrap()
        .args(["analyze", "--level", "7", "--out"])
        .arg(tmp.path())
        .output()
        .unwrap();
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains('7'));
}

#[test]
fn missing_config_file_fails() {
    let tmp = TempDir::new().unwrap();
    Command::cargo_bin("kira-zonemap")
        .unwrap()
        .arg("zones")
        .arg("--config")
        .arg(tmp.path().join("absent.yml"))
        .assert()
        .failure();
}
