//! Runs the `shelver` binary end to end.

use std::path::Path;
use std::process::{Command, Output};

use tempfile::TempDir;

fn shelver(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_shelver"))
        .args(args)
        .current_dir(dir)
        .env("SOURCE_DATE_EPOCH", "1700000000")
        .env_remove("SHELVER_CONFIG")
        .env_remove("RUST_LOG")
        .output()
        .expect("run shelver")
}

fn write_fixture(temp: &TempDir) {
    let source = temp.path().join("in").join("a.mp3");
    std::fs::create_dir_all(source.parent().unwrap()).unwrap();
    std::fs::write(&source, b"audio").unwrap();
    let mapping = serde_json::json!({
        (source.to_string_lossy().into_owned()): {"author": "Art", "album": "Alb", "song": "Song"},
        "/definitely/missing.mp3": {"author": "X", "album": "Y", "song": "Z"},
    });
    std::fs::write(temp.path().join("mapping.json"), mapping.to_string()).unwrap();
}

#[test]
fn dry_run_prints_summary_and_writes_report() {
    let temp = TempDir::new().unwrap();
    write_fixture(&temp);

    let output = shelver(temp.path(), &["-i", "mapping.json", "-d", "out"]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Summary (dry run, copy):"));
    assert!(stdout.contains("/definitely/missing.mp3"));
    assert!(!temp.path().join("out").exists());

    let report: serde_json::Value = serde_json::from_slice(
        &std::fs::read(temp.path().join("shelver-report.json")).unwrap(),
    )
    .unwrap();
    assert_eq!(report["generated_at"], "2023-11-14T22:13:20Z");
    assert_eq!(report["stats"]["planned_copies"], 1);
    assert_eq!(report["stats"]["missing_sources"], 1);
}

#[test]
fn apply_copies_into_library() {
    let temp = TempDir::new().unwrap();
    write_fixture(&temp);

    let output = shelver(
        temp.path(),
        &["-i", "mapping.json", "-d", "out", "--apply", "--report", "run.json"],
    );

    assert!(output.status.success());
    assert_eq!(
        std::fs::read(temp.path().join("out/Art/Alb/Song.mp3")).unwrap(),
        b"audio"
    );
    assert!(temp.path().join("in/a.mp3").exists());
    assert!(temp.path().join("run.json").is_file());
}

#[test]
fn unreadable_mapping_exits_with_failure() {
    let temp = TempDir::new().unwrap();

    let output = shelver(temp.path(), &["-i", "nope.json"]);

    assert_eq!(output.status.code(), Some(1));
    assert!(!temp.path().join("shelver-report.json").exists());
}

#[test]
fn invalid_duplicate_token_rejected() {
    let temp = TempDir::new().unwrap();
    write_fixture(&temp);

    let output = shelver(
        temp.path(),
        &["-i", "mapping.json", "--duplicate-token", "a/b"],
    );

    assert_eq!(output.status.code(), Some(1));
}
