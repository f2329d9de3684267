//! CLI integration tests using assert_cmd.

use std::path::PathBuf;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn examprep() -> Command {
    #[allow(deprecated)]
    let mut cmd = Command::cargo_bin("examprep").unwrap();
    cmd.env_remove("EXAMPREP_DEEPSEEK_KEY")
        .env_remove("EXAMPREP_SUPABASE_KEY");
    cmd
}

/// Write a config with a grader key and an unreachable endpoint.
fn grader_only_config(dir: &TempDir) -> PathBuf {
    let path = dir.path().join("examprep.toml");
    std::fs::write(
        &path,
        "[grader]\napi_key = \"sk-test\"\nbase_url = \"http://127.0.0.1:9\"\ntimeout_secs = 1\n",
    )
    .unwrap();
    path
}

#[test]
fn help_lists_commands() {
    examprep()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("questions"))
        .stdout(predicate::str::contains("evaluate"))
        .stdout(predicate::str::contains("check"))
        .stdout(predicate::str::contains("init"));
}

#[test]
fn init_creates_config() {
    let dir = TempDir::new().unwrap();

    examprep()
        .current_dir(dir.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("Created examprep.toml"));

    let written = std::fs::read_to_string(dir.path().join("examprep.toml")).unwrap();
    assert!(written.contains("[store]"));
    assert!(written.contains("[grader]"));
}

#[test]
fn init_skips_existing() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("examprep.toml"), "# mine\n").unwrap();

    examprep()
        .current_dir(dir.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("already exists"));

    let kept = std::fs::read_to_string(dir.path().join("examprep.toml")).unwrap();
    assert_eq!(kept, "# mine\n");
}

#[test]
fn evaluate_blank_answer_fails_before_grading() {
    let dir = TempDir::new().unwrap();
    let config = grader_only_config(&dir);

    examprep()
        .args(["evaluate", "--question", "Define osmosis.", "--model-answer"])
        .args(["Movement of water.", "--marks", "4", "--answer", "   "])
        .arg("--config")
        .arg(&config)
        .assert()
        .failure()
        .stderr(predicate::str::contains("missing required parameters"))
        .stderr(predicate::str::contains("user answer"));
}

#[test]
fn evaluate_without_marks_names_the_missing_input() {
    let dir = TempDir::new().unwrap();
    let config = grader_only_config(&dir);

    examprep()
        .args(["evaluate", "--question", "Q", "--model-answer", "M", "--answer", "A"])
        .arg("--config")
        .arg(&config)
        .assert()
        .failure()
        .stderr(predicate::str::contains("mark allocation"));
}

#[test]
fn evaluate_requires_grader_key() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("examprep.toml");
    std::fs::write(&path, "[retry]\nmax_attempts = 3\n").unwrap();

    examprep()
        .args(["evaluate", "--question", "Q", "--model-answer", "M"])
        .args(["--marks", "2", "--answer", "A", "--config"])
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("no grader API key"));
}

#[test]
fn evaluate_rejects_unknown_format() {
    let dir = TempDir::new().unwrap();
    let config = grader_only_config(&dir);

    examprep()
        .args(["evaluate", "--question", "Q", "--model-answer", "M", "--marks", "2"])
        .args(["--answer", "A", "--format", "xml", "--config"])
        .arg(&config)
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown format"));
}

#[test]
fn evaluate_question_id_conflicts_with_inline_question() {
    examprep()
        .args(["evaluate", "--question-id", "3", "--question", "Q", "--answer", "A"])
        .assert()
        .failure();
}

#[test]
fn missing_config_file() {
    examprep()
        .args(["levels", "--config", "/nonexistent/examprep.toml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("config file not found"));
}

#[test]
fn questions_without_store_section() {
    let dir = TempDir::new().unwrap();
    let config = grader_only_config(&dir);

    examprep()
        .args(["questions", "--topic", "5", "--type", "Structural", "--config"])
        .arg(&config)
        .assert()
        .failure()
        .stderr(predicate::str::contains("no [store] section"));
}

#[test]
fn check_rejects_bad_option_letter() {
    examprep()
        .args(["check", "--topic", "5", "--question-id", "1", "--option", "E"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid value"));
}
