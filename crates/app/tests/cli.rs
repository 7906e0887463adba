//! End-to-end runs of the `learnpath` binary against a temporary database.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

struct Db {
    _dir: TempDir,
    url: String,
}

fn seeded_db() -> Db {
    let dir = TempDir::new().unwrap();
    let url = format!("sqlite://{}", dir.path().join("learn.sqlite3").display());
    learnpath(&url)
        .arg("seed")
        .assert()
        .success()
        .stdout(predicate::str::contains("seeded course 1: 4 modules, 5 questions"));
    Db { _dir: dir, url }
}

fn learnpath(db_url: &str) -> Command {
    #[allow(deprecated)]
    let mut cmd = Command::cargo_bin("learnpath").unwrap();
    cmd.env("LEARN_DB_URL", db_url).env("RUST_LOG", "warn");
    cmd
}

#[test]
fn seeding_twice_is_harmless() {
    let db = seeded_db();
    learnpath(&db.url).arg("seed").assert().success();
    learnpath(&db.url)
        .args(["status", "--user", "ada", "--course", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("0/4 completed (0%)"));
}

#[test]
fn fresh_learner_sees_the_gate_message() {
    let db = seeded_db();
    learnpath(&db.url)
        .args(["status", "--user", "ada", "--course", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "locked: Pass the Ownership quiz to unlock Borrowing.",
        ))
        .stdout(predicate::str::contains("next: module 101"));
}

#[test]
fn locked_module_is_rejected_with_exit_code_1() {
    let db = seeded_db();
    learnpath(&db.url)
        .args(["complete", "--user", "ada", "--module", "102"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("is locked"));
}

#[test]
fn passing_the_gate_opens_the_next_module() {
    let db = seeded_db();
    learnpath(&db.url)
        .args(["submit", "--user", "ada", "--module", "101"])
        .args(["--answer", "1011=b", "--answer", "1012=false"])
        .assert()
        .success()
        .stdout(predicate::str::contains("score 100%"))
        .stdout(predicate::str::contains("passed; attempt 1, 2 left"));

    let output = learnpath(&db.url)
        .args(["status", "--user", "ada", "--course", "1", "--json"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let status: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let states: Vec<&str> = status["modules"]
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["state"].as_str().unwrap())
        .collect();
    assert_eq!(states, ["unlocked", "unlocked", "unlocked", "locked"]);
    assert_eq!(status["modules"][3]["blocked_by"], 103);

    learnpath(&db.url)
        .args(["complete", "--user", "ada", "--module", "102"])
        .assert()
        .success()
        .stdout(predicate::str::contains("module 102 completed"));
}

#[test]
fn malformed_answer_flag_is_a_usage_error() {
    let db = seeded_db();
    learnpath(&db.url)
        .args(["submit", "--user", "ada", "--module", "101", "--answer", "nope"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("<question_id>=<value>"));
}

#[test]
fn empty_submission_uses_no_attempt() {
    let db = seeded_db();
    learnpath(&db.url)
        .args(["submit", "--user", "ada", "--module", "101"])
        .assert()
        .code(1);
    learnpath(&db.url)
        .args(["status", "--user", "ada", "--course", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("quiz not taken, 3 attempts left"));
}

#[test]
fn oversized_course_id_is_refused() {
    let dir = TempDir::new().unwrap();
    let url = format!("sqlite://{}", dir.path().join("learn.sqlite3").display());
    learnpath(&url)
        .args(["seed", "--course", "18446744073709551615"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("too large to seed"));
}
