//! CLI integration tests using assert_cmd.

use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn recall() -> Command {
    #[allow(deprecated)]
    let mut cmd = Command::cargo_bin("recall").unwrap();
    cmd.env_remove("RECALL_MODE")
        .env_remove("RECALL_REMOTE_TIMEOUT_MS");
    cmd
}

fn write_deck(dir: &Path, name: &str, response: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(
        &path,
        format!(
            r#"[project]
name = "Biology"

[[folders]]
name = "Cells"

[[folders.cards]]
question = "What is the powerhouse of the cell?"
answer = "mitochondria"
response = "{response}"

[[folders.cards]]
question = "Where are proteins made?"
answer = "ribosome"
response = "ribosome"
"#
        ),
    )
    .unwrap();
    path
}

/// Grade `deck` and return the single report written to `out`.
fn grade_to(deck: &Path, out: &Path) -> PathBuf {
    recall()
        .arg("grade")
        .arg("--deck")
        .arg(deck)
        .arg("--output")
        .arg(out)
        .assert()
        .success();

    let reports: Vec<PathBuf> = std::fs::read_dir(out)
        .unwrap()
        .map(|e| e.unwrap().path())
        .filter(|p| p.extension().is_some_and(|ext| ext == "json"))
        .collect();
    assert_eq!(reports.len(), 1);
    reports.into_iter().next().unwrap()
}

#[test]
fn score_exact() {
    recall()
        .args(["score", "--reference", "Paris", "--candidate", "  PARIS "])
        .assert()
        .success()
        .stdout(predicate::str::contains("Grade: exact (1.0)"))
        .stdout(predicate::str::contains("Percent: 100%"));
}

#[test]
fn score_typo_with_explain() {
    recall()
        .args([
            "score",
            "--reference",
            "mitochondria",
            "--candidate",
            "mitocondria",
            "--explain",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Grade: close (0.8)"))
        .stdout(predicate::str::contains(
            "Rule: single-word typo (distance 1, threshold 3)",
        ));
}

#[test]
fn score_json() {
    let output = recall()
        .args([
            "score",
            "--reference",
            "Paris, France",
            "--candidate",
            "Paris",
            "--json",
        ])
        .output()
        .unwrap();
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["grade"], 0.9);
    assert_eq!(json["percent"], 90);
    assert_eq!(json["rule"], "containment");
    assert_eq!(json["candidate"], "Paris");
}

#[test]
fn score_empty_candidate() {
    recall()
        .args(["score", "--reference", "Paris", "--candidate", "", "--explain"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Percent: 0%"))
        .stdout(predicate::str::contains("Rule: empty input"));
}

#[test]
fn validate_valid_deck() {
    let dir = TempDir::new().unwrap();
    let deck = write_deck(dir.path(), "biology.toml", "mitocondria");

    recall()
        .arg("validate")
        .arg("--deck")
        .arg(&deck)
        .assert()
        .success()
        .stdout(predicate::str::contains("Deck: Biology (1 folders, 2 cards, 2 answered)"))
        .stdout(predicate::str::contains("All decks valid"));
}

#[test]
fn validate_reports_warnings() {
    let dir = TempDir::new().unwrap();
    let deck = dir.path().join("sparse.toml");
    std::fs::write(
        &deck,
        r#"[project]
name = "Sparse"

[[folders]]
name = "Empty"
"#,
    )
    .unwrap();

    recall()
        .arg("validate")
        .arg("--deck")
        .arg(&deck)
        .assert()
        .success()
        .stdout(predicate::str::contains("[Empty] WARNING: folder has no cards"))
        .stdout(predicate::str::contains("1 warning(s) found"));
}

#[test]
fn validate_nonexistent_file() {
    recall()
        .arg("validate")
        .arg("--deck")
        .arg("nonexistent.toml")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error"));
}

#[test]
fn init_creates_files() {
    let dir = TempDir::new().unwrap();

    recall()
        .current_dir(dir.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("Created recall.toml"))
        .stdout(predicate::str::contains("Created decks/example.toml"));

    assert!(dir.path().join("recall.toml").exists());
    assert!(dir.path().join("decks/example.toml").exists());
}

#[test]
fn init_skips_existing() {
    let dir = TempDir::new().unwrap();

    recall()
        .current_dir(dir.path())
        .arg("init")
        .assert()
        .success();

    recall()
        .current_dir(dir.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("already exists"));
}

#[test]
fn init_then_grade_example_deck() {
    let dir = TempDir::new().unwrap();

    recall()
        .current_dir(dir.path())
        .arg("init")
        .assert()
        .success();

    recall()
        .current_dir(dir.path())
        .args(["grade", "--deck", "decks/example.toml", "--no-save"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Biology"))
        .stdout(predicate::str::contains("Geography"))
        .stdout(predicate::str::contains("2 of 2 cards at or above 80%"))
        .stderr(predicate::str::contains("2 graded, 2 unanswered"));

    assert!(!dir.path().join("recall-results").exists());
}

#[test]
fn grade_json_format() {
    let dir = TempDir::new().unwrap();
    let deck = write_deck(dir.path(), "biology.toml", "mitocondria");

    let output = recall()
        .arg("grade")
        .arg("--deck")
        .arg(&deck)
        .args(["--format", "json", "--no-save"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["project"]["name"], "Biology");
    assert_eq!(json["results"][0]["outcome"]["percent"], 80);
    assert_eq!(json["results"][1]["outcome"]["percent"], 100);
    assert_eq!(json["summary"]["graded"], 2);
}

#[test]
fn grade_with_missing_config_fails() {
    let dir = TempDir::new().unwrap();
    let deck = write_deck(dir.path(), "biology.toml", "mitocondria");

    recall()
        .arg("grade")
        .arg("--deck")
        .arg(&deck)
        .args(["--no-save", "--config", "no-such-config.toml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("config file not found"));
}

#[test]
fn grade_directory_keeps_reports_of_same_named_decks() {
    let dir = TempDir::new().unwrap();
    let decks = dir.path().join("decks");
    std::fs::create_dir(&decks).unwrap();
    write_deck(&decks, "first.toml", "mitocondria");
    write_deck(&decks, "second.toml", "no idea");

    let out = dir.path().join("out");
    recall()
        .arg("grade")
        .arg("--deck")
        .arg(&decks)
        .arg("--output")
        .arg(&out)
        .assert()
        .success();

    let mut percents: Vec<u64> = std::fs::read_dir(&out)
        .unwrap()
        .map(|e| {
            let content = std::fs::read_to_string(e.unwrap().path()).unwrap();
            let json: serde_json::Value = serde_json::from_str(&content).unwrap();
            assert_eq!(json["project"]["name"], "Biology");
            json["results"][0]["outcome"]["percent"].as_u64().unwrap()
        })
        .collect();
    percents.sort_unstable();
    assert_eq!(percents, vec![30, 80]);
}

#[test]
fn compare_reports() {
    let dir = TempDir::new().unwrap();
    let before = write_deck(dir.path(), "before.toml", "no idea");
    let after = write_deck(dir.path(), "after.toml", "mitochondria");

    let baseline = grade_to(&before, &dir.path().join("baseline"));
    let current = grade_to(&after, &dir.path().join("current"));

    recall()
        .arg("compare")
        .arg("--baseline")
        .arg(&baseline)
        .arg("--current")
        .arg(&current)
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Comparison: 0 regressions, 1 improvements, 1 unchanged",
        ))
        .stdout(predicate::str::contains("30% -> 100% (+70)"));

    // Swapped, the improvement becomes a regression.
    recall()
        .arg("compare")
        .arg("--baseline")
        .arg(&current)
        .arg("--current")
        .arg(&baseline)
        .arg("--fail-on-regression")
        .assert()
        .failure()
        .stdout(predicate::str::contains("Regressions:"));

    recall()
        .arg("compare")
        .arg("--baseline")
        .arg(&current)
        .arg("--current")
        .arg(&baseline)
        .args(["--format", "markdown"])
        .assert()
        .success()
        .stdout(predicate::str::contains("## Recall Comparison"))
        .stdout(predicate::str::contains("| -70 |"));
}

#[test]
fn compare_nonexistent_report() {
    recall()
        .arg("compare")
        .arg("--baseline")
        .arg("no_such_file.json")
        .arg("--current")
        .arg("also_no_file.json")
        .assert()
        .failure();
}

#[test]
fn help_output() {
    recall()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Offline flashcard answer grading"));
}

#[test]
fn version_output() {
    recall()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("recall"));
}
