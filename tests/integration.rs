use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::io::Write;
use tempfile::TempDir;

const ANIMALS: &str =
    "Cats are small animals. Dogs are loyal companions. Cats often sleep during the day.";
const SPACE: &str = "# Space\n\nRockets reach orbit. Astronauts train for years before a launch.";

fn docchat_binary() -> PathBuf {
    let mut path = std::env::current_exe().unwrap();
    path.pop(); // remove test binary name
    path.pop(); // remove deps/
    path.push("docchat");
    path
}

fn setup_test_env() -> (TempDir, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().to_path_buf();

    let config_dir = root.join("config");
    fs::create_dir_all(&config_dir).unwrap();

    let files_dir = root.join("files");
    fs::create_dir_all(&files_dir).unwrap();
    fs::write(files_dir.join("animals.txt"), ANIMALS).unwrap();
    fs::write(files_dir.join("space.md"), SPACE).unwrap();

    let config_content = r#"[chunking]
max_chunk_chars = 1000

[retrieval]
limit = 5

[generation]
provider = "disabled"
"#;
    let config_path = config_dir.join("docchat.toml");
    fs::write(&config_path, config_content).unwrap();

    (tmp, config_path)
}

fn file(tmp: &TempDir, name: &str) -> String {
    tmp.path().join("files").join(name).display().to_string()
}

fn run_docchat(config_path: &Path, args: &[&str]) -> (String, String, bool) {
    let binary = docchat_binary();
    let output = Command::new(&binary)
        .arg("--config")
        .arg(config_path.to_str().unwrap())
        .args(args)
        .env_remove("DOCCHAT_LOG")
        .output()
        .unwrap_or_else(|e| panic!("Failed to run docchat binary at {:?}: {}", binary, e));

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    (stdout, stderr, output.status.success())
}

#[test]
fn test_search_ranks_matching_document() {
    let (tmp, config_path) = setup_test_env();
    let animals = file(&tmp, "animals.txt");
    let space = file(&tmp, "space.md");

    let (stdout, stderr, success) = run_docchat(
        &config_path,
        &["search", "cats sleep", "-f", &animals, "-f", &space],
    );
    assert!(success, "search failed: stdout={}, stderr={}", stdout, stderr);

    let first = stdout.lines().next().unwrap_or_default();
    assert!(first.starts_with("1. ["), "unexpected output: {}", stdout);
    assert!(first.contains("animals (chunk 0)"), "unexpected output: {}", stdout);
    assert!(!stdout.contains("space"), "space.md should not match: {}", stdout);
}

#[test]
fn test_search_no_results() {
    let (tmp, config_path) = setup_test_env();
    let animals = file(&tmp, "animals.txt");

    let (stdout, _, success) = run_docchat(&config_path, &["search", "the a an", "-f", &animals]);
    assert!(success);
    assert!(stdout.contains("No results."));
}

#[test]
fn test_search_deterministic() {
    let (tmp, config_path) = setup_test_env();
    let animals = file(&tmp, "animals.txt");
    let space = file(&tmp, "space.md");
    let args = ["search", "animals rockets", "-f", &animals, "-f", &space];

    let (stdout1, _, _) = run_docchat(&config_path, &args);
    let (stdout2, _, _) = run_docchat(&config_path, &args);
    assert_eq!(stdout1, stdout2, "search results should be deterministic");
}

#[test]
fn test_search_respects_limit() {
    let (tmp, config_path) = setup_test_env();
    let animals = file(&tmp, "animals.txt");
    let space = file(&tmp, "space.md");

    let (stdout, _, success) = run_docchat(
        &config_path,
        &["search", "animals rockets", "-f", &animals, "-f", &space, "--limit", "1"],
    );
    assert!(success);
    assert!(stdout.contains("1. ["));
    assert!(!stdout.contains("2. ["), "expected one result, got: {}", stdout);
}

#[test]
fn test_chunks_splits_on_sentences() {
    let (tmp, config_path) = setup_test_env();
    let path = tmp.path().join("files").join("short.txt");
    fs::write(&path, "Alpha beta. Gamma delta. Epsilon.").unwrap();

    let (stdout, stderr, success) = run_docchat(
        &config_path,
        &["chunks", path.to_str().unwrap(), "--max-chars", "12"],
    );
    assert!(success, "chunks failed: stderr={}", stderr);
    assert!(stdout.contains("--- chunk 0 (11 chars) ---\nAlpha beta."));
    assert!(stdout.contains("--- chunk 1 (12 chars) ---\nGamma delta."));
    assert!(stdout.contains("--- chunk 2 (8 chars) ---\nEpsilon."));
}

#[test]
fn test_chunks_empty_document() {
    let (tmp, config_path) = setup_test_env();
    let path = tmp.path().join("files").join("empty.txt");
    fs::write(&path, "   \n").unwrap();

    let (stdout, _, success) = run_docchat(&config_path, &["chunks", path.to_str().unwrap()]);
    assert!(success);
    assert!(stdout.contains("No chunks"));
}

#[test]
fn test_status_json() {
    let (tmp, config_path) = setup_test_env();
    let animals = file(&tmp, "animals.txt");
    let space = file(&tmp, "space.md");

    let (stdout, stderr, success) = run_docchat(
        &config_path,
        &["status", "-f", &animals, "-f", &space, "--json"],
    );
    assert!(success, "status failed: stderr={}", stderr);

    let status: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(status["documents"], 2);
    assert_eq!(status["chunks"], 2);
    assert_eq!(status["conversations"], 0);
    assert_eq!(status["snapshot_generation"], 3);
    assert_eq!(
        status["storage"]["used"],
        (ANIMALS.len() + SPACE.len()) as u64
    );
}

#[test]
fn test_status_without_files() {
    let (_tmp, config_path) = setup_test_env();

    let (stdout, _, success) = run_docchat(&config_path, &["status"]);
    assert!(success);
    assert!(stdout.starts_with("docchat status\n"), "got: {}", stdout);
    assert!(!stdout.contains('\u{2014}'));
    assert!(stdout.contains("Documents:      0"));
    assert!(stdout.contains("Chunks:         0"));
}

#[test]
fn test_help_text_is_plain_ascii() {
    let (_tmp, config_path) = setup_test_env();

    let (stdout, _, success) = run_docchat(&config_path, &["--help"]);
    assert!(success);
    assert!(stdout.contains("docchat: a document-grounded chat assistant"));
    assert!(stdout.contains("serve"));
    assert!(stdout.is_ascii(), "non-ASCII in help: {}", stdout);
}

#[test]
fn test_ask_fails_when_generation_disabled() {
    let (tmp, config_path) = setup_test_env();
    let animals = file(&tmp, "animals.txt");

    let (_, stderr, success) = run_docchat(&config_path, &["ask", "When do cats sleep?", "-f", &animals]);
    assert!(!success);
    assert!(
        stderr.contains("Failed to generate AI response"),
        "unexpected stderr: {}",
        stderr
    );
    assert!(stderr.contains("disabled"));
}

#[test]
fn test_chat_reports_errors_and_exits_on_eof() {
    let (tmp, config_path) = setup_test_env();
    let animals = file(&tmp, "animals.txt");

    let mut child = Command::new(docchat_binary())
        .arg("--config")
        .arg(&config_path)
        .args(["chat", "-f", &animals])
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .unwrap();
    child
        .stdin
        .take()
        .unwrap()
        .write_all(b"When do cats sleep?\n\nexit\n")
        .unwrap();
    let output = child.wait_with_output().unwrap();

    assert!(output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Error:"), "unexpected stderr: {}", stderr);
}

#[test]
fn test_missing_explicit_config_fails() {
    let tmp = TempDir::new().unwrap();
    let missing = tmp.path().join("nope.toml");

    let (_, stderr, success) = run_docchat(&missing, &["status"]);
    assert!(!success);
    assert!(stderr.contains("Failed to read config file"));
}

#[test]
fn test_invalid_config_rejected() {
    let (_tmp, config_path) = setup_test_env();
    fs::write(&config_path, "[chunking]\nmax_chunk_chars = 0\n").unwrap();

    let (_, stderr, success) = run_docchat(&config_path, &["status"]);
    assert!(!success);
    assert!(stderr.contains("max_chunk_chars must be > 0"));
}
