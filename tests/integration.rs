use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

fn harmony_binary() -> PathBuf {
    let mut path = std::env::current_exe().unwrap();
    path.pop(); // remove test binary name
    path.pop(); // remove deps/
    path.push("harmony");
    path
}

/// Two instruments: A = {0, 1}, B = {2, 3}.
const RESPONSE: &str = r#"{
  "instruments": [
    {"name": "GAD-7", "questions": [
      {"question_no": "1", "question_text": "Feeling nervous, anxious or on edge", "topics_auto": ["anxiety"], "matches": [0.9, 0.1, 0.2]},
      {"question_no": "2", "question_text": "Not being able to stop or control worrying", "topics_auto": ["worry"], "matches": [-0.8, 0.75]}
    ]},
    {"name": "PHQ-9", "questions": [
      {"question_no": "1", "question_text": "Little interest or pleasure in doing things", "matches": [0.95]},
      {"question_no": "2", "question_text": "Feeling down, depressed, or hopeless"}
    ]}
  ],
  "ignoredMatches": [{"q1": {"question_index": 1}, "q2": {"question_index": 3}}]
}"#;

fn setup_test_env() -> (TempDir, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().to_path_buf();

    let config_dir = root.join("config");
    fs::create_dir_all(&config_dir).unwrap();

    fs::write(root.join("response.json"), RESPONSE).unwrap();

    let config_content = format!(
        r#"[export]
path = "{root}/out/Harmony.xlsx"

[history]
path = "{root}/data/history.json"

[snapshots]
dir = "{root}/data/harmonisations"

[server]
bind = "127.0.0.1:7341"
"#,
        root = root.display()
    );

    let config_path = config_dir.join("harmony.toml");
    fs::write(&config_path, config_content).unwrap();

    (tmp, config_path)
}

fn run_harmony(config_path: &Path, args: &[&str]) -> (String, String, bool) {
    let binary = harmony_binary();
    let output = Command::new(&binary)
        .arg("--config")
        .arg(config_path.to_str().unwrap())
        .args(args)
        .output()
        .unwrap_or_else(|e| panic!("Failed to run harmony binary at {:?}: {}", binary, e));

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let success = output.status.success();
    (stdout, stderr, success)
}

fn response_path(tmp: &TempDir) -> String {
    tmp.path().join("response.json").to_string_lossy().to_string()
}

#[test]
fn test_matches_json_sorted_and_flagged() {
    let (tmp, config_path) = setup_test_env();

    let (stdout, stderr, success) =
        run_harmony(&config_path, &["matches", &response_path(&tmp), "--json"]);
    assert!(success, "matches failed: stdout={}, stderr={}", stdout, stderr);

    let rows: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    let rows = rows.as_array().unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["question1_index"], 1);
    assert_eq!(rows[0]["question2_index"], 2);
    assert_eq!(rows[0]["match"], -0.8);
    assert_eq!(rows[0]["flagged_as_ignore"], false);
    assert_eq!(rows[1]["question2_index"], 3);
    assert_eq!(rows[1]["flagged_as_ignore"], true);
}

#[test]
fn test_matches_intra_and_search() {
    let (tmp, config_path) = setup_test_env();

    let (stdout, _, success) = run_harmony(
        &config_path,
        &["matches", &response_path(&tmp), "--json", "--intra"],
    );
    assert!(success);
    let rows: Vec<serde_json::Value> = serde_json::from_str(&stdout).unwrap();
    let scores: Vec<f64> = rows.iter().map(|r| r["match"].as_f64().unwrap()).collect();
    assert_eq!(scores, vec![0.95, 0.9, -0.8, 0.75]);

    let (stdout, _, success) = run_harmony(
        &config_path,
        &["matches", &response_path(&tmp), "--json", "--intra", "--search", "ANXIETY"],
    );
    assert!(success);
    let rows: Vec<serde_json::Value> = serde_json::from_str(&stdout).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["match"], 0.9);
}

#[test]
fn test_no_intra_overrides_config() {
    let (tmp, config_path) = setup_test_env();
    let mut config = fs::read_to_string(&config_path).unwrap();
    config.push_str("\n[results]\nintra_instrument = true\n");
    fs::write(&config_path, config).unwrap();

    let (stdout, _, success) = run_harmony(&config_path, &["matches", &response_path(&tmp), "--json"]);
    assert!(success);
    let rows: Vec<serde_json::Value> = serde_json::from_str(&stdout).unwrap();
    assert_eq!(rows.len(), 4);

    let (stdout, _, success) = run_harmony(
        &config_path,
        &["matches", &response_path(&tmp), "--json", "--no-intra"],
    );
    assert!(success);
    let rows: Vec<serde_json::Value> = serde_json::from_str(&stdout).unwrap();
    assert_eq!(rows.len(), 2);

    let (_, _, success) = run_harmony(
        &config_path,
        &["matches", &response_path(&tmp), "--intra", "--no-intra"],
    );
    assert!(!success);
}

#[test]
fn test_matches_text_output() {
    let (tmp, config_path) = setup_test_env();

    let (stdout, _, success) = run_harmony(&config_path, &["matches", &response_path(&tmp)]);
    assert!(success);
    assert!(stdout.contains("2 matches between 70% and 100%"));
    assert!(stdout.contains("(ignored)"));

    let (stdout, _, success) = run_harmony(
        &config_path,
        &["matches", &response_path(&tmp), "--min", "99"],
    );
    assert!(success);
    assert!(stdout.contains("No matches."));
}

#[test]
fn test_matches_rejects_inverted_threshold() {
    let (tmp, config_path) = setup_test_env();
    let (_, _, success) = run_harmony(
        &config_path,
        &["matches", &response_path(&tmp), "--min", "90", "--max", "10"],
    );
    assert!(!success);
}

#[test]
fn test_missing_response_file() {
    let (tmp, config_path) = setup_test_env();
    let missing = tmp.path().join("nope.json");
    let (_, stderr, success) =
        run_harmony(&config_path, &["matches", missing.to_str().unwrap()]);
    assert!(!success);
    assert!(stderr.contains("Failed to read API response"));
}

#[test]
fn test_export_writes_workbook() {
    let (tmp, config_path) = setup_test_env();

    let (stdout, stderr, success) = run_harmony(&config_path, &["export", &response_path(&tmp)]);
    assert!(success, "export failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("Exported 2 matches"));

    let path = tmp.path().join("out/Harmony.xlsx");
    let file = fs::File::open(&path).unwrap();
    let mut archive = zip::ZipArchive::new(file).unwrap();
    assert!(archive.by_name("xl/worksheets/sheet1.xml").is_ok());
    assert!(archive.by_name("xl/worksheets/sheet2.xml").is_ok());
}

#[test]
fn test_export_without_matrix_to_custom_path() {
    let (tmp, config_path) = setup_test_env();
    let out = tmp.path().join("custom.xlsx");

    let (_, _, success) = run_harmony(
        &config_path,
        &[
            "export",
            &response_path(&tmp),
            "-o",
            out.to_str().unwrap(),
            "--no-matrix",
        ],
    );
    assert!(success);

    let mut archive = zip::ZipArchive::new(fs::File::open(&out).unwrap()).unwrap();
    assert!(archive.by_name("xl/worksheets/sheet1.xml").is_ok());
    assert!(archive.by_name("xl/worksheets/sheet2.xml").is_err());
}

#[test]
fn test_export_is_deterministic() {
    let (tmp, config_path) = setup_test_env();
    let a = tmp.path().join("a.xlsx");
    let b = tmp.path().join("b.xlsx");

    run_harmony(&config_path, &["export", &response_path(&tmp), "-o", a.to_str().unwrap()]);
    run_harmony(&config_path, &["export", &response_path(&tmp), "-o", b.to_str().unwrap()]);
    assert_eq!(fs::read(&a).unwrap(), fs::read(&b).unwrap());
}

#[test]
fn test_encode_decode_url() {
    let (_tmp, config_path) = setup_test_env();

    let (stdout, stderr, success) = run_harmony(
        &config_path,
        &["encode-url", "How often?", "How much?", "--name", "Survey"],
    );
    assert!(success, "encode-url failed: {}", stderr);
    let url = stdout.trim();
    assert!(url.starts_with("https://harmonydata.ac.uk/app/#/import/"));
    assert!(!url.contains('='));

    let (stdout, _, success) = run_harmony(&config_path, &["decode-url", url]);
    assert!(success);
    let payload: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(payload["instrument_name"], "Survey");
    assert_eq!(payload["questions"][0]["question_no"], 0);
    assert_eq!(payload["questions"][1]["question_text"], "How much?");
}

#[test]
fn test_encode_url_from_file() {
    let (tmp, config_path) = setup_test_env();
    let file = tmp.path().join("questions.txt");
    fs::write(&file, "First<br/>Second\n\n  \nThird").unwrap();

    let (stdout, _, success) =
        run_harmony(&config_path, &["encode-url", "--file", file.to_str().unwrap()]);
    assert!(success);

    let (decoded, _, _) = run_harmony(&config_path, &["decode-url", stdout.trim()]);
    let payload: serde_json::Value = serde_json::from_str(&decoded).unwrap();
    assert_eq!(payload["questions"].as_array().unwrap().len(), 3);
    assert!(payload.get("instrument_name").is_none());
}

#[test]
fn test_decode_invalid_url() {
    let (_tmp, config_path) = setup_test_env();
    let (_, _, success) = run_harmony(&config_path, &["decode-url", "https://example.org/page"]);
    assert!(!success);
}

#[test]
fn test_send_records_history() {
    let (_tmp, config_path) = setup_test_env();

    let (stdout, stderr, success) = run_harmony(
        &config_path,
        &[
            "send",
            "--title",
            "GAD-7",
            "--url",
            "https://example.org/gad7",
            "Feeling nervous",
        ],
    );
    assert!(success, "send failed: {}", stderr);
    let url = stdout.trim().to_string();

    let (stdout, _, success) = run_harmony(&config_path, &["history", "list"]);
    assert!(success);
    assert!(stdout.contains("1. Feeling nervous (just now)"));
    assert!(stdout.contains("from: https://example.org/gad7"));

    let (stdout, _, success) = run_harmony(&config_path, &["history", "open", "1"]);
    assert!(success);
    assert_eq!(stdout.trim(), url);
}

#[test]
fn test_history_capped_at_ten() {
    let (tmp, config_path) = setup_test_env();

    for n in 0..12 {
        let q = format!("Question {}", n);
        let (_, _, success) = run_harmony(&config_path, &["send", &q]);
        assert!(success);
    }

    let json = fs::read_to_string(tmp.path().join("data/history.json")).unwrap();
    let entries: Vec<serde_json::Value> = serde_json::from_str(&json).unwrap();
    assert_eq!(entries.len(), 10);
    assert_eq!(entries[0]["text"], "Question 11");
    assert_eq!(entries[9]["text"], "Question 2");
    assert!(entries[0].get("harmonyUrl").is_some());
}

#[test]
fn test_history_empty() {
    let (_tmp, config_path) = setup_test_env();
    let (stdout, _, success) = run_harmony(&config_path, &["history", "list"]);
    assert!(success);
    assert!(stdout.contains("No history."));
}

#[test]
fn test_snapshot_save_and_show() {
    let (tmp, config_path) = setup_test_env();

    let (stdout, stderr, success) = run_harmony(
        &config_path,
        &["snapshot", "save", &response_path(&tmp), "--public", "--min", "50"],
    );
    assert!(success, "snapshot save failed: {}", stderr);
    let link = stdout.trim();
    assert!(link.starts_with("https://harmonydata.ac.uk/app/#/model/"));

    let (stdout, _, success) = run_harmony(&config_path, &["snapshot", "show", link]);
    assert!(success);
    let doc: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(doc["public"], true);
    assert_eq!(doc["resultsOptions"]["threshold"], serde_json::json!([50, 100]));
    assert_eq!(doc["apiData"]["instruments"][1]["name"], "PHQ-9");
}

#[test]
fn test_invalid_config_rejected() {
    let (tmp, _) = setup_test_env();
    let bad = tmp.path().join("bad.toml");
    fs::write(&bad, "[results]\nthreshold = [80, 20]\n").unwrap();
    let (_, stderr, success) = run_harmony(&bad, &["history", "list"]);
    assert!(!success);
    assert!(stderr.contains("threshold"));
}
