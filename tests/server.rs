//! HTTP surface tests against a server bound to an ephemeral port.

use harmony::config::Config;
use serde_json::{json, Value};
use tempfile::TempDir;

async fn start_server(tmp: &TempDir) -> String {
    let mut cfg = Config::minimal();
    cfg.history.path = tmp.path().join("data/history.json");

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = harmony::server::router(&cfg);
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

#[tokio::test]
async fn test_health() {
    let tmp = TempDir::new().unwrap();
    let base = start_server(&tmp).await;

    let body: Value = reqwest::get(format!("{}/health", base))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn test_send_selection_then_history() {
    let tmp = TempDir::new().unwrap();
    let base = start_server(&tmp).await;
    let client = reqwest::Client::new();

    let outcome: Value = client
        .post(format!("{}/messages", base))
        .json(&json!({
            "action": "sendSelection",
            "text": "Feeling nervous<br>Worrying too much",
            "tab": {"id": 4, "title": "GAD-7", "url": "https://example.org/gad7"}
        }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(outcome["status"], "opened");
    assert_eq!(outcome["badge"]["text"], "✓");
    assert_eq!(outcome["badge"]["color"], "#4CAF50");
    let url = outcome["url"].as_str().unwrap().to_string();
    assert!(url.starts_with("https://harmonydata.ac.uk/app/#/import/"));

    let history: Value = client
        .get(format!("{}/history", base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let entries = history["entries"].as_array().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["harmonyUrl"], url.as_str());
    assert_eq!(entries[0]["relative"], "just now");
}

#[tokio::test]
async fn test_failed_selection_reports_error_badge() {
    let tmp = TempDir::new().unwrap();
    let base = start_server(&tmp).await;

    let resp = reqwest::Client::new()
        .post(format!("{}/messages", base))
        .json(&json!({"action": "processPdfText", "text": "\n \n", "tab": {"title": "doc.pdf", "url": "file:///doc.pdf"}}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let outcome: Value = resp.json().await.unwrap();
    assert_eq!(outcome["status"], "failed");
    assert_eq!(outcome["badge"]["text"], "!");
    assert_eq!(outcome["badge"]["color"], "#F44336");
    assert_eq!(outcome["badge"]["clear_after_ms"], 2000);
}

#[tokio::test]
async fn test_unknown_action_is_bad_request() {
    let tmp = TempDir::new().unwrap();
    let base = start_server(&tmp).await;

    let resp = reqwest::Client::new()
        .post(format!("{}/messages", base))
        .json(&json!({"action": "launchRockets"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["code"], "bad_request");
}

#[tokio::test]
async fn test_malformed_json_is_bad_request() {
    let tmp = TempDir::new().unwrap();
    let base = start_server(&tmp).await;

    let resp = reqwest::Client::new()
        .post(format!("{}/messages", base))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["code"], "bad_request");
    assert!(body["error"]["message"].as_str().unwrap().contains("JSON"));
}

#[tokio::test]
async fn test_copy_selection_is_ignored() {
    let tmp = TempDir::new().unwrap();
    let base = start_server(&tmp).await;

    let outcome: Value = reqwest::Client::new()
        .post(format!("{}/messages", base))
        .json(&json!({"action": "copySelection"}))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(outcome["status"], "ignored");
}
