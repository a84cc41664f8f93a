use std::process::{Command, Output};

use serde_json::{json, Value};
use tempfile::tempdir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Run the CLI against a backend URL nothing listens on unless overridden.
fn coach(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_coach"))
        .env("OLLAMA_BASE_URL", "http://127.0.0.1:1")
        .env_remove("OLLAMA_MODEL")
        .env_remove("OLLAMA_TIMEOUT_SECONDS")
        .args(args)
        .output()
        .unwrap()
}

fn stdout_json(out: &Output) -> Value {
    serde_json::from_slice(&out.stdout).unwrap()
}

#[test]
fn tasks_lists_registered_names() {
    let out = coach(&["tasks"]);
    assert!(out.status.success());
    let stdout = String::from_utf8(out.stdout).unwrap();
    assert_eq!(stdout.lines().collect::<Vec<_>>(), ["cover_letter", "resume_scoring"]);
}

#[test]
fn run_blank_task_reports_empty_task_name() {
    let out = coach(&["run", "--task", "   "]);
    assert!(!out.status.success());
    let body = stdout_json(&out);
    assert_eq!(body["error"], "empty_task_name");
    assert_eq!(body["status"], 400);
}

#[test]
fn run_unknown_task_reports_unknown_task() {
    let out = coach(&["run", "--task", "unknown_xyz", "--params", "{}"]);
    assert!(!out.status.success());
    let body = stdout_json(&out);
    assert_eq!(body["error"], "unknown_task");
    assert!(body["detail"].as_str().unwrap().contains("unknown_xyz"));
}

#[test]
fn run_rejects_non_object_params() {
    let out = coach(&["run", "--task", "cover_letter", "--params", "[1, 2]"]);
    assert!(!out.status.success());
    assert!(out.stdout.is_empty());
}

#[test]
fn run_unreachable_backend_reports_unavailable() {
    let out = coach(&["run", "--task", "cover_letter", "--params", "{}"]);
    assert!(!out.status.success());
    let body = stdout_json(&out);
    assert_eq!(body["error"], "upstream_unavailable");
    assert_eq!(body["status"], 503);
}

#[tokio::test(flavor = "multi_thread")]
async fn run_resume_scoring_from_params_file() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "response": "```json\n{\"score\": 77.5, \"strengths\": [{\"title\": \"Rust\"}], \"gaps\": \"none\"}\n```",
            "done": true
        })))
        .mount(&server)
        .await;

    let dir = tempdir().unwrap();
    let params_path = dir.path().join("params.json");
    std::fs::write(
        &params_path,
        r#"{"cvText": "8 years of Rust", "jobDescription": "Senior Rust engineer"}"#,
    )
    .unwrap();

    let base_url = server.uri();
    let out = tokio::task::spawn_blocking(move || {
        Command::new(env!("CARGO_BIN_EXE_coach"))
            .args(["--base-url", &base_url, "--timeout-secs", "10"])
            .args(["run", "--task", "resume_scoring", "--params-file"])
            .arg(&params_path)
            .output()
            .unwrap()
    })
    .await
    .unwrap();

    assert!(
        out.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&out.stderr)
    );
    assert_eq!(
        stdout_json(&out),
        json!({
            "score": 78,
            "strengths": [{"title": "Rust", "description": ""}],
            "gaps": [],
            "suggestions": []
        })
    );
}
