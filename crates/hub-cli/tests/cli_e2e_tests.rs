//! End-to-end tests that run the compiled `hubsync` binary.

use std::io::{Read, Write};
use std::net::TcpListener;
use std::path::Path;
use std::thread;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

/// A `hubsync` command rooted at `dir` with no host configured.
fn hubsync(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("hubsync").expect("Failed to find hubsync binary");
    cmd.current_dir(dir).env_remove("HUBITAT_HOST").env_remove("RUST_LOG");
    cmd
}

/// Serve `(path, body)` pairs over HTTP on a background thread.
///
/// Unknown paths get a 404. Returns the `host:port` to point hubsync at.
fn stub_hub(routes: Vec<(&'static str, &'static str)>) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let host = listener.local_addr().unwrap().to_string();

    thread::spawn(move || {
        for stream in listener.incoming() {
            let Ok(mut stream) = stream else { return };
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                match stream.read(&mut buf) {
                    Ok(0) | Err(_) => break,
                    Ok(n) => request.extend_from_slice(&buf[..n]),
                }
            }
            let request = String::from_utf8_lossy(&request);
            let path = request.split_whitespace().nth(1).unwrap_or_default();

            let (status, body) = match routes.iter().find(|(p, _)| *p == path) {
                Some((_, body)) => ("200 OK", *body),
                None => ("404 Not Found", "not found"),
            };
            let response = format!(
                "HTTP/1.1 {status}\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                body.len()
            );
            stream.write_all(response.as_bytes()).ok();
        }
    });

    host
}

// ============================================================================
// Help
// ============================================================================

#[test]
fn help_lists_commands() {
    let dir = TempDir::new().unwrap();
    hubsync(dir.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("pull"))
        .stdout(predicate::str::contains("push"))
        .stdout(predicate::str::contains("install"));
}

#[test]
fn version_names_binary() {
    let dir = TempDir::new().unwrap();
    hubsync(dir.path())
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("hubsync"));
}

// ============================================================================
// Validation errors exit non-zero without touching anything
// ============================================================================

#[test]
fn unknown_type_is_rejected() {
    let dir = TempDir::new().unwrap();
    hubsync(dir.path())
        .args(["pull", "widgets"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid type \"widgets\""));
    assert!(!dir.path().join("manifest.json").exists());
}

#[test]
fn non_numeric_id_is_rejected() {
    let dir = TempDir::new().unwrap();
    hubsync(dir.path())
        .args(["push", "driver", "abc"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("ID must be a number"));
}

#[test]
fn missing_host_is_fatal() {
    let dir = TempDir::new().unwrap();
    hubsync(dir.path())
        .arg("pull")
        .assert()
        .failure()
        .stderr(predicate::str::contains("not configured"));
}

#[test]
fn invalid_config_is_fatal() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("hubsync.toml"), "[sync]\nconcurrency = 0\n").unwrap();
    hubsync(dir.path())
        .env("HUBITAT_HOST", "127.0.0.1:9")
        .arg("pull")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid configuration"));
}

#[test]
fn install_requires_groovy_file() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("notes.txt"), "hello").unwrap();
    hubsync(dir.path())
        .env("HUBITAT_HOST", "127.0.0.1:9")
        .args(["install", "app", "notes.txt"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not a .groovy file"));
}

#[test]
fn unreachable_hub_fails_listing() {
    let dir = TempDir::new().unwrap();
    hubsync(dir.path())
        .env("HUBITAT_HOST", "127.0.0.1:9")
        .args(["pull", "app"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("error"));
    assert!(!dir.path().join("manifest.json").exists());
}

// ============================================================================
// Against a stub hub
// ============================================================================

const APP_LIST: &str = r#"<table id="hubitapps-table"><tbody>
<tr class="app-row" data-app-id="1"><td><a href="/app/editor/1">Motion Lights</a></td><td>acme</td></tr>
</tbody></table>"#;

const APP_CODE: &str = r#"{"id":1,"version":5,"source":"definition(name: \"Motion Lights\")","status":"success"}"#;

#[test]
fn pull_creates_file_and_manifest() {
    let dir = TempDir::new().unwrap();
    let host = stub_hub(vec![("/app/list", APP_LIST), ("/app/ajax/code?id=1", APP_CODE)]);

    hubsync(dir.path())
        .env("HUBITAT_HOST", &host)
        .args(["pull", "app"])
        .assert()
        .success()
        .stdout(predicate::str::contains("acme-motion_lights.groovy"))
        .stdout(predicate::str::contains("1 changed"));

    let source = std::fs::read_to_string(dir.path().join("apps/acme-motion_lights.groovy")).unwrap();
    assert_eq!(source, "definition(name: \"Motion Lights\")");

    let manifest = std::fs::read_to_string(dir.path().join("manifest.json")).unwrap();
    assert!(manifest.contains("\"version\": 5"), "manifest: {manifest}");
}

#[test]
fn pull_json_reports_actions() {
    let dir = TempDir::new().unwrap();
    let host = stub_hub(vec![("/app/list", APP_LIST), ("/app/ajax/code?id=1", APP_CODE)]);

    let output = hubsync(dir.path())
        .env("HUBITAT_HOST", &host)
        .args(["--json", "pull", "app"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["actions"][0]["action"], "created");
    assert_eq!(report["actions"][0]["filename"], "acme-motion_lights.groovy");
    assert_eq!(report["failures"].as_array().unwrap().len(), 0);
}

#[test]
fn missing_resource_is_reported_but_exits_zero() {
    let dir = TempDir::new().unwrap();
    let host = stub_hub(vec![("/app/list", APP_LIST)]);

    hubsync(dir.path())
        .env("HUBITAT_HOST", &host)
        .args(["pull", "app", "42"])
        .assert()
        .success()
        .stdout(predicate::str::contains("not found"));
}

#[test]
fn list_prints_namespace() {
    let dir = TempDir::new().unwrap();
    let host = stub_hub(vec![("/app/list", APP_LIST)]);

    hubsync(dir.path())
        .env("HUBITAT_HOST", &host)
        .args(["list", "apps"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Motion Lights"))
        .stdout(predicate::str::contains("acme"));
}
