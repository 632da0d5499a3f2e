//! End-to-end CLI tests for the projctl binary.

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

mod support;
use support::socket_guard::start_mock_server_or_skip;

/// Command with an isolated config dir and no inherited credentials.
fn projctl(config_home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("projctl").unwrap();
    cmd.env("XDG_CONFIG_HOME", config_home.path())
        .env_remove("PROJCTL_API_URL")
        .env_remove("PROJCTL_FILES_URL")
        .env_remove("PROJCTL_TOKEN")
        .env_remove("PROJCTL_CLIENT_ID")
        .env_remove("PROJCTL_COMPANY_ID")
        .env_remove("RUST_LOG");
    cmd
}

fn projctl_for(config_home: &TempDir, server: &MockServer) -> Command {
    let mut cmd = projctl(config_home);
    cmd.env("PROJCTL_API_URL", format!("{}/graphql", server.uri()))
        .env("PROJCTL_FILES_URL", format!("{}/files", server.uri()))
        .env("PROJCTL_TOKEN", "e2e-token");
    cmd
}

async fn mount_listing(server: &MockServer, items: serde_json::Value) {
    let total = items.as_array().map_or(0, Vec::len);
    Mock::given(method("POST"))
        .and(path("/graphql"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {
                "files": {
                    "items": items,
                    "pageInfo": { "totalItems": total, "hasNextPage": false }
                }
            }
        })))
        .mount(server)
        .await;
}

/// Test that --help displays usage information and exits with code 0.
#[test]
fn test_binary_help_displays_usage() {
    let config_home = TempDir::new().unwrap();
    projctl(&config_home)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("files"));
}

/// Test that the download subcommand documents its flags.
#[test]
fn test_binary_download_help_lists_flags() {
    let config_home = TempDir::new().unwrap();
    projctl(&config_home)
        .args(["files", "download", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--project"))
        .stdout(predicate::str::contains("--parallel"))
        .stdout(predicate::str::contains("--output"));
}

/// Test that --version displays version and exits with code 0.
#[test]
fn test_binary_version_displays_version() {
    let config_home = TempDir::new().unwrap();
    projctl(&config_home)
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("projctl"));
}

/// Test that invalid flags cause non-zero exit.
#[test]
fn test_binary_invalid_flag_returns_error() {
    let config_home = TempDir::new().unwrap();
    projctl(&config_home)
        .arg("--invalid-flag")
        .assert()
        .failure()
        .stderr(predicate::str::contains("error"));
}

#[test]
fn test_binary_parallel_out_of_range_rejected() {
    let config_home = TempDir::new().unwrap();
    projctl(&config_home)
        .args(["files", "download", "--project", "p", "--parallel", "0"])
        .assert()
        .failure();
}

#[test]
fn test_binary_missing_token_fails() {
    let config_home = TempDir::new().unwrap();
    projctl(&config_home)
        .args(["files", "download", "--project", "p"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("PROJCTL_TOKEN"));
}

#[test]
fn test_binary_invalid_config_file_fails() {
    let config_home = TempDir::new().unwrap();
    let dir = config_home.path().join("projctl");
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("config.toml"), "parallel = 500\n").unwrap();

    projctl(&config_home)
        .env("PROJCTL_TOKEN", "t")
        .args(["files", "download", "--project", "p"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("parallel"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_binary_downloads_project_into_archive() {
    let Some(mock_server) = start_mock_server_or_skip().await else {
        return;
    };
    mount_listing(
        &mock_server,
        json!([
            { "uid": "a", "name": "alpha", "extension": "txt" },
            { "uid": "b", "name": "beta", "extension": "txt" },
            { "uid": "c", "name": "gamma", "extension": "txt" }
        ]),
    )
    .await;
    for (id, body) in [("a", "AAA"), ("b", "BBB")] {
        Mock::given(method("GET"))
            .and(path(format!("/files/{id}")))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .mount(&mock_server)
            .await;
    }
    Mock::given(method("GET"))
        .and(path("/files/c"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    let config_home = TempDir::new().unwrap();
    let out_dir = TempDir::new().unwrap();
    let output = out_dir.path().join("bundle.zip");

    let mut cmd = projctl_for(&config_home, &mock_server);
    cmd.args(["-q", "files", "download", "--project", "p-1", "-p", "2", "-o"])
        .arg(&output);
    let assert = tokio::task::spawn_blocking(move || cmd.assert())
        .await
        .unwrap();

    assert
        .success()
        .stdout(predicate::str::contains("succeeded: 2, failed: 1"))
        .stderr(predicate::str::contains("gamma.txt"));

    let archive = zip::ZipArchive::new(std::fs::File::open(&output).unwrap()).unwrap();
    let mut names: Vec<&str> = archive.file_names().collect();
    names.sort_unstable();
    assert_eq!(names, vec!["alpha.txt", "beta.txt"]);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_binary_empty_project_reports_no_files() {
    let Some(mock_server) = start_mock_server_or_skip().await else {
        return;
    };
    mount_listing(&mock_server, json!([])).await;

    let config_home = TempDir::new().unwrap();
    let out_dir = TempDir::new().unwrap();
    let output = out_dir.path().join("none.zip");

    let mut cmd = projctl_for(&config_home, &mock_server);
    cmd.args(["files", "download", "--project", "empty", "-o"])
        .arg(&output);
    let assert = tokio::task::spawn_blocking(move || cmd.assert())
        .await
        .unwrap();

    assert
        .success()
        .stdout(predicate::str::contains("no files found"));
    assert!(!output.exists());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_binary_listing_failure_exits_non_zero() {
    let Some(mock_server) = start_mock_server_or_skip().await else {
        return;
    };
    Mock::given(method("POST"))
        .and(path("/graphql"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&mock_server)
        .await;

    let config_home = TempDir::new().unwrap();
    let mut cmd = projctl_for(&config_home, &mock_server);
    cmd.args(["files", "download", "--project", "p-1"]);
    let assert = tokio::task::spawn_blocking(move || cmd.assert())
        .await
        .unwrap();

    assert.failure().stderr(predicate::str::contains("401"));
}
