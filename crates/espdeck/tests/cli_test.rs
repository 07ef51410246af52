//! Integration tests for the `espdeck` CLI binary.
//!
//! Argument parsing, help output and completions run without a bridge;
//! bridge-bound commands run against a wiremock server.
#![allow(clippy::unwrap_used)]

use std::path::Path;
use std::time::Duration;

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use serde_json::json;
use wiremock::matchers::{body_json, method, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ── Helpers ─────────────────────────────────────────────────────────

/// Build a [`Command`] for the `espdeck` binary with env isolation.
///
/// Clears all `ESPDECK_*` env vars and points the config file at a
/// nonexistent path so tests never touch the user's real configuration.
fn espdeck_cmd() -> assert_cmd::Command {
    espdeck_cmd_with_config(Path::new("/tmp/espdeck-cli-test-nonexistent/config.toml"))
}

fn espdeck_cmd_with_config(config: &Path) -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("espdeck");
    cmd.env("ESPDECK_CONFIG", config)
        .env("NO_COLOR", "1")
        .env_remove("ESPDECK_PROFILE")
        .env_remove("ESPDECK_ENDPOINT")
        .env_remove("ESPDECK_OUTPUT")
        .env_remove("ESPDECK_INSECURE")
        .env_remove("ESPDECK_TIMEOUT")
        .env_remove("ESPDECK_POLL_INTERVAL")
        .env_remove("RUST_LOG");
    cmd
}

/// Concatenate stdout + stderr from a command output for flexible matching.
fn combined_output(output: &std::process::Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    format!("{stdout}{stderr}")
}

fn device(id: &str, name: &str, kind: &str, status: bool, value: f64) -> serde_json::Value {
    json!({
        "id": id,
        "name": name,
        "type": kind,
        "status": status,
        "icon": "Lightbulb",
        "value": value
    })
}

async fn mount_devices(server: &MockServer) {
    Mock::given(method("GET"))
        .and(query_param("endpoint", "devices"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "devices": [
                device("1", "Living room", "light", true, 75.0),
                device("2", "Thermostat", "climate", false, 21.5)
            ],
            "timestamp": "t"
        })))
        .mount(server)
        .await;
}

async fn mount_status(server: &MockServer) {
    Mock::given(method("GET"))
        .and(query_param("endpoint", "status"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "esp32": {
                "connected": true,
                "uptime": "12:34:56",
                "signal": 85,
                "memory": 62,
                "ip_address": "192.168.1.100",
                "mac_address": "A4:CF:12:8E:5F:23",
                "firmware_version": "v2.4.1",
                "wifi_ssid": "SmartHome_5G",
                "mqtt_server": "mqtt.home.local:1883"
            }
        })))
        .mount(server)
        .await;
}

async fn mount_logs(server: &MockServer) {
    Mock::given(method("GET"))
        .and(query_param("endpoint", "logs"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "logs": [
                {
                    "timestamp": "2024-06-15T10:35:00",
                    "level": "ERROR",
                    "action": "update_value",
                    "device_id": "2",
                    "device_name": "Thermostat",
                    "message": "Sensor offline",
                    "request_id": "deadbeefcafef00d"
                },
                {
                    "timestamp": "2024-06-15T10:30:00",
                    "level": "INFO",
                    "action": "status",
                    "device_id": null,
                    "device_name": null,
                    "message": "Status polled",
                    "request_id": "0123456789abcdef"
                }
            ]
        })))
        .mount(server)
        .await;
}

fn endpoint(server: &MockServer) -> String {
    format!("{}/api/bridge", server.uri())
}

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn test_no_args_shows_help() {
    let output = espdeck_cmd().output().unwrap();
    assert_eq!(output.status.code(), Some(2), "Expected exit code 2");
    let text = combined_output(&output);
    assert!(text.contains("Usage"), "Expected 'Usage' in output:\n{text}");
}

#[test]
fn test_help_flag() {
    espdeck_cmd().arg("--help").assert().success().stdout(
        predicate::str::contains("smart-home bridge")
            .and(predicate::str::contains("devices"))
            .and(predicate::str::contains("status"))
            .and(predicate::str::contains("logs"))
            .and(predicate::str::contains("watch")),
    );
}

#[test]
fn test_version_flag() {
    espdeck_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("espdeck"));
}

#[test]
fn test_devices_subcommands_exist() {
    espdeck_cmd()
        .args(["devices", "--help"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("list")
                .and(predicate::str::contains("get"))
                .and(predicate::str::contains("toggle"))
                .and(predicate::str::contains("set")),
        );
}

// ── Shell completions ───────────────────────────────────────────────

#[test]
fn test_completions_bash() {
    espdeck_cmd()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty().not());
}

#[test]
fn test_completions_zsh() {
    espdeck_cmd()
        .args(["completions", "zsh"])
        .assert()
        .success()
        .stdout(predicate::str::contains("#compdef"));
}

// ── Usage errors ────────────────────────────────────────────────────

#[test]
fn test_devices_list_without_endpoint() {
    espdeck_cmd()
        .args(["devices", "list"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No bridge endpoint configured"));
}

#[test]
fn test_unknown_profile() {
    espdeck_cmd()
        .args(["--profile", "cabin", "status"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("cabin"));
}

#[test]
fn test_invalid_output_format() {
    let output = espdeck_cmd()
        .args(["--output", "invalid", "devices", "list"])
        .output()
        .unwrap();
    assert!(!output.status.success());
    let text = combined_output(&output);
    assert!(
        text.contains("invalid") || text.contains("possible values"),
        "Expected error about valid output formats:\n{text}"
    );
}

#[test]
fn test_invalid_endpoint_is_usage_error() {
    espdeck_cmd()
        .args(["--endpoint", "ftp://bridge", "status"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("endpoint"));
}

// ── Reads ───────────────────────────────────────────────────────────

#[tokio::test(flavor = "multi_thread")]
async fn test_devices_list_json() {
    let server = MockServer::start().await;
    mount_devices(&server).await;

    let output = espdeck_cmd()
        .args(["--endpoint", &endpoint(&server), "-o", "json", "devices", "list"])
        .output()
        .unwrap();

    assert!(output.status.success(), "{}", combined_output(&output));
    let parsed: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(parsed[0]["id"], "1");
    assert_eq!(parsed[0]["category"], "light");
    assert_eq!(parsed[1]["category"], "climate");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_devices_list_plain() {
    let server = MockServer::start().await;
    mount_devices(&server).await;

    espdeck_cmd()
        .args(["--endpoint", &endpoint(&server), "-o", "plain", "devices", "list"])
        .assert()
        .success()
        .stdout("1\n2\n");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_devices_get_missing_is_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(query_param("endpoint", "device"))
        .and(query_param("id", "42"))
        .respond_with(
            ResponseTemplate::new(404).set_body_json(json!({ "error": "Device not found" })),
        )
        .mount(&server)
        .await;

    espdeck_cmd()
        .args(["--endpoint", &endpoint(&server), "devices", "get", "42"])
        .assert()
        .code(4)
        .stderr(predicate::str::contains("devices list"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_status_table() {
    let server = MockServer::start().await;
    mount_status(&server).await;

    espdeck_cmd()
        .args(["--endpoint", &endpoint(&server), "status"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("ONLINE")
                .and(predicate::str::contains("85%"))
                .and(predicate::str::contains("SmartHome_5G")),
        );
}

#[tokio::test(flavor = "multi_thread")]
async fn test_logs_level_filter() {
    let server = MockServer::start().await;
    mount_logs(&server).await;

    espdeck_cmd()
        .args(["--endpoint", &endpoint(&server), "logs", "--level", "error"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("Sensor offline")
                .and(predicate::str::contains("deadbeef"))
                .and(predicate::str::contains("Status polled").not()),
        );
}

#[tokio::test(flavor = "multi_thread")]
async fn test_logs_limit_is_forwarded() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(query_param("endpoint", "logs"))
        .and(query_param("limit", "5"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "logs": [] })))
        .expect(1)
        .mount(&server)
        .await;

    espdeck_cmd()
        .args(["--endpoint", &endpoint(&server), "logs", "-n", "5"])
        .assert()
        .success();
}

// ── Writes ──────────────────────────────────────────────────────────

#[tokio::test(flavor = "multi_thread")]
async fn test_toggle_prints_server_device() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(body_json(json!({ "action": "toggle", "device_id": "1" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "device": device("1", "Living room", "light", false, 75.0)
        })))
        .expect(1)
        .mount(&server)
        .await;

    espdeck_cmd()
        .args(["--endpoint", &endpoint(&server), "devices", "toggle", "1"])
        .assert()
        .success()
        .stderr(predicate::str::contains("Living room is now off"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_set_clamps_with_warning() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(query_param("endpoint", "device"))
        .and(query_param("id", "2"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(device("2", "Thermostat", "climate", true, 21.5)),
        )
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(body_json(
            json!({ "action": "update_value", "device_id": "2", "value": 30.0 }),
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "device": device("2", "Thermostat", "climate", true, 30.0)
        })))
        .expect(1)
        .mount(&server)
        .await;

    espdeck_cmd()
        .args(["--endpoint", &endpoint(&server), "devices", "set", "2", "45"])
        .assert()
        .success()
        .stderr(
            predicate::str::contains("warning:")
                .and(predicate::str::contains("Thermostat set to 30°C")),
        );
}

#[tokio::test(flavor = "multi_thread")]
async fn test_restart_requires_yes_without_terminal() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true })))
        .expect(0)
        .mount(&server)
        .await;

    espdeck_cmd()
        .args(["--endpoint", &endpoint(&server), "restart"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("--yes"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_restart_acknowledged() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(body_json(json!({ "action": "restart" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "message": "ESP32 restart initiated"
        })))
        .expect(1)
        .mount(&server)
        .await;

    espdeck_cmd()
        .args(["--endpoint", &endpoint(&server), "--yes", "restart"])
        .assert()
        .success()
        .stderr(predicate::str::contains("ESP32 restart initiated"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_restart_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "success": false, "error": "busy" })),
        )
        .mount(&server)
        .await;

    espdeck_cmd()
        .args(["--endpoint", &endpoint(&server), "-y", "restart"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("busy"));
}

// ── Transport failures ──────────────────────────────────────────────

#[test]
fn test_connection_refused_exit_code() {
    espdeck_cmd()
        .args(["--endpoint", "http://127.0.0.1:9/api", "status"])
        .assert()
        .code(7);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_timeout_exit_code() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "devices": [] }))
                .set_delay(Duration::from_secs(5)),
        )
        .mount(&server)
        .await;

    espdeck_cmd()
        .args(["--endpoint", &endpoint(&server), "--timeout", "1", "devices", "list"])
        .assert()
        .code(8)
        .stderr(predicate::str::contains("timed out after 1s"));
}

// ── Watch ───────────────────────────────────────────────────────────

#[tokio::test(flavor = "multi_thread")]
async fn test_watch_prints_first_device_snapshot() {
    let server = MockServer::start().await;
    mount_devices(&server).await;
    mount_status(&server).await;
    mount_logs(&server).await;

    espdeck_cmd()
        .args(["--endpoint", &endpoint(&server), "watch", "--count", "1"])
        .timeout(Duration::from_secs(10))
        .assert()
        .success()
        .stdout(predicate::str::contains("devices  2 total, 1 on"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_watch_json_lines() {
    let server = MockServer::start().await;
    mount_devices(&server).await;
    mount_status(&server).await;
    mount_logs(&server).await;

    let output = espdeck_cmd()
        .args([
            "--endpoint",
            &endpoint(&server),
            "-o",
            "json-compact",
            "watch",
            "-c",
            "1",
        ])
        .timeout(Duration::from_secs(10))
        .output()
        .unwrap();

    assert!(output.status.success(), "{}", combined_output(&output));
    let stdout = String::from_utf8_lossy(&output.stdout);
    let devices_line = stdout
        .lines()
        .map(|l| serde_json::from_str::<serde_json::Value>(l).unwrap())
        .find(|v| v["event"] == "devices")
        .unwrap();
    assert_eq!(devices_line["total"], 2);
    assert_eq!(devices_line["active"], 1);
}

// ── Config management ───────────────────────────────────────────────

#[test]
fn test_config_show_no_config() {
    espdeck_cmd().args(["config", "show"]).assert().success();
}

#[test]
fn test_config_path_honors_env() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");

    espdeck_cmd_with_config(&path)
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains(path.display().to_string()));
}

#[test]
fn test_config_set_use_and_profiles() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");

    espdeck_cmd_with_config(&path)
        .args(["--profile", "lab", "config", "set", "endpoint", "http://lab.local/api"])
        .assert()
        .success();
    espdeck_cmd_with_config(&path)
        .args(["--profile", "lab", "config", "set", "poll_interval", "5s"])
        .assert()
        .success();
    espdeck_cmd_with_config(&path)
        .args(["config", "use", "lab"])
        .assert()
        .success();

    espdeck_cmd_with_config(&path)
        .args(["config", "profiles"])
        .assert()
        .success()
        .stdout(predicate::str::contains("lab *"));

    let written = std::fs::read_to_string(&path).unwrap();
    assert!(written.contains("default_profile = \"lab\""), "{written}");
    assert!(written.contains("poll_interval = \"5s\""), "{written}");
}

#[test]
fn test_config_use_unknown_profile() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");

    espdeck_cmd_with_config(&path)
        .args(["config", "use", "nowhere"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("nowhere"));
}

#[test]
fn test_config_set_unknown_key() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");

    espdeck_cmd_with_config(&path)
        .args(["config", "set", "site", "home"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("unknown config key"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_profile_endpoint_is_used() {
    let server = MockServer::start().await;
    mount_status(&server).await;

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(
        &path,
        format!(
            "default_profile = \"home\"\n\n[profiles.home]\nendpoint = \"{}\"\n",
            endpoint(&server)
        ),
    )
    .unwrap();

    espdeck_cmd_with_config(&path)
        .args(["-o", "plain", "status"])
        .assert()
        .success()
        .stdout("ONLINE\n");
}
