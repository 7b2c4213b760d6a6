use chatdeck::config::{Config, API_URL_ENV, DEFAULT_API_BASE_URL};
use serial_test::serial;
use std::fs;
use tempfile::TempDir;

fn clear_env() {
    // SAFETY: every test touching the environment runs serially.
    unsafe { std::env::remove_var(API_URL_ENV) };
}

#[test]
#[serial]
fn missing_file_yields_defaults() {
    clear_env();
    let dir = TempDir::new().unwrap();
    let config = Config::load(Some(&dir.path().join("absent.toml"))).unwrap();

    assert_eq!(config.api_base_url, DEFAULT_API_BASE_URL);
    assert_eq!(config.request_timeout_secs, 30);
    assert_eq!(config.ui.tick_rate_ms, 50);
}

#[test]
#[serial]
fn save_then_load_round_trips_through_disk() {
    clear_env();
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("config.toml");

    let mut config = Config::default();
    config.api_base_url = "http://127.0.0.1:9000/api/chat".to_string();
    config.ui.show_sidebar = false;
    config.save(&path).unwrap();

    let loaded = Config::load(Some(&path)).unwrap();
    assert_eq!(loaded.api_base_url, "http://127.0.0.1:9000/api/chat");
    assert!(!loaded.ui.show_sidebar);
}

#[test]
#[serial]
fn environment_overrides_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(&path, "api_base_url = \"http://file.test/api/chat\"\n").unwrap();

    // SAFETY: serialized with the other environment tests.
    unsafe { std::env::set_var(API_URL_ENV, "http://env.test/api/chat") };
    let config = Config::load(Some(&path)).unwrap();
    clear_env();

    assert_eq!(config.api_base_url, "http://env.test/api/chat");

    let config = config.with_api_url(Some("http://cli.test/api/chat".to_string()));
    assert_eq!(config.api_base_url, "http://cli.test/api/chat");
}

#[test]
#[serial]
fn malformed_file_is_an_error() {
    clear_env();
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(&path, "api_base_url = [not toml").unwrap();

    let err = Config::load(Some(&path)).unwrap_err();
    assert!(err.to_string().contains("Failed to parse config file"));
}
