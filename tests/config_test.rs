// Config::from_env tests; each one mutates process environment, so they run serially

use dairy_stats::config::{Config, DEFAULT_ABS_API_BASE, DEFAULT_DATABASE_URL, DEFAULT_USER_AGENT};
use serial_test::serial;
use std::path::PathBuf;

const VARS: [&str; 6] = [
    "DATABASE_URL",
    "DATA_DIR",
    "FIGURE_DIR",
    "DOWNLOAD_TIMEOUT_SECS",
    "HTTP_USER_AGENT",
    "ABS_API_BASE",
];

fn clear_env() {
    for var in VARS {
        std::env::remove_var(var);
    }
}

#[test]
#[serial]
fn test_defaults() {
    clear_env();

    let config = Config::from_env();

    assert_eq!(config.database_url, DEFAULT_DATABASE_URL);
    assert_eq!(config.data_dir, PathBuf::from("data"));
    assert_eq!(config.figure_dir, PathBuf::from("paper/figures"));
    assert_eq!(config.download_timeout_secs, 120);
    assert_eq!(config.user_agent, DEFAULT_USER_AGENT);
    assert_eq!(config.abs_api_base, DEFAULT_ABS_API_BASE);
    assert_eq!(config.raw_dir(), PathBuf::from("data/raw"));
    assert_eq!(config.processed_dir(), PathBuf::from("data/processed"));
    assert_eq!(config.export_path(), PathBuf::from("data/final/aus_dairy_stats.csv"));
}

#[test]
#[serial]
fn test_environment_overrides() {
    clear_env();
    std::env::set_var("DATABASE_URL", "sqlite://tmp/test.db");
    std::env::set_var("DATA_DIR", "/srv/dairy");
    std::env::set_var("DOWNLOAD_TIMEOUT_SECS", "15");
    std::env::set_var("HTTP_USER_AGENT", "tester/0.1");

    let config = Config::from_env();

    assert_eq!(config.database_url, "sqlite://tmp/test.db");
    assert_eq!(config.raw_dir(), PathBuf::from("/srv/dairy/raw"));
    assert_eq!(config.download_timeout_secs, 15);
    assert_eq!(config.user_agent, "tester/0.1");

    clear_env();
}

#[test]
#[serial]
fn test_unparseable_timeout_falls_back_to_default() {
    clear_env();
    std::env::set_var("DOWNLOAD_TIMEOUT_SECS", "two minutes");

    assert_eq!(Config::from_env().download_timeout_secs, 120);

    clear_env();
}
