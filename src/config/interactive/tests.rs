use super::load_existing_config as load_existing_config_impl;
use crate::config::settings::CONFIG_DIR_ENV;
use serial_test::serial;
use tempfile::TempDir;

#[test]
#[serial]
fn load_existing_config_falls_back_to_defaults() {
    let temp_dir = TempDir::new().expect("should create TempDir successfully");
    // SAFETY: tests touching the environment run under #[serial]
    unsafe { std::env::set_var(CONFIG_DIR_ENV, temp_dir.path()) };

    let config = load_existing_config_impl().expect("config loaded successfully");

    // SAFETY: as above
    unsafe { std::env::remove_var(CONFIG_DIR_ENV) };

    assert_eq!(config.server.name, "Demo");
    assert_eq!(config.logging.filter, "info");
    assert_eq!(config.get_base_dir(), temp_dir.path());
}

#[test]
#[serial]
fn load_existing_config_reads_saved_file() {
    let temp_dir = TempDir::new().expect("should create TempDir successfully");
    std::fs::write(
        temp_dir.path().join("config.toml"),
        "[server]\nname = \"Calculator\"\n\n[logging]\nfilter = \"debug\"\n",
    )
    .expect("writes config");
    // SAFETY: tests touching the environment run under #[serial]
    unsafe { std::env::set_var(CONFIG_DIR_ENV, temp_dir.path()) };

    let config = load_existing_config_impl().expect("config loaded successfully");

    // SAFETY: as above
    unsafe { std::env::remove_var(CONFIG_DIR_ENV) };

    assert_eq!(config.server.name, "Calculator");
    assert_eq!(config.logging.filter, "debug");
}
