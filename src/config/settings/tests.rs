use super::*;
use tempfile::TempDir;

#[test]
fn default_config() {
    let config = Config::default();
    assert_eq!(config.server.name, "Demo");
    assert_eq!(config.server.instructions, None);
    assert_eq!(config.logging.filter, "info");
}

#[test]
fn config_validation() {
    let config = Config::default();
    assert!(config.validate().is_ok());

    let mut invalid_config = config.clone();
    invalid_config.server.name = String::new();
    assert!(invalid_config.validate().is_err());

    let mut invalid_config = config.clone();
    invalid_config.server.name = "   ".to_string();
    assert!(invalid_config.validate().is_err());

    let mut invalid_config = config.clone();
    invalid_config.server.name = "x".repeat(MAX_SERVER_NAME_LEN + 1);
    assert!(invalid_config.validate().is_err());

    let mut invalid_config = config;
    invalid_config.logging.filter = "demo_mcp=notalevel".to_string();
    assert!(matches!(
        invalid_config.validate(),
        Err(ConfigError::InvalidLogFilter { .. })
    ));
}

#[test]
fn toml_serialization() {
    let mut config = Config::default();
    config.server.instructions = Some("Adds numbers".to_string());
    let toml_str = toml::to_string(&config).expect("should serialize toml correctly");
    let parsed_config: Config = toml::from_str(&toml_str).expect("should parse toml correctly");
    assert_eq!(config, parsed_config);
}

#[test]
fn setter_validation() {
    let mut server = ServerConfig::default();

    assert!(server.set_name("Calculator".to_string()).is_ok());
    assert_eq!(server.name, "Calculator");

    assert!(server.set_name(String::new()).is_err());
    assert_eq!(server.name, "Calculator");

    server.set_instructions("  Use add for sums  ");
    assert_eq!(server.instructions.as_deref(), Some("Use add for sums"));
    server.set_instructions("   ");
    assert_eq!(server.instructions, None);

    let mut logging = LoggingConfig::default();
    assert!(logging.set_filter("demo_mcp=debug,warn".to_string()).is_ok());
    assert_eq!(logging.filter, "demo_mcp=debug,warn");
    assert!(logging.set_filter("demo_mcp=loud".to_string()).is_err());
    assert_eq!(logging.filter, "demo_mcp=debug,warn");
}

#[test]
fn load_missing_file_returns_defaults() {
    let temp_dir = TempDir::new().expect("should create TempDir successfully");

    let config = Config::load_from(temp_dir.path()).expect("loads defaults");
    assert_eq!(config.server, ServerConfig::default());
    assert_eq!(config.get_base_dir(), temp_dir.path());
}

#[test]
fn save_and_reload() {
    let temp_dir = TempDir::new().expect("should create TempDir successfully");
    let base_dir = temp_dir.path().join("nested");

    let mut config = Config::with_base_dir(&base_dir);
    config
        .server
        .set_name("Calculator".to_string())
        .expect("valid name");
    config.save().expect("saves config");

    assert!(config.config_file_path().exists());

    let loaded = Config::load_from(&base_dir).expect("reloads config");
    assert_eq!(loaded, config);
}

#[test]
fn load_rejects_invalid_values() {
    let temp_dir = TempDir::new().expect("should create TempDir successfully");
    fs::write(
        temp_dir.path().join("config.toml"),
        "[server]\nname = \"\"\n",
    )
    .expect("writes config");

    assert!(Config::load_from(temp_dir.path()).is_err());
}

#[test]
fn save_refuses_invalid_config() {
    let temp_dir = TempDir::new().expect("should create TempDir successfully");

    let mut config = Config::with_base_dir(temp_dir.path());
    config.logging.filter = "=garbage=".to_string();

    assert!(config.save().is_err());
    assert!(!config.config_file_path().exists());
}
