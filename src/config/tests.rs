use super::settings::CONFIG_DIR_ENV;
use super::*;
use serial_test::serial;
use std::fs;
use tempfile::TempDir;

#[cfg(test)]
mod integration_tests {
    use super::*;

    #[test]
    fn config_file_persistence() {
        let temp_dir = TempDir::new().expect("should create TempDir successfully");
        let config_path = temp_dir.path().join("config.toml");

        let original_config = Config {
            server: ServerConfig {
                name: "Calculator".to_string(),
                instructions: Some("Call add with two integers".to_string()),
            },
            logging: LoggingConfig {
                filter: "demo_mcp=debug".to_string(),
            },
            base_dir: temp_dir.path().to_path_buf(),
        };

        original_config.save().expect("should save config successfully");

        let content =
            fs::read_to_string(&config_path).expect("should read from config_path successfully");
        assert!(content.contains("[server]"));
        assert!(content.contains("[logging]"));
        assert!(!content.contains("base_dir"));

        let loaded_config =
            Config::load_from(temp_dir.path()).expect("should load config successfully");
        assert_eq!(original_config, loaded_config);
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let temp_dir = TempDir::new().expect("should create TempDir successfully");
        fs::write(
            temp_dir.path().join("config.toml"),
            "[server]\nname = \"Calculator\"\n",
        )
        .expect("should write config successfully");

        let config = Config::load_from(temp_dir.path()).expect("should load config successfully");
        assert_eq!(config.server.name, "Calculator");
        assert_eq!(config.server.instructions, None);
        assert_eq!(config.logging, LoggingConfig::default());
    }

    #[test]
    fn invalid_toml_handling() {
        let invalid_toml = r#"
            [server
            name = "Demo"
        "#;

        let result: Result<Config, toml::de::Error> = toml::from_str(invalid_toml);
        assert!(result.is_err());

        let temp_dir = TempDir::new().expect("should create TempDir successfully");
        fs::write(temp_dir.path().join("config.toml"), invalid_toml)
            .expect("should write config successfully");
        assert!(Config::load_from(temp_dir.path()).is_err());
    }

    #[test]
    #[serial]
    fn config_dir_honors_environment_override() {
        let temp_dir = TempDir::new().expect("should create TempDir successfully");

        // SAFETY: tests touching the environment run under #[serial]
        unsafe { std::env::set_var(CONFIG_DIR_ENV, temp_dir.path()) };
        let dir = Config::config_dir();
        // SAFETY: as above
        unsafe { std::env::remove_var(CONFIG_DIR_ENV) };

        assert_eq!(dir.expect("resolves config dir"), temp_dir.path());
    }

    #[test]
    #[serial]
    fn config_dir_defaults_under_home() {
        // SAFETY: tests touching the environment run under #[serial]
        unsafe { std::env::remove_var(CONFIG_DIR_ENV) };

        if let Some(home) = dirs::home_dir() {
            let dir = Config::config_dir().expect("resolves config dir");
            assert_eq!(dir, home.join(".demo-mcp"));
        }
    }
}
