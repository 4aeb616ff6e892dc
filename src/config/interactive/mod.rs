#[cfg(test)]
mod tests;

use anyhow::{Context, Result};
use console::style;
use dialoguer::{Confirm, Input, Select};

use super::{Config, ConfigError, LoggingConfig, ServerConfig};

const LOG_LEVELS: &[&str] = &["error", "warn", "info", "debug", "trace"];
const CUSTOM_FILTER: &str = "custom directive";

#[inline]
pub fn run_interactive_config() -> Result<()> {
    eprintln!("{}", style("🔧 Demo MCP Configuration Setup").bold().cyan());
    eprintln!();

    let mut config = load_existing_config()?;

    eprintln!("{}", style("Server Configuration").bold().yellow());
    eprintln!("Name and instructions reported to MCP clients during initialize.");
    eprintln!();

    configure_server(&mut config.server)?;

    eprintln!();
    eprintln!("{}", style("Logging Configuration").bold().yellow());
    eprintln!("Logs are written to stderr. RUST_LOG overrides this setting.");
    eprintln!();

    configure_logging(&mut config.logging)?;

    eprintln!();
    if Confirm::new()
        .with_prompt("Save configuration?")
        .default(true)
        .interact()?
    {
        config.save().context("Failed to save configuration")?;
        eprintln!("{}", style("✓ Configuration saved successfully!").green());
        eprintln!(
            "Configuration saved to: {}",
            style(config.config_file_path().display()).cyan()
        );
    } else {
        eprintln!("Configuration not saved.");
    }

    Ok(())
}

#[inline]
pub fn show_config() -> Result<()> {
    let config = Config::load().context("Failed to load configuration")?;

    eprintln!("{}", style("📋 Current Configuration").bold().cyan());
    eprintln!();

    eprintln!("{}", style("Server Settings:").bold().yellow());
    eprintln!("  Name: {}", style(&config.server.name).cyan());
    match &config.server.instructions {
        Some(instructions) => eprintln!("  Instructions: {}", style(instructions).cyan()),
        None => eprintln!("  Instructions: {}", style("(none)").dim()),
    }

    eprintln!();
    eprintln!("{}", style("Logging Settings:").bold().yellow());
    eprintln!("  Filter: {}", style(&config.logging.filter).cyan());
    if std::env::var_os("RUST_LOG").is_some() {
        eprintln!(
            "  {}",
            style("RUST_LOG is set and takes precedence").yellow()
        );
    }

    eprintln!();
    eprintln!(
        "Config file: {}",
        style(config.config_file_path().display()).dim()
    );

    Ok(())
}

fn load_existing_config() -> Result<Config> {
    Config::load().map_or_else(
        |_| {
            eprintln!(
                "{}",
                style("No existing configuration found. Using defaults.").yellow()
            );
            Ok(Config::with_base_dir(Config::config_dir()?))
        },
        |config| {
            eprintln!("{}", style("Found existing configuration.").green());
            Ok(config)
        },
    )
}

fn configure_server(server: &mut ServerConfig) -> Result<()> {
    let name: String = Input::new()
        .with_prompt("Server name")
        .default(server.name.clone())
        .validate_with(|input: &String| -> Result<(), ConfigError> {
            let candidate = ServerConfig {
                name: input.clone(),
                instructions: None,
            };
            candidate.validate()
        })
        .interact_text()?;

    let instructions: String = Input::new()
        .with_prompt("Instructions for clients (blank for none)")
        .default(server.instructions.clone().unwrap_or_default())
        .allow_empty(true)
        .interact_text()?;

    server.set_name(name)?;
    server.set_instructions(&instructions);

    Ok(())
}

fn configure_logging(logging: &mut LoggingConfig) -> Result<()> {
    let mut choices: Vec<&str> = LOG_LEVELS.to_vec();
    choices.push(CUSTOM_FILTER);

    let default_index = choices
        .iter()
        .position(|&level| level == logging.filter)
        .unwrap_or(LOG_LEVELS.len());

    let choice = Select::new()
        .with_prompt("Log level")
        .default(default_index)
        .items(&choices)
        .interact()?;

    let filter = match LOG_LEVELS.get(choice) {
        Some(level) => (*level).to_string(),
        None => Input::new()
            .with_prompt("Filter directive (e.g. demo_mcp=debug,warn)")
            .default(logging.filter.clone())
            .validate_with(|input: &String| -> Result<(), ConfigError> {
                LoggingConfig {
                    filter: input.clone(),
                }
                .validate()
            })
            .interact_text()?,
    };

    logging.set_filter(filter)?;

    Ok(())
}
