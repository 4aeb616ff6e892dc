//! TOML configuration for the server name, client instructions and log filter.

pub mod interactive;
pub mod settings;

#[cfg(test)]
mod tests;

pub use interactive::{run_interactive_config, show_config};
pub use settings::{Config, ConfigError, LoggingConfig, ServerConfig};
