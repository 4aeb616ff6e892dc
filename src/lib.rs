use thiserror::Error;

pub type Result<T> = std::result::Result<T, DemoError>;

#[derive(Error, Debug)]
pub enum DemoError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("MCP error: {0}")]
    Mcp(#[from] mcp::McpError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Other error: {0}")]
    Other(#[from] anyhow::Error),
}

pub mod commands;
pub mod config;
pub mod handlers;
pub mod mcp;
