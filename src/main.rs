use clap::{Parser, Subcommand};
use demo_mcp::Result;
use demo_mcp::commands::{list_capabilities, serve_mcp};
use demo_mcp::config::{Config, run_interactive_config, show_config};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "demo-mcp")]
#[command(about = "A minimal MCP server exposing an add tool and a greeting resource")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Configure the server name, instructions and log filter
    Config {
        /// Show current configuration
        #[arg(long)]
        show: bool,
    },
    /// List the tools and resource templates the server exposes
    List,
    /// Start MCP server on stdio
    Serve,
}

/// `RUST_LOG` wins over the configured filter. Logs go to stderr so stdout
/// stays reserved for protocol traffic.
fn init_tracing(config: Option<&Config>) {
    let filter = EnvFilter::try_from_default_env()
        .ok()
        .or_else(|| config.and_then(|config| config.logging.env_filter().ok()))
        .unwrap_or_else(|| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = Config::load();
    init_tracing(config.as_ref().ok());

    match cli.command {
        Commands::Config { show } => {
            if show {
                show_config()?;
            } else {
                run_interactive_config()?;
            }
        }
        Commands::List => {
            list_capabilities(&config?).await?;
        }
        Commands::Serve => {
            serve_mcp(&config?).await?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::error::ErrorKind;

    #[test]
    fn cli_parsing() {
        let cli = Cli::try_parse_from(["demo-mcp", "list"]);
        assert!(cli.is_ok());

        if let Ok(parsed) = cli {
            assert!(matches!(parsed.command, Commands::List));
        }
    }

    #[test]
    fn serve_command() {
        let cli = Cli::try_parse_from(["demo-mcp", "serve"]);
        assert!(cli.is_ok());

        if let Ok(parsed) = cli {
            assert!(matches!(parsed.command, Commands::Serve));
        }
    }

    #[test]
    fn config_show_flag() {
        let cli = Cli::try_parse_from(["demo-mcp", "config", "--show"]);
        assert!(cli.is_ok());

        if let Ok(parsed) = cli {
            if let Commands::Config { show } = parsed.command {
                assert!(show);
            }
        }
    }

    #[test]
    fn config_defaults_to_interactive() {
        let cli = Cli::try_parse_from(["demo-mcp", "config"]);

        if let Ok(Cli {
            command: Commands::Config { show },
        }) = cli
        {
            assert!(!show);
        } else {
            panic!("config should parse");
        }
    }

    #[test]
    fn invalid_command() {
        let cli = Cli::try_parse_from(["demo-mcp", "invalid"]);
        assert!(cli.is_err());

        if let Err(err) = cli {
            assert_eq!(err.kind(), ErrorKind::InvalidSubcommand);
        }
    }

    #[test]
    fn help_message() {
        let cli = Cli::try_parse_from(["demo-mcp", "--help"]);
        assert!(cli.is_err());

        if let Err(err) = cli {
            assert_eq!(err.kind(), ErrorKind::DisplayHelp);
        }
    }
}
