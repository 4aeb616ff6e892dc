use anyhow::{Context, Result};
use console::style;
use std::sync::Arc;
use tracing::{error, info};

use crate::config::Config;
use crate::handlers::register_demo_handlers;
use crate::mcp::{ListResourceTemplatesResult, ListToolsResult, McpServer, MessageHandler};

/// Build a server named from `config` with the demo tool and resource
/// template registered.
#[inline]
pub async fn build_server(config: &Config) -> Result<Arc<McpServer>> {
    let mut server = McpServer::new(
        config.server.name.clone(),
        env!("CARGO_PKG_VERSION").to_string(),
    )
    .context("Failed to create MCP server")?;

    if let Some(instructions) = &config.server.instructions {
        server = server.with_instructions(instructions.clone());
    }

    register_demo_handlers(&server)
        .await
        .context("Failed to register demo handlers")?;

    Ok(Arc::new(server))
}

/// Serve MCP on stdio until the client disconnects or Ctrl-C is received
#[inline]
pub async fn serve_mcp(config: &Config) -> Result<()> {
    info!("Starting MCP server '{}' on stdio", config.server.name);

    let server = build_server(config).await?;
    let statistics = server.server_statistics().await;

    // stdout carries protocol traffic, so status goes to stderr
    eprintln!(
        "✅ MCP server initialized with tools: {}",
        statistics.registered_tools.join(", ")
    );
    eprintln!(
        "📚 Resource templates: {}",
        statistics.registered_resource_templates.join(", ")
    );
    eprintln!("Note: This server uses stdio transport. Connect via MCP client.");
    eprintln!("Press Ctrl+C to stop the server");

    tokio::select! {
        result = Arc::clone(&server).serve_stdio() => {
            match result {
                Ok(()) => info!("MCP server stopped normally"),
                Err(e) => {
                    error!("MCP server error: {}", e);
                    return Err(e).context("MCP server failed");
                }
            }
        }
        _ = tokio::signal::ctrl_c() => {
            eprintln!("\n📴 Received interrupt signal, shutting down...");
        }
    }

    eprintln!("✅ Shutdown complete");
    Ok(())
}

/// Print the tools and resource templates the server exposes
#[inline]
pub async fn list_capabilities(config: &Config) -> Result<()> {
    let server = build_server(config).await?;
    let handler = MessageHandler::new(server);

    let tools: ListToolsResult = serde_json::from_value(handler.handle_list_tools().await?)
        .context("Failed to decode tool listing")?;
    let templates: ListResourceTemplatesResult =
        serde_json::from_value(handler.handle_list_resource_templates().await?)
            .context("Failed to decode resource template listing")?;

    println!("{}", style(format!("📋 {}", config.server.name)).bold().cyan());
    println!();

    println!("{}", style("Tools:").bold().yellow());
    for tool in &tools.tools {
        println!(
            "  {} {}",
            style(&tool.name).cyan(),
            tool.description.as_deref().unwrap_or_default()
        );
    }

    println!();
    println!("{}", style("Resource templates:").bold().yellow());
    for template in &templates.resource_templates {
        println!(
            "  {} ({}) {}",
            style(&template.uri_template).cyan(),
            template.name,
            template.description.as_deref().unwrap_or_default()
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ServerConfig;

    #[tokio::test]
    async fn build_server_uses_configured_identity() {
        let config = Config {
            server: ServerConfig {
                name: "Calculator".to_string(),
                instructions: Some("Add things".to_string()),
            },
            ..Config::default()
        };

        let server = build_server(&config).await.expect("server builds");
        assert_eq!(server.server_info.name, "Calculator");
        assert_eq!(server.instructions.as_deref(), Some("Add things"));

        let statistics = server.server_statistics().await;
        assert_eq!(statistics.registered_tools, vec!["add".to_string()]);
        assert_eq!(
            statistics.registered_resource_templates,
            vec!["greeting://{name}".to_string()]
        );
    }

    #[tokio::test]
    async fn list_capabilities_succeeds_with_defaults() {
        list_capabilities(&Config::default())
            .await
            .expect("listing succeeds");
    }
}
