//! The `greeting://{name}` resource template.

use crate::handlers;
use crate::mcp::errors::McpError;
use crate::mcp::protocol::ResourceTemplate;
use crate::mcp::registry::ResourceHandler;
use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use tracing::debug;

#[derive(Debug, Clone, Copy, Default)]
pub struct GreetingHandler;

impl GreetingHandler {
    pub const URI_TEMPLATE: &'static str = "greeting://{name}";

    #[inline]
    pub fn template_definition() -> ResourceTemplate {
        ResourceTemplate {
            uri_template: Self::URI_TEMPLATE.to_string(),
            name: "get_greeting".to_string(),
            description: Some("Greet the name given in the URI".to_string()),
            mime_type: Some("text/plain".to_string()),
        }
    }
}

#[async_trait]
impl ResourceHandler for GreetingHandler {
    #[inline]
    async fn handle(&self, uri: &str, params: &HashMap<String, String>) -> Result<String> {
        let name = params.get("name").ok_or_else(|| McpError::InvalidParameters {
            message: format!("Missing template parameter 'name' for {}", uri),
        })?;

        debug!("Greeting {}", name);
        Ok(handlers::get_greeting(name))
    }
}
