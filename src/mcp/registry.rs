//! Handler traits and the registration boundary between handlers and the
//! serving runtime.

use crate::mcp::protocol::{CallToolParams, CallToolResult, ResourceTemplate, Tool};
use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;

/// Tool handler trait for implementing tool execution
#[async_trait]
pub trait ToolHandler: Send + Sync {
    async fn handle(&self, params: CallToolParams) -> Result<CallToolResult>;
}

/// Resource handler trait for implementing resource reads.
///
/// `params` holds the values extracted from the URI template; it is empty for
/// static resources.
#[async_trait]
pub trait ResourceHandler: Send + Sync {
    async fn handle(&self, uri: &str, params: &HashMap<String, String>) -> Result<String>;
}

/// Something tools and resource templates can be registered with.
#[async_trait]
pub trait Registrar: Send + Sync {
    async fn register_tool(&self, tool: Tool, handler: Arc<dyn ToolHandler>) -> Result<()>;

    async fn register_resource_template(
        &self,
        template: ResourceTemplate,
        handler: Arc<dyn ResourceHandler>,
    ) -> Result<()>;
}
