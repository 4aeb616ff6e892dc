//! MCP Server Implementation
//!
//! Line-delimited JSON-RPC 2.0 server: connection handling, message routing,
//! and dispatch to registered tool and resource handlers.

use crate::mcp::errors::{ErrorHandler, McpError};
use crate::mcp::protocol::*;
use crate::mcp::registry::{Registrar, ResourceHandler, ToolHandler};
use crate::mcp::template::UriTemplate;
use crate::mcp::validation::{McpValidator, compile_schema, validate_tool_arguments};
use anyhow::{Context, Result};
use async_trait::async_trait;
use jsonschema::JSONSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Instant;
use tokio::io::{self, AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};

struct RegisteredTool {
    tool: Tool,
    schema: Arc<JSONSchema>,
    handler: Arc<dyn ToolHandler>,
}

struct RegisteredResource {
    resource: Resource,
    handler: Arc<dyn ResourceHandler>,
}

struct RegisteredTemplate {
    template: ResourceTemplate,
    matcher: UriTemplate,
    handler: Arc<dyn ResourceHandler>,
}

/// MCP Server state and configuration
pub struct McpServer {
    /// Server implementation information
    pub server_info: Implementation,
    /// Server capabilities
    pub capabilities: ServerCapabilities,
    /// Instructions returned to clients on initialize
    pub instructions: Option<String>,
    tools: Arc<RwLock<BTreeMap<String, RegisteredTool>>>,
    resources: Arc<RwLock<BTreeMap<String, RegisteredResource>>>,
    /// Tried in registration order when reading a resource
    resource_templates: Arc<RwLock<Vec<RegisteredTemplate>>>,
    connection_state: Arc<RwLock<ConnectionState>>,
    validator: Arc<McpValidator>,
    started_at: Instant,
}

/// Connection state tracking
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConnectionState {
    Uninitialized,
    Initializing,
    Ready,
    Closed,
}

/// Message handler for processing incoming messages
pub struct MessageHandler {
    server: Arc<McpServer>,
}

impl McpServer {
    /// Create a new MCP server
    #[inline]
    pub fn new(name: String, version: String) -> Result<Self> {
        let server_info = Implementation { name, version };

        let capabilities = ServerCapabilities {
            logging: Some(LoggingCapability {}),
            resources: Some(ResourcesCapability {
                subscribe: Some(false),
                list_changed: Some(false),
            }),
            tools: Some(ToolsCapability {
                list_changed: Some(false),
            }),
        };

        let validator = McpValidator::new()?;

        Ok(Self {
            server_info,
            capabilities,
            instructions: None,
            tools: Arc::new(RwLock::new(BTreeMap::new())),
            resources: Arc::new(RwLock::new(BTreeMap::new())),
            resource_templates: Arc::new(RwLock::new(Vec::new())),
            connection_state: Arc::new(RwLock::new(ConnectionState::Uninitialized)),
            validator: Arc::new(validator),
            started_at: Instant::now(),
        })
    }

    #[inline]
    #[must_use]
    pub fn with_instructions(mut self, instructions: impl Into<String>) -> Self {
        self.instructions = Some(instructions.into());
        self
    }

    /// Register a tool with the server
    #[inline]
    pub async fn register_tool<H>(&self, tool: Tool, handler: H) -> Result<()>
    where
        H: ToolHandler + 'static,
    {
        self.insert_tool(tool, Arc::new(handler)).await
    }

    /// Register a static resource with the server
    #[inline]
    pub async fn register_resource<H>(&self, resource: Resource, handler: H) -> Result<()>
    where
        H: ResourceHandler + 'static,
    {
        let resource_uri = resource.uri.clone();
        let entry = RegisteredResource {
            resource,
            handler: Arc::new(handler),
        };

        let previous = self
            .resources
            .write()
            .await
            .insert(resource_uri.clone(), entry);

        if previous.is_some() {
            warn!("Replaced existing resource: {}", resource_uri);
        } else {
            debug!("Registered resource: {}", resource_uri);
        }
        Ok(())
    }

    /// Register a parameterised resource with the server
    #[inline]
    pub async fn register_resource_template<H>(
        &self,
        template: ResourceTemplate,
        handler: H,
    ) -> Result<()>
    where
        H: ResourceHandler + 'static,
    {
        self.insert_resource_template(template, Arc::new(handler))
            .await
    }

    async fn insert_tool(&self, tool: Tool, handler: Arc<dyn ToolHandler>) -> Result<()> {
        let schema = compile_schema(&tool.input_schema)
            .with_context(|| format!("Invalid input schema for tool '{}'", tool.name))?;

        let tool_name = tool.name.clone();
        let entry = RegisteredTool {
            tool,
            schema: Arc::new(schema),
            handler,
        };

        let previous = self.tools.write().await.insert(tool_name.clone(), entry);

        if previous.is_some() {
            warn!("Replaced existing tool: {}", tool_name);
        } else {
            debug!("Registered tool: {}", tool_name);
        }
        Ok(())
    }

    async fn insert_resource_template(
        &self,
        template: ResourceTemplate,
        handler: Arc<dyn ResourceHandler>,
    ) -> Result<()> {
        let matcher = UriTemplate::parse(&template.uri_template)?;
        let entry = RegisteredTemplate {
            template,
            matcher,
            handler,
        };

        let mut templates = self.resource_templates.write().await;
        let uri_template = entry.template.uri_template.clone();

        if let Some(existing) = templates
            .iter_mut()
            .find(|t| t.template.uri_template == uri_template)
        {
            *existing = entry;
            warn!("Replaced existing resource template: {}", uri_template);
        } else {
            templates.push(entry);
            debug!("Registered resource template: {}", uri_template);
        }
        Ok(())
    }

    /// Start the server using stdio transport
    #[inline]
    pub async fn serve_stdio(self: Arc<Self>) -> Result<()> {
        info!("Starting MCP server with stdio transport");
        self.serve(io::stdin(), io::stdout()).await
    }

    /// Serve line-delimited JSON-RPC messages until the reader reaches EOF
    #[inline]
    pub async fn serve<R, W>(self: Arc<Self>, reader: R, mut writer: W) -> Result<()>
    where
        R: AsyncRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut reader = BufReader::new(reader);

        let mut line = String::new();
        loop {
            line.clear();
            match reader.read_line(&mut line).await {
                Ok(0) => {
                    info!("EOF reached, closing connection");
                    break;
                }
                Ok(_) => {
                    let line = line.trim();
                    if line.is_empty() {
                        continue;
                    }

                    if let Some(reply) = Arc::clone(&self).process_line(line).await {
                        self.send_message(&mut writer, &reply).await?;
                    }
                }
                Err(e) => {
                    error!("Error reading from input: {}", e);
                    break;
                }
            }
        }

        *self.connection_state.write().await = ConnectionState::Closed;

        info!("MCP server stopped");
        Ok(())
    }

    /// Decode, validate and dispatch one line of input
    async fn process_line(self: Arc<Self>, line: &str) -> Option<JsonRpcMessage> {
        let raw_value: Value = match serde_json::from_str(line) {
            Ok(value) => value,
            Err(e) => {
                let error = McpError::ParseError {
                    message: format!("Parse error: {}", e),
                };
                error.log();
                return Some(error.to_error_response(None));
            }
        };

        match self.validator.validate_raw_message(&raw_value) {
            Ok(message) => {
                let handler = MessageHandler::new(Arc::clone(&self));
                handler.process_message(message).await
            }
            Err(e) => {
                let id = raw_value
                    .get("id")
                    .and_then(|id| serde_json::from_value::<RequestId>(id.clone()).ok());

                if e.downcast_ref::<McpError>().is_some() {
                    return Some(ErrorHandler::handle_error(&e, id));
                }

                let error = McpError::InvalidRequest {
                    message: format!("Invalid Request: {}", e),
                };
                error.log();
                Some(error.to_error_response(id))
            }
        }
    }

    /// Send a message to the client
    async fn send_message<W>(&self, writer: &mut W, message: &JsonRpcMessage) -> Result<()>
    where
        W: AsyncWrite + Unpin,
    {
        let json = serde_json::to_string(message)?;
        writer.write_all(json.as_bytes()).await?;
        writer.write_all(b"\n").await?;
        writer.flush().await?;
        Ok(())
    }

    /// Get current connection state
    #[inline]
    pub async fn connection_state(&self) -> ConnectionState {
        *self.connection_state.read().await
    }

    /// Snapshot of registration counts and uptime
    #[inline]
    pub async fn health_status(&self) -> ServerHealthStatus {
        ServerHealthStatus {
            connection_state: self.connection_state().await,
            tools_registered: self.tools.read().await.len(),
            resources_registered: self.resources.read().await.len(),
            resource_templates_registered: self.resource_templates.read().await.len(),
            uptime: self.started_at.elapsed(),
        }
    }

    /// Server identity plus the names of everything registered, sorted
    #[inline]
    pub async fn server_statistics(&self) -> ServerStatistics {
        let registered_tools = self.tools.read().await.keys().cloned().collect();
        let registered_resources = self.resources.read().await.keys().cloned().collect();
        let mut registered_resource_templates: Vec<String> = self
            .resource_templates
            .read()
            .await
            .iter()
            .map(|t| t.template.uri_template.clone())
            .collect();
        registered_resource_templates.sort();

        ServerStatistics {
            server_info: self.server_info.clone(),
            capabilities: self.capabilities.clone(),
            connection_state: self.connection_state().await,
            registered_tools,
            registered_resources,
            registered_resource_templates,
        }
    }
}

#[async_trait]
impl Registrar for McpServer {
    async fn register_tool(&self, tool: Tool, handler: Arc<dyn ToolHandler>) -> Result<()> {
        self.insert_tool(tool, handler).await
    }

    async fn register_resource_template(
        &self,
        template: ResourceTemplate,
        handler: Arc<dyn ResourceHandler>,
    ) -> Result<()> {
        self.insert_resource_template(template, handler).await
    }
}

impl Clone for McpServer {
    #[inline]
    fn clone(&self) -> Self {
        Self {
            server_info: self.server_info.clone(),
            capabilities: self.capabilities.clone(),
            instructions: self.instructions.clone(),
            tools: Arc::clone(&self.tools),
            resources: Arc::clone(&self.resources),
            resource_templates: Arc::clone(&self.resource_templates),
            connection_state: Arc::clone(&self.connection_state),
            validator: Arc::clone(&self.validator),
            started_at: self.started_at,
        }
    }
}

impl MessageHandler {
    /// Create a new message handler
    #[inline]
    pub fn new(server: Arc<McpServer>) -> Self {
        Self { server }
    }

    /// Process an incoming message, returning the reply if one is due
    #[inline]
    pub async fn process_message(&self, message: JsonRpcMessage) -> Option<JsonRpcMessage> {
        match message {
            JsonRpcMessage::Request(request) => Some(self.handle_request(request).await),
            JsonRpcMessage::Notification(notification) => {
                self.handle_notification(notification).await;
                None
            }
            JsonRpcMessage::Response(_) | JsonRpcMessage::ErrorResponse(_) => {
                warn!("Received unexpected response message from client");
                None
            }
        }
    }

    /// Handle a JSON-RPC request
    async fn handle_request(&self, request: JsonRpcRequest) -> JsonRpcMessage {
        let JsonRpcRequest {
            method, params, id, ..
        } = request;
        debug!("Handling request {:?}: {}", id, method);

        match self.dispatch(&method, params).await {
            Ok(result) => JsonRpcMessage::Response(JsonRpcResponse::new(result, id)),
            Err(e) => ErrorHandler::handle_error(&e, Some(id)),
        }
    }

    async fn dispatch(&self, method: &str, params: Option<Value>) -> Result<Value> {
        if !matches!(method, "initialize" | "ping")
            && self.server.connection_state().await == ConnectionState::Uninitialized
        {
            return Err(McpError::ServerNotInitialized.into());
        }

        match method {
            "initialize" => self.handle_initialize(params).await,
            "ping" => Ok(Self::handle_ping()),
            "tools/list" => self.handle_list_tools().await,
            "tools/call" => self.handle_call_tool(params).await,
            "resources/list" => self.handle_list_resources().await,
            "resources/templates/list" => self.handle_list_resource_templates().await,
            "resources/read" => self.handle_read_resource(params).await,
            _ => Err(McpError::MethodNotFound {
                method: method.to_string(),
            }
            .into()),
        }
    }

    /// Handle a JSON-RPC notification
    async fn handle_notification(&self, notification: JsonRpcNotification) {
        match notification.method.as_str() {
            "notifications/initialized" | "initialized" => self.handle_initialized().await,
            "notifications/cancelled" => {
                debug!("Received cancellation notification");
            }
            _ => {
                warn!("Unknown notification method: {}", notification.method);
            }
        }
    }

    /// Handle initialize request
    #[inline]
    pub async fn handle_initialize(&self, params: Option<Value>) -> Result<Value> {
        let params: InitializeParams = match params {
            Some(p) => serde_json::from_value(p)?,
            None => {
                return Err(McpError::InvalidParameters {
                    message: "Initialize request missing parameters".to_string(),
                }
                .into());
            }
        };

        let protocol_version = self
            .server
            .validator
            .negotiate_protocol_version(&params.protocol_version);
        if protocol_version != params.protocol_version {
            warn!(
                "Client requested unsupported protocol version {}, offering {}",
                params.protocol_version, protocol_version
            );
        }

        *self.server.connection_state.write().await = ConnectionState::Initializing;

        let result = InitializeResult {
            protocol_version: protocol_version.to_string(),
            capabilities: self.server.capabilities.clone(),
            server_info: self.server.server_info.clone(),
            instructions: self.server.instructions.clone(),
        };

        info!(
            "Client initialized: {} {}",
            params.client_info.name, params.client_info.version
        );
        Ok(serde_json::to_value(result)?)
    }

    async fn handle_initialized(&self) {
        *self.server.connection_state.write().await = ConnectionState::Ready;
        info!("Server ready to handle requests");
    }

    /// Handle list tools request
    #[inline]
    pub async fn handle_list_tools(&self) -> Result<Value> {
        let tools = self.server.tools.read().await;
        let tools_vec: Vec<Tool> = tools.values().map(|t| t.tool.clone()).collect();

        let result = ListToolsResult { tools: tools_vec };
        Ok(serde_json::to_value(result)?)
    }

    /// Handle call tool request
    #[inline]
    pub async fn handle_call_tool(&self, params: Option<Value>) -> Result<Value> {
        let params: CallToolParams = match params {
            Some(p) => serde_json::from_value(p)?,
            None => {
                return Err(McpError::InvalidParameters {
                    message: "Tool call request missing parameters".to_string(),
                }
                .into());
            }
        };

        let (schema, handler) = {
            let tools = self.server.tools.read().await;
            let entry = tools
                .get(&params.name)
                .ok_or_else(|| McpError::ToolNotFound {
                    name: params.name.clone(),
                })?;
            (Arc::clone(&entry.schema), Arc::clone(&entry.handler))
        };

        let arguments = Value::Object(
            params
                .arguments
                .clone()
                .unwrap_or_default()
                .into_iter()
                .collect(),
        );
        validate_tool_arguments(&params.name, &schema, &arguments)?;

        debug!("Calling tool {} with {}", params.name, arguments);
        let result = handler.handle(params).await?;
        Ok(serde_json::to_value(result)?)
    }

    /// Handle list resources request
    #[inline]
    pub async fn handle_list_resources(&self) -> Result<Value> {
        let resources = self.server.resources.read().await;
        let resources_vec: Vec<Resource> =
            resources.values().map(|r| r.resource.clone()).collect();

        let result = ListResourcesResult {
            resources: resources_vec,
        };
        Ok(serde_json::to_value(result)?)
    }

    /// Handle list resource templates request
    #[inline]
    pub async fn handle_list_resource_templates(&self) -> Result<Value> {
        let templates = self.server.resource_templates.read().await;
        let templates_vec: Vec<ResourceTemplate> =
            templates.iter().map(|t| t.template.clone()).collect();

        let result = ListResourceTemplatesResult {
            resource_templates: templates_vec,
        };
        Ok(serde_json::to_value(result)?)
    }

    /// Handle read resource request
    #[inline]
    pub async fn handle_read_resource(&self, params: Option<Value>) -> Result<Value> {
        let params: ReadResourceParams = match params {
            Some(p) => serde_json::from_value(p)?,
            None => {
                return Err(McpError::InvalidParameters {
                    message: "Resource read request missing parameters".to_string(),
                }
                .into());
            }
        };
        let uri = params.uri;

        let (handler, values, mime_type) = self
            .resolve_resource(&uri)
            .await
            .ok_or_else(|| McpError::ResourceNotFound { uri: uri.clone() })?;

        debug!("Reading resource {}", uri);
        let text = handler
            .handle(&uri, &values)
            .await
            .map_err(|e| match e.downcast::<McpError>() {
                Ok(mcp_error) => mcp_error,
                Err(other) => McpError::ResourceAccessFailed {
                    uri: uri.clone(),
                    message: other.to_string(),
                },
            })?;

        let result = ReadResourceResult {
            contents: vec![ResourceContents {
                uri,
                mime_type,
                text,
            }],
        };
        Ok(serde_json::to_value(result)?)
    }

    /// Static resources win over templates; templates are tried in order
    async fn resolve_resource(
        &self,
        uri: &str,
    ) -> Option<(Arc<dyn ResourceHandler>, HashMap<String, String>, Option<String>)> {
        {
            let resources = self.server.resources.read().await;
            if let Some(entry) = resources.get(uri) {
                return Some((
                    Arc::clone(&entry.handler),
                    HashMap::new(),
                    entry.resource.mime_type.clone(),
                ));
            }
        }

        let templates = self.server.resource_templates.read().await;
        templates.iter().find_map(|entry| {
            entry.matcher.matches(uri).map(|values| {
                (
                    Arc::clone(&entry.handler),
                    values,
                    entry.template.mime_type.clone(),
                )
            })
        })
    }

    /// Handle ping request
    #[inline]
    pub fn handle_ping() -> Value {
        serde_json::json!({})
    }
}
