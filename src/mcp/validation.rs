//! MCP Message Validation
//!
//! JSON schema validation for inbound MCP protocol messages and for tool
//! arguments.

use crate::mcp::errors::McpError;
use crate::mcp::protocol::*;
use anyhow::{Result, anyhow};
use jsonschema::{Draft, JSONSchema};
use serde_json::{Value, json};
use std::collections::HashMap;
use tracing::debug;

/// JSON Schema validator for MCP messages
#[derive(Debug)]
pub struct McpValidator {
    schemas: HashMap<String, JSONSchema>,
}

impl McpValidator {
    /// Create a new MCP validator with built-in schemas
    #[inline]
    pub fn new() -> Result<Self> {
        let mut validator = Self {
            schemas: HashMap::new(),
        };

        validator.load_builtin_schemas()?;

        Ok(validator)
    }

    /// Load built-in JSON schemas for MCP message types
    fn load_builtin_schemas(&mut self) -> Result<()> {
        let id_schema = json!({
            "oneOf": [
                {"type": "string"},
                {"type": "integer"}
            ]
        });

        let request_schema = json!({
            "type": "object",
            "properties": {
                "jsonrpc": {
                    "type": "string",
                    "const": JSONRPC_VERSION
                },
                "method": {"type": "string"},
                "params": {"type": "object"},
                "id": id_schema
            },
            "required": ["jsonrpc", "method", "id"]
        });
        self.add_schema("jsonrpc_request", &request_schema)?;

        let response_schema = json!({
            "type": "object",
            "properties": {
                "jsonrpc": {
                    "type": "string",
                    "const": JSONRPC_VERSION
                },
                "result": {},
                "id": id_schema
            },
            "required": ["jsonrpc", "result", "id"]
        });
        self.add_schema("jsonrpc_response", &response_schema)?;

        let error_response_schema = json!({
            "type": "object",
            "properties": {
                "jsonrpc": {
                    "type": "string",
                    "const": JSONRPC_VERSION
                },
                "error": {
                    "type": "object",
                    "properties": {
                        "code": {"type": "integer"},
                        "message": {"type": "string"},
                        "data": {}
                    },
                    "required": ["code", "message"]
                },
                "id": {
                    "oneOf": [
                        {"type": "string"},
                        {"type": "integer"},
                        {"type": "null"}
                    ]
                }
            },
            "required": ["jsonrpc", "error", "id"]
        });
        self.add_schema("jsonrpc_error_response", &error_response_schema)?;

        let notification_schema = json!({
            "type": "object",
            "properties": {
                "jsonrpc": {
                    "type": "string",
                    "const": JSONRPC_VERSION
                },
                "method": {"type": "string"},
                "params": {"type": "object"}
            },
            "required": ["jsonrpc", "method"]
        });
        self.add_schema("jsonrpc_notification", &notification_schema)?;

        let initialize_schema = json!({
            "type": "object",
            "properties": {
                "protocolVersion": {"type": "string"},
                "capabilities": {"type": "object"},
                "clientInfo": {
                    "type": "object",
                    "properties": {
                        "name": {"type": "string"},
                        "version": {"type": "string"}
                    },
                    "required": ["name", "version"]
                }
            },
            "required": ["protocolVersion", "capabilities", "clientInfo"]
        });
        self.add_schema("initialize_params", &initialize_schema)?;

        let tool_call_schema = json!({
            "type": "object",
            "properties": {
                "name": {"type": "string"},
                "arguments": {"type": "object"}
            },
            "required": ["name"]
        });
        self.add_schema("call_tool_params", &tool_call_schema)?;

        let read_resource_schema = json!({
            "type": "object",
            "properties": {
                "uri": {"type": "string"}
            },
            "required": ["uri"]
        });
        self.add_schema("read_resource_params", &read_resource_schema)?;

        debug!("Loaded {} built-in JSON schemas", self.schemas.len());
        Ok(())
    }

    /// Add a JSON schema to the validator
    #[inline]
    pub fn add_schema(&mut self, name: &str, schema: &Value) -> Result<()> {
        let compiled = compile_schema(schema)
            .map_err(|e| anyhow!("Failed to compile schema '{}': {}", name, e))?;

        self.schemas.insert(name.to_string(), compiled);
        Ok(())
    }

    /// Validate a JSON-RPC request
    #[inline]
    pub fn validate_request(&self, request: &JsonRpcRequest) -> Result<()> {
        let request_value = serde_json::to_value(request)?;
        self.validate_with_schema("jsonrpc_request", &request_value)?;

        if let Some(params) = &request.params {
            self.validate_method_params(&request.method, params)?;
        }

        Ok(())
    }

    /// Validate a JSON-RPC response
    #[inline]
    pub fn validate_response(&self, response: &JsonRpcResponse) -> Result<()> {
        let response_value = serde_json::to_value(response)?;
        self.validate_with_schema("jsonrpc_response", &response_value)
    }

    /// Validate a JSON-RPC error response
    #[inline]
    pub fn validate_error_response(&self, error_response: &JsonRpcErrorResponse) -> Result<()> {
        let error_value = serde_json::to_value(error_response)?;
        self.validate_with_schema("jsonrpc_error_response", &error_value)
    }

    /// Validate a JSON-RPC notification
    #[inline]
    pub fn validate_notification(&self, notification: &JsonRpcNotification) -> Result<()> {
        let notification_value = serde_json::to_value(notification)?;
        self.validate_with_schema("jsonrpc_notification", &notification_value)
    }

    /// Validate method-specific parameters
    fn validate_method_params(&self, method: &str, params: &Value) -> Result<()> {
        let schema_name = match method {
            "initialize" => "initialize_params",
            "tools/call" => "call_tool_params",
            "resources/read" => "read_resource_params",
            _ => {
                debug!("No parameter validation schema for method: {}", method);
                return Ok(());
            }
        };

        self.validate_with_schema(schema_name, params)
            .map_err(|e| McpError::InvalidParameters {
                message: e.to_string(),
            })?;
        Ok(())
    }

    /// Validate a value against a named schema
    #[inline]
    pub fn validate_with_schema(&self, schema_name: &str, value: &Value) -> Result<()> {
        let schema = self
            .schemas
            .get(schema_name)
            .ok_or_else(|| anyhow!("Schema '{}' not found", schema_name))?;

        if let Err(errors) = schema.validate(value) {
            let error_messages: Vec<String> = errors
                .into_iter()
                .map(|e| format!("{}:{}", e.instance_path, e))
                .collect();

            return Err(anyhow!(
                "Schema validation failed for '{}': {}",
                schema_name,
                error_messages.join(", ")
            ));
        }

        Ok(())
    }

    /// Validate a raw JSON value as a JSON-RPC message
    #[inline]
    pub fn validate_raw_message(&self, value: &Value) -> Result<JsonRpcMessage> {
        if let Ok(request) = serde_json::from_value::<JsonRpcRequest>(value.clone()) {
            self.validate_request(&request)?;
            return Ok(JsonRpcMessage::Request(request));
        }

        if let Ok(response) = serde_json::from_value::<JsonRpcResponse>(value.clone()) {
            self.validate_response(&response)?;
            return Ok(JsonRpcMessage::Response(response));
        }

        if let Ok(error_response) = serde_json::from_value::<JsonRpcErrorResponse>(value.clone()) {
            self.validate_error_response(&error_response)?;
            return Ok(JsonRpcMessage::ErrorResponse(error_response));
        }

        // An id means a reply is owed, even when the id itself is unusable
        if value.get("id").is_some() {
            return Err(McpError::InvalidRequest {
                message: "Invalid Request: expected a request with a string or integer id"
                    .to_string(),
            }
            .into());
        }

        if let Ok(notification) = serde_json::from_value::<JsonRpcNotification>(value.clone()) {
            self.validate_notification(&notification)?;
            return Ok(JsonRpcMessage::Notification(notification));
        }

        Err(anyhow!(
            "Value does not match any known JSON-RPC message type"
        ))
    }

    /// Echo a supported version, otherwise offer the latest one and let the
    /// client decide whether to continue
    #[inline]
    pub fn negotiate_protocol_version(&self, requested: &str) -> &'static str {
        SUPPORTED_PROTOCOL_VERSIONS
            .iter()
            .find(|version| **version == requested)
            .copied()
            .unwrap_or(MCP_VERSION)
    }
}

/// Compile a tool input schema
#[inline]
pub fn compile_schema(schema: &Value) -> Result<JSONSchema> {
    JSONSchema::options()
        .with_draft(Draft::Draft7)
        .compile(schema)
        .map_err(|e| anyhow!("{}", e))
}

/// Check tool arguments against the tool's compiled input schema
#[inline]
pub fn validate_tool_arguments(tool: &str, schema: &JSONSchema, arguments: &Value) -> Result<()> {
    if let Err(mut errors) = schema.validate(arguments) {
        let message = errors
            .next()
            .map(|e| e.to_string())
            .unwrap_or_else(|| "arguments do not match input schema".to_string());

        return Err(McpError::InvalidToolParameters {
            tool: tool.to_string(),
            message,
        }
        .into());
    }

    Ok(())
}
