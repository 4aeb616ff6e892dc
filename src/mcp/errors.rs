//! MCP Error Handling
//!
//! Error classification for the MCP server and its conversion into JSON-RPC
//! error responses.

use crate::mcp::protocol::*;
use thiserror::Error;
use tracing::{error, warn};

/// MCP-specific errors that can occur during server operation
#[derive(Error, Debug)]
pub enum McpError {
    #[error("Tool not found: {name}")]
    ToolNotFound { name: String },

    #[error("Resource not found: {uri}")]
    ResourceNotFound { uri: String },

    #[error("Invalid tool parameters for {tool}: {message}")]
    InvalidToolParameters { tool: String, message: String },

    #[error("Resource access failed for {uri}: {message}")]
    ResourceAccessFailed { uri: String, message: String },

    #[error("Invalid resource template '{template}': {message}")]
    InvalidTemplate { template: String, message: String },

    #[error("Server not initialized")]
    ServerNotInitialized,

    #[error("Invalid request: {message}")]
    InvalidRequest { message: String },

    #[error("Internal server error: {message}")]
    InternalError { message: String },

    #[error("JSON-RPC parse error: {message}")]
    ParseError { message: String },

    #[error("Method not found: {method}")]
    MethodNotFound { method: String },

    #[error("Invalid parameters: {message}")]
    InvalidParameters { message: String },
}

impl McpError {
    /// Convert MCP error to JSON-RPC error
    #[inline]
    pub fn to_jsonrpc_error(&self) -> JsonRpcError {
        match self {
            Self::ToolNotFound { name } => JsonRpcError::new(
                mcp_error_codes::TOOL_NOT_FOUND,
                format!("Tool not found: {}", name),
                None,
            ),
            Self::ResourceNotFound { uri } => JsonRpcError::new(
                mcp_error_codes::RESOURCE_NOT_FOUND,
                format!("Resource not found: {}", uri),
                None,
            ),
            Self::InvalidToolParameters { tool, message } => JsonRpcError::new(
                error_codes::INVALID_PARAMS,
                format!("Invalid parameters for tool '{}': {}", tool, message),
                None,
            ),
            Self::ResourceAccessFailed { uri, message } => JsonRpcError::new(
                error_codes::INTERNAL_ERROR,
                format!("Resource '{}' access failed: {}", uri, message),
                None,
            ),
            Self::InvalidTemplate { .. } => {
                JsonRpcError::new(error_codes::INTERNAL_ERROR, self.to_string(), None)
            }
            Self::ServerNotInitialized => JsonRpcError::new(
                error_codes::INVALID_REQUEST,
                "Server not initialized. Send initialize request first.".to_string(),
                None,
            ),
            Self::InvalidRequest { message } => {
                JsonRpcError::new(error_codes::INVALID_REQUEST, message.clone(), None)
            }
            Self::InternalError { message } => {
                JsonRpcError::new(error_codes::INTERNAL_ERROR, message.clone(), None)
            }
            Self::ParseError { message } => {
                JsonRpcError::new(error_codes::PARSE_ERROR, message.clone(), None)
            }
            Self::MethodNotFound { method } => JsonRpcError::method_not_found(method),
            Self::InvalidParameters { message } => {
                JsonRpcError::new(error_codes::INVALID_PARAMS, message.clone(), None)
            }
        }
    }

    /// Create error response message
    #[inline]
    pub fn to_error_response(&self, id: Option<RequestId>) -> JsonRpcMessage {
        let error = self.to_jsonrpc_error();
        let error_response = JsonRpcErrorResponse::new(error, id);
        JsonRpcMessage::ErrorResponse(error_response)
    }

    /// Log the error with appropriate level
    #[inline]
    pub fn log(&self) {
        match self {
            Self::ParseError { .. }
            | Self::InvalidRequest { .. }
            | Self::InvalidParameters { .. }
            | Self::InvalidToolParameters { .. }
            | Self::MethodNotFound { .. }
            | Self::ServerNotInitialized => {
                warn!("Client error: {}", self);
            }
            Self::ToolNotFound { .. } | Self::ResourceNotFound { .. } => {
                warn!("Not found error: {}", self);
            }
            Self::ResourceAccessFailed { .. }
            | Self::InvalidTemplate { .. }
            | Self::InternalError { .. } => {
                error!("Server error: {}", self);
            }
        }
    }
}

/// Error handler utility for consistent error processing
pub struct ErrorHandler;

impl ErrorHandler {
    /// Handle any error and convert to appropriate JSON-RPC response
    #[inline]
    pub fn handle_error(error: &anyhow::Error, id: Option<RequestId>) -> JsonRpcMessage {
        if let Some(mcp_error) = error.downcast_ref::<McpError>() {
            mcp_error.log();
            return mcp_error.to_error_response(id);
        }

        if let Some(json_error) = error.downcast_ref::<serde_json::Error>() {
            let invalid = McpError::InvalidParameters {
                message: json_error.to_string(),
            };
            invalid.log();
            return invalid.to_error_response(id);
        }

        error!("Unexpected error: {:#}", error);
        let internal_error = McpError::InternalError {
            message: error.to_string(),
        };
        internal_error.to_error_response(id)
    }
}

/// Result type for MCP operations
pub type McpResult<T> = Result<T, McpError>;

/// Convert from anyhow::Error to McpError
impl From<anyhow::Error> for McpError {
    #[inline]
    fn from(error: anyhow::Error) -> Self {
        match error.downcast::<McpError>() {
            Ok(mcp_error) => mcp_error,
            Err(other) => Self::InternalError {
                message: other.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    #[test]
    fn tool_not_found_error() {
        let error = McpError::ToolNotFound {
            name: "test_tool".to_string(),
        };

        let jsonrpc_error = error.to_jsonrpc_error();
        assert_eq!(jsonrpc_error.code, mcp_error_codes::TOOL_NOT_FOUND);
        assert!(jsonrpc_error.message.contains("test_tool"));
    }

    #[test]
    fn parse_and_request_errors_use_jsonrpc_codes() {
        let parse = McpError::ParseError {
            message: "Parse error: expected value".to_string(),
        }
        .to_jsonrpc_error();
        assert_eq!(parse.code, error_codes::PARSE_ERROR);
        assert!(parse.message.starts_with("Parse error"));

        let invalid = McpError::InvalidRequest {
            message: "Invalid Request: id must be a string or an integer".to_string(),
        }
        .to_jsonrpc_error();
        assert_eq!(invalid.code, error_codes::INVALID_REQUEST);
    }

    #[test]
    fn resource_not_found_uses_mcp_code() {
        let error = McpError::ResourceNotFound {
            uri: "greeting://".to_string(),
        };

        let jsonrpc_error = error.to_jsonrpc_error();
        assert_eq!(jsonrpc_error.code, mcp_error_codes::RESOURCE_NOT_FOUND);
        assert!(jsonrpc_error.message.contains("greeting://"));
    }

    #[test]
    fn error_response_creation() {
        let error = McpError::InternalError {
            message: "test error".to_string(),
        };

        let response = error.to_error_response(Some(RequestId::String("test".to_string())));

        if let JsonRpcMessage::ErrorResponse(err_resp) = response {
            assert_eq!(err_resp.error.code, error_codes::INTERNAL_ERROR);
            assert!(err_resp.error.message.contains("test error"));
            assert_eq!(err_resp.id, Some(RequestId::String("test".to_string())));
        } else {
            panic!("Expected error response");
        }
    }

    #[test]
    fn handler_prefers_embedded_mcp_error() {
        let error = anyhow::Error::from(McpError::InvalidToolParameters {
            tool: "add".to_string(),
            message: "missing a".to_string(),
        });

        let response = ErrorHandler::handle_error(&error, Some(RequestId::Number(7)));

        if let JsonRpcMessage::ErrorResponse(err_resp) = response {
            assert_eq!(err_resp.error.code, error_codes::INVALID_PARAMS);
            assert!(err_resp.error.message.contains("add"));
        } else {
            panic!("Expected error response");
        }
    }

    #[test]
    fn handler_maps_unknown_errors_to_internal() {
        let error = anyhow!("disk on fire");

        let response = ErrorHandler::handle_error(&error, None);

        if let JsonRpcMessage::ErrorResponse(err_resp) = response {
            assert_eq!(err_resp.error.code, error_codes::INTERNAL_ERROR);
            assert_eq!(err_resp.error.message, "disk on fire");
            assert!(err_resp.id.is_none());
        } else {
            panic!("Expected error response");
        }
    }

    #[test]
    fn handler_maps_serde_errors_to_invalid_params() {
        let json_error = serde_json::from_str::<ReadResourceParams>("{}")
            .expect_err("uri is required");
        let error = anyhow::Error::from(json_error);

        let response = ErrorHandler::handle_error(&error, Some(RequestId::Number(1)));

        if let JsonRpcMessage::ErrorResponse(err_resp) = response {
            assert_eq!(err_resp.error.code, error_codes::INVALID_PARAMS);
        } else {
            panic!("Expected error response");
        }
    }

    #[test]
    fn anyhow_round_trip_keeps_variant() {
        let error = anyhow::Error::from(McpError::ServerNotInitialized);
        let mcp_error = McpError::from(error);
        assert!(matches!(mcp_error, McpError::ServerNotInitialized));
    }
}
