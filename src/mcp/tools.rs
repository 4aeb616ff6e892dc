//! MCP Tools Implementation
//!
//! The `add` tool: definition and handler.

use crate::handlers;
use crate::mcp::errors::McpError;
use crate::mcp::protocol::*;
use crate::mcp::registry::ToolHandler;
use anyhow::Result;
use async_trait::async_trait;
use serde_json::{Value, json};
use std::collections::HashMap;
use tracing::{debug, warn};

/// Integer addition tool handler
#[derive(Debug, Clone, Copy, Default)]
pub struct AddHandler;

impl AddHandler {
    pub const NAME: &'static str = "add";

    /// Create the add tool definition
    #[inline]
    pub fn tool_definition() -> Tool {
        Tool {
            name: Self::NAME.to_string(),
            title: Some("Add".to_string()),
            description: Some("Add two integers and return their sum".to_string()),
            input_schema: json!({
                "type": "object",
                "title": "addArguments",
                "properties": {
                    "a": {
                        "type": "integer",
                        "title": "A"
                    },
                    "b": {
                        "type": "integer",
                        "title": "B"
                    }
                },
                "required": ["a", "b"],
                "additionalProperties": false
            }),
            output_schema: Some(json!({
                "type": "object",
                "title": "addOutput",
                "properties": {
                    "result": {
                        "type": "integer",
                        "title": "Result"
                    }
                },
                "required": ["result"]
            })),
        }
    }

    fn integer_argument(args: &HashMap<String, Value>, name: &str) -> Result<i64> {
        let value = args.get(name).ok_or_else(|| McpError::InvalidToolParameters {
            tool: Self::NAME.to_string(),
            message: format!("Missing required parameter: {}", name),
        })?;

        value.as_i64().or_else(|| integral_float(value)).ok_or_else(|| {
            McpError::InvalidToolParameters {
                tool: Self::NAME.to_string(),
                message: format!("Parameter '{}' must be a 64-bit integer, got {}", name, value),
            }
            .into()
        })
    }
}

/// JSON Schema counts `1.0` as an integer, so integral floats inside the
/// `i64` range are accepted as well
fn integral_float(value: &Value) -> Option<i64> {
    const LIMIT: f64 = 9_223_372_036_854_775_808.0; // 2^63

    let float = value.as_f64()?;
    (float.fract() == 0.0 && (-LIMIT..LIMIT).contains(&float)).then(|| float as i64)
}

#[async_trait]
impl ToolHandler for AddHandler {
    #[inline]
    async fn handle(&self, params: CallToolParams) -> Result<CallToolResult> {
        let args = params.arguments.unwrap_or_default();

        let a = Self::integer_argument(&args, "a")?;
        let b = Self::integer_argument(&args, "b")?;

        debug!("Adding {} and {}", a, b);

        match handlers::add(a, b) {
            Ok(sum) => Ok(CallToolResult::text(sum.to_string())
                .with_structured_content(json!({ "result": sum }))),
            Err(e) => {
                warn!("add failed: {}", e);
                Ok(CallToolResult::error(e.to_string()))
            }
        }
    }
}
