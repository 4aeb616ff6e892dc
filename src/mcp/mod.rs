//! MCP (Model Context Protocol) Server Implementation
//!
//! A line-delimited JSON-RPC 2.0 server with tool and resource-template
//! registration, plus the handlers this crate exposes through it.


pub mod errors;
pub mod protocol;
pub mod registry;
pub mod resources;
pub mod server;
pub mod template;
pub mod tools;
pub mod validation;

pub use errors::{ErrorHandler, McpError, McpResult};
pub use protocol::*;
pub use registry::{Registrar, ResourceHandler, ToolHandler};
pub use server::{ConnectionState, McpServer, MessageHandler};
pub use template::UriTemplate;
