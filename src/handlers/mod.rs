//! The demo operations: integer addition and greeting formatting.
//!
//! Both functions are pure. [`register_demo_handlers`] exposes them through any
//! [`Registrar`], which is how the server binary wires them up.


use crate::mcp::Registrar;
use crate::mcp::resources::GreetingHandler;
use crate::mcp::tools::AddHandler;
use anyhow::{Context, Result};
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HandlerError {
    #[error("integer overflow adding {a} and {b}")]
    Overflow { a: i64, b: i64 },
}

/// Add two integers.
///
/// Operates on `i64` and reports overflow as an error instead of wrapping.
#[inline]
pub fn add(a: i64, b: i64) -> Result<i64, HandlerError> {
    a.checked_add(b).ok_or(HandlerError::Overflow { a, b })
}

#[inline]
pub fn get_greeting(name: &str) -> String {
    format!("Hello {}", name)
}

/// Register the `add` tool and the `greeting://{name}` resource template
#[inline]
pub async fn register_demo_handlers<R>(registrar: &R) -> Result<()>
where
    R: Registrar + ?Sized,
{
    registrar
        .register_tool(AddHandler::tool_definition(), Arc::new(AddHandler))
        .await
        .context("Failed to register add tool")?;

    registrar
        .register_resource_template(GreetingHandler::template_definition(), Arc::new(GreetingHandler))
        .await
        .context("Failed to register greeting resource template")?;

    debug!("Registered demo handlers");
    Ok(())
}
