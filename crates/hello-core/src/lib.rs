//! Hello Core - Greeting logic for the hello MCP server
//!
//! This crate holds the domain side of the demo: the greeting function and
//! the argument type the `hello` tool accepts. It knows nothing about MCP.

pub mod error;
pub mod greeting;

pub use error::{Error, Result};
pub use greeting::{hello, HelloArgs, DEFAULT_NAME};
