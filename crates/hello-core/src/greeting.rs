//! Greeting function behind the `hello` tool

use serde::Deserialize;

use crate::error::{Error, Result};

/// Name used when the caller does not supply one
pub const DEFAULT_NAME: &str = "stranger";

/// Build the greeting for `name`.
///
/// An absent name falls back to [`DEFAULT_NAME`]. An empty string counts as
/// a provided name, so `hello(Some(""))` is `"Hello, !"`.
pub fn hello(name: Option<&str>) -> String {
    let name = name.unwrap_or(DEFAULT_NAME);
    format!("Hello, {}!", name)
}

/// Arguments accepted by the `hello` tool
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct HelloArgs {
    #[serde(default)]
    pub name: Option<String>,
}

impl HelloArgs {
    /// Parse tool arguments. `null` is treated like an empty object.
    pub fn from_value(value: serde_json::Value) -> Result<Self> {
        if value.is_null() {
            return Ok(Self::default());
        }
        serde_json::from_value(value).map_err(|e| Error::InvalidArguments(e.to_string()))
    }

    pub fn greet(&self) -> String {
        hello(self.name.as_deref())
    }
}
