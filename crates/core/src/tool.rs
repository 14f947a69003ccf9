//! Tool capabilities: the side-effecting functions a guard wraps.
//!
//! Host frameworks expose tools in one of three shapes, in order of
//! preference: a full [`Tool`] with a dedicated `execute` entry point, a
//! bare [`Runnable`] with a generic `run` entry point, or a plain
//! [`ToolFn`] closure.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::ToolError;
use crate::provider::ToolDefinition;

/// Keyword arguments of one tool invocation.
pub type ToolArgs = serde_json::Map<String, serde_json::Value>;

/// A directly invocable tool body.
pub type ToolFn = Arc<dyn Fn(ToolArgs) -> std::result::Result<serde_json::Value, ToolError> + Send + Sync>;

/// The result of a tool execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResult {
    /// The call ID this result is for
    pub call_id: String,

    /// Whether the tool executed successfully
    pub success: bool,

    /// The output content
    pub output: String,

    /// Optional structured data
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl ToolResult {
    /// Wrap an untyped return value, coercing it to its string form.
    ///
    /// JSON strings are used as-is; anything else is rendered as JSON text.
    pub fn from_value(value: serde_json::Value) -> Self {
        let output = match &value {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        Self {
            call_id: String::new(),
            success: true,
            output,
            data: Some(value),
        }
    }
}

/// The full tool capability with a dedicated run entry point.
#[async_trait]
pub trait Tool: Send + Sync {
    /// The unique name of this tool (e.g., "shell", "file_read").
    fn name(&self) -> &str;

    /// A description of what this tool does (sent to the LLM).
    fn description(&self) -> &str;

    /// JSON Schema describing this tool's parameters.
    fn parameters_schema(&self) -> serde_json::Value;

    /// Execute the tool with the given arguments.
    async fn execute(&self, arguments: serde_json::Value) -> std::result::Result<ToolResult, ToolError>;

    /// Convert this tool into a ToolDefinition for sending to the LLM.
    fn to_definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name().to_string(),
            description: self.description().to_string(),
            parameters: self.parameters_schema(),
        }
    }
}

/// A tool body exposing only a generic `run` entry point.
#[async_trait]
pub trait Runnable: Send + Sync {
    async fn run(&self, args: ToolArgs) -> std::result::Result<serde_json::Value, ToolError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A simple test tool for unit tests.
    struct EchoTool;

    #[async_trait]
    impl Tool for EchoTool {
        fn name(&self) -> &str { "echo" }
        fn description(&self) -> &str { "Echoes back the input" }
        fn parameters_schema(&self) -> serde_json::Value {
            serde_json::json!({
                "type": "object",
                "properties": {
                    "text": { "type": "string" }
                },
                "required": ["text"]
            })
        }
        async fn execute(&self, arguments: serde_json::Value) -> std::result::Result<ToolResult, ToolError> {
            let text = arguments["text"].as_str().unwrap_or("").to_string();
            Ok(ToolResult {
                call_id: "test".into(),
                success: true,
                output: text,
                data: None,
            })
        }
    }

    #[test]
    fn definition_mirrors_tool_surface() {
        let def = EchoTool.to_definition();
        assert_eq!(def.name, "echo");
        assert_eq!(def.parameters["required"][0], "text");
    }

    #[tokio::test]
    async fn execute_echo_tool() {
        let result = EchoTool
            .execute(serde_json::json!({"text": "hello world"}))
            .await
            .unwrap();
        assert!(result.success);
        assert_eq!(result.output, "hello world");
    }

    #[test]
    fn string_values_are_not_requoted() {
        let result = ToolResult::from_value(serde_json::json!("done"));
        assert_eq!(result.output, "done");
    }

    #[test]
    fn structured_values_render_as_json() {
        let result = ToolResult::from_value(serde_json::json!({"sum": 4}));
        assert_eq!(result.output, r#"{"sum":4}"#);
        assert_eq!(result.data, Some(serde_json::json!({"sum": 4})));
    }
}
