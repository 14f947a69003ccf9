//! Message types passed to model calls.
//!
//! These are the values a guarded model call proposes and then forwards:
//! caller builds messages → guard proposes them → provider receives them.

use serde::{Deserialize, Serialize};

/// The role of a message sender in a conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The end user
    User,
    /// The AI assistant
    Assistant,
    /// System instructions
    System,
    /// Tool execution result
    Tool,
}

/// A single message in a model call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Who sent this message
    pub role: Role,

    /// The text content. Absent content deserialises as empty.
    #[serde(default)]
    pub content: String,

    /// Tool calls requested by the assistant (if any)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<MessageToolCall>,

    /// If this is a tool result, which tool call it responds to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,

    /// Optional caller metadata, forwarded untouched
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

impl Message {
    fn with_role(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            tool_calls: Vec::new(),
            tool_call_id: None,
            metadata: serde_json::Map::new(),
        }
    }

    /// Create a new user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self::with_role(Role::User, content)
    }

    /// Create a new assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::with_role(Role::Assistant, content)
    }

    /// Create a new system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self::with_role(Role::System, content)
    }

    /// Create a tool result message.
    pub fn tool_result(tool_call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            tool_call_id: Some(tool_call_id.into()),
            ..Self::with_role(Role::Tool, content)
        }
    }
}

/// A tool call embedded in an assistant message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageToolCall {
    /// Unique ID for this tool call
    pub id: String,

    /// Name of the tool to invoke
    pub name: String,

    /// Arguments as JSON string
    pub arguments: String,
}

/// What a caller hands to a model call: a bare prompt or a message list.
#[derive(Debug, Clone, PartialEq)]
pub enum ModelInput {
    Text(String),
    Messages(Vec<Message>),
}

impl ModelInput {
    /// Normalise into a message list. A bare prompt becomes one user message.
    pub fn into_messages(self) -> Vec<Message> {
        match self {
            ModelInput::Text(text) => vec![Message::user(text)],
            ModelInput::Messages(messages) => messages,
        }
    }
}

impl From<&str> for ModelInput {
    fn from(text: &str) -> Self {
        ModelInput::Text(text.to_string())
    }
}

impl From<String> for ModelInput {
    fn from(text: String) -> Self {
        ModelInput::Text(text)
    }
}

impl From<Vec<Message>> for ModelInput {
    fn from(messages: Vec<Message>) -> Self {
        ModelInput::Messages(messages)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_user_message() {
        let msg = Message::user("Hello, agent!");
        assert_eq!(msg.role, Role::User);
        assert_eq!(msg.content, "Hello, agent!");
        assert!(msg.tool_calls.is_empty());
    }

    #[test]
    fn missing_content_deserialises_as_empty() {
        let msg: Message = serde_json::from_str(r#"{"role":"assistant"}"#).unwrap();
        assert_eq!(msg.role, Role::Assistant);
        assert_eq!(msg.content, "");
    }

    #[test]
    fn wire_shape_is_role_and_content() {
        let json = serde_json::to_value(Message::system("be brief")).unwrap();
        assert_eq!(json, serde_json::json!({"role": "system", "content": "be brief"}));
    }

    #[test]
    fn bare_prompt_becomes_single_user_message() {
        let messages = ModelInput::from("what is 2+2?").into_messages();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].role, Role::User);
        assert_eq!(messages[0].content, "what is 2+2?");
    }

    #[test]
    fn message_list_passes_through() {
        let input = ModelInput::from(vec![Message::system("sys"), Message::user("hi")]);
        let messages = input.into_messages();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[1].content, "hi");
    }

    #[test]
    fn tool_result_carries_call_id() {
        let msg = Message::tool_result("call_1", "42");
        assert_eq!(msg.role, Role::Tool);
        assert_eq!(msg.tool_call_id.as_deref(), Some("call_1"));
    }
}
