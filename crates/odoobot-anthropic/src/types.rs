// SPDX-FileCopyrightText: 2026 Odoobot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Messages API request/response types, including the remote tool server descriptor.

use serde::{Deserialize, Serialize};

// --- Request types ---

/// A request to the Messages API.
#[derive(Debug, Clone, Serialize)]
pub struct MessageRequest {
    /// Model identifier (e.g., "claude-3-5-sonnet-20241022").
    pub model: String,

    /// Maximum tokens to generate.
    pub max_tokens: u32,

    /// Conversation messages. Always a single user turn here.
    pub messages: Vec<ApiMessage>,

    /// Remote tool servers the model may call. Present only on tool-augmented calls.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mcp_servers: Option<Vec<McpServer>>,
}

impl MessageRequest {
    /// Single user message, no tool server.
    pub fn user(model: impl Into<String>, max_tokens: u32, content: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            max_tokens,
            messages: vec![ApiMessage {
                role: "user".to_string(),
                content: content.into(),
            }],
            mcp_servers: None,
        }
    }

    pub fn with_mcp_server(mut self, server: McpServer) -> Self {
        self.mcp_servers.get_or_insert_with(Vec::new).push(server);
        self
    }

    /// True when the request advertises a tool server.
    pub fn is_tool_augmented(&self) -> bool {
        self.mcp_servers.as_ref().is_some_and(|s| !s.is_empty())
    }
}

/// A single message in the conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiMessage {
    /// Role: "user" or "assistant".
    pub role: String,
    pub content: String,
}

/// URL-based remote tool server descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct McpServer {
    /// Always "url".
    #[serde(rename = "type")]
    pub server_type: String,
    pub url: String,
    pub name: String,
    pub tool_configuration: ToolConfiguration,
}

impl McpServer {
    /// Descriptor for `url` with every tool enabled.
    pub fn url(url: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            server_type: "url".to_string(),
            url: url.into(),
            name: name.into(),
            tool_configuration: ToolConfiguration { enabled: true },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolConfiguration {
    pub enabled: bool,
}

// --- Response types ---

/// A response from the Messages API. Only the content blocks are used.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MessagesResponse {
    #[serde(default)]
    pub content: Vec<ResponseBlock>,
}

/// A content block in a response.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type")]
pub enum ResponseBlock {
    /// Text written by the model.
    #[serde(rename = "text")]
    Text {
        #[serde(default)]
        text: String,
    },
    /// Output of a remote tool call.
    #[serde(rename = "mcp_tool_result")]
    McpToolResult {
        #[serde(default)]
        content: Vec<serde_json::Value>,
        #[serde(default)]
        is_error: bool,
    },
    /// Any other block type (tool use requests, thinking, ...).
    #[serde(other)]
    Other,
}

impl ResponseBlock {
    pub fn text(text: impl Into<String>) -> Self {
        ResponseBlock::Text { text: text.into() }
    }
}

/// API error response.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorResponse {
    /// Error details.
    pub error: ApiErrorDetail,
}

/// Error detail within an API error response.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorDetail {
    /// Error type identifier.
    #[serde(rename = "type")]
    pub type_: String,
    /// Human-readable error message.
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serialize_direct_request_omits_tool_servers() {
        let req = MessageRequest::user("claude-3-5-sonnet-20241022", 512, "bonjour");
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["model"], "claude-3-5-sonnet-20241022");
        assert_eq!(json["max_tokens"], 512);
        assert_eq!(json["messages"][0]["role"], "user");
        assert_eq!(json["messages"][0]["content"], "bonjour");
        assert!(json.get("mcp_servers").is_none());
        assert!(!req.is_tool_augmented());
    }

    #[test]
    fn serialize_tool_request_with_descriptor() {
        let req = MessageRequest::user("m", 1000, "liste des leads").with_mcp_server(
            McpServer::url("https://host/gradio_api/mcp/sse", "odoo-mcp-server"),
        );
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(
            json["mcp_servers"],
            serde_json::json!([{
                "type": "url",
                "url": "https://host/gradio_api/mcp/sse",
                "name": "odoo-mcp-server",
                "tool_configuration": {"enabled": true}
            }])
        );
        assert!(req.is_tool_augmented());
    }

    #[test]
    fn deserialize_mixed_blocks() {
        let json = r#"{
            "id": "msg_1",
            "type": "message",
            "role": "assistant",
            "content": [
                {"type": "text", "text": "Voici vos leads"},
                {"type": "mcp_tool_use", "id": "t1", "name": "search", "server_name": "odoo-mcp-server", "input": {}},
                {"type": "mcp_tool_result", "tool_use_id": "t1", "is_error": false,
                 "content": [{"type": "text", "text": "[{\"id\": 1}]"}]}
            ],
            "usage": {"input_tokens": 10, "output_tokens": 5}
        }"#;
        let resp: MessagesResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.content.len(), 3);
        assert_eq!(resp.content[0], ResponseBlock::text("Voici vos leads"));
        assert_eq!(resp.content[1], ResponseBlock::Other);
        match &resp.content[2] {
            ResponseBlock::McpToolResult { content, is_error } => {
                assert!(!is_error);
                assert_eq!(content[0]["text"], "[{\"id\": 1}]");
            }
            other => panic!("expected tool result, got {other:?}"),
        }
    }

    #[test]
    fn missing_content_deserializes_empty() {
        let resp: MessagesResponse = serde_json::from_str(r#"{"id": "msg_2"}"#).unwrap();
        assert!(resp.content.is_empty());
    }

    #[test]
    fn deserialize_api_error() {
        let json = r#"{"type": "error", "error": {"type": "invalid_request_error", "message": "bad mcp url"}}"#;
        let err: ApiErrorResponse = serde_json::from_str(json).unwrap();
        assert_eq!(err.error.type_, "invalid_request_error");
        assert_eq!(err.error.message, "bad mcp url");
    }
}
