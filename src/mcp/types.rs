//! Transport-neutral shapes of what the connected service declares and returns.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A tool as declared by `tools/list`, before schema validation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolListing {
    pub name: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(rename = "inputSchema", default)]
    pub input_schema: Map<String, Value>,
}

/// A concrete resource as declared by `resources/list`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceListing {
    pub name: String,
    pub uri: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// A parameterized resource as declared by `resources/templates/list`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceTemplateListing {
    pub name: String,
    #[serde(rename = "uriTemplate")]
    pub uri_template: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// A prompt as declared by `prompts/list`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptListing {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub arguments: Vec<PromptArgument>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptArgument {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub required: bool,
}

/// One content item of a tool result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentItem {
    Text { text: String },
    /// Image, audio, embedded resource, ... carried only by kind.
    Other { kind: String },
}

/// Result of `tools/call`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ToolOutput {
    pub content: Vec<ContentItem>,
    #[serde(rename = "isError", default)]
    pub is_error: bool,
}

impl ToolOutput {
    /// A successful single-text result.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content: vec![ContentItem::Text { text: text.into() }],
            is_error: false,
        }
    }

    /// An error result carrying `message` as its only text.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            content: vec![ContentItem::Text {
                text: message.into(),
            }],
            is_error: true,
        }
    }

    /// All text items joined by newlines; non-text items are skipped.
    pub fn joined_text(&self) -> String {
        self.content
            .iter()
            .filter_map(|item| match item {
                ContentItem::Text { text } => Some(text.as_str()),
                ContentItem::Other { .. } => None,
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Text of the first content item, if that item is text.
    pub fn first_text(&self) -> Option<&str> {
        match self.content.first()? {
            ContentItem::Text { text } => Some(text),
            ContentItem::Other { .. } => None,
        }
    }
}

/// One entry of `resources/read`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceContent {
    pub uri: String,
    /// `None` for binary (blob) contents.
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PromptRole {
    User,
    Assistant,
}

/// A message from `prompts/get` or from a sampling request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptMessage {
    pub role: PromptRole,
    /// `None` when the message carries non-text content.
    pub text: Option<String>,
}

impl PromptMessage {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: PromptRole::User,
            text: Some(text.into()),
        }
    }
}

/// Result of `prompts/get`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PromptResult {
    #[serde(default)]
    pub description: Option<String>,
    pub messages: Vec<PromptMessage>,
}
