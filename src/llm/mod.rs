//! Language-model access.
//!
//! The [`LanguageModel`] trait is what the rest of the client sees: given a
//! prompt and a [`ToolSet`], produce text and/or tool results. The
//! [`Orchestrator`] implements it on top of an [`LlmDriver`], running the
//! tool-call loop against the connected service.
//!
//! # Drivers
//!
//! - [`ChatCompletionsDriver`]: OpenAI-compatible Chat Completions API
//!   (`/chat/completions`), which covers `OpenAI`, Azure, Gemini's
//!   compatibility endpoint, Groq, `OpenRouter` and friends.
//!
//! # Example
//!
//! ```rust,ignore
//! use mcp_text_client::llm::{LanguageModel, LlmSettings, Orchestrator, Provider, ToolSet};
//!
//! let settings = LlmSettings {
//!     base_url: "https://generativelanguage.googleapis.com/v1beta/openai".to_string(),
//!     api_key: std::env::var("GEMINI_API_KEY").ok(),
//!     model: "gemini-2.0-flash".to_string(),
//!     provider: Provider::Gemini,
//!     max_steps: 1,
//! };
//! let generation = Orchestrator::new(settings).generate("Hello", &ToolSet::empty()).await?;
//! ```

pub mod chat_completions;
pub mod orchestrator;
pub mod provider;
pub mod toolset;

pub use chat_completions::ChatCompletionsDriver;
pub use orchestrator::Orchestrator;
pub use provider::Provider;
pub use toolset::{ToolBinding, ToolSet};

use crate::mcp::types::ToolOutput;
use crate::normalized::NormalizedEvent;
use futures::Stream;

/// LLM connection and model settings.
#[derive(Debug, Clone)]
pub struct LlmSettings {
    /// Base URL for the LLM API (e.g., `https://api.openai.com`).
    pub base_url: String,
    /// Optional API key for authentication.
    pub api_key: Option<String>,
    /// Model identifier (e.g., `gemini-2.0-flash`, `gpt-4o`).
    pub model: String,
    /// Provider type (auto-detected from `base_url` if not specified).
    pub provider: Provider,
    /// Model rounds per request; tool results are fed back between rounds.
    pub max_steps: usize,
}

/// A message in a conversation.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Message {
    /// Role of the message author.
    pub role: MessageRole,
    /// Text content; `null` for assistant turns that only call tools.
    pub content: Option<String>,
    /// Tool call being answered (tool messages only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
    /// Tool calls made by the assistant.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<ToolCall>>,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: Some(content.into()),
            tool_call_id: None,
            tool_calls: None,
        }
    }

    /// An assistant turn that requested `tool_calls`.
    pub fn assistant(content: &str, tool_calls: Vec<ToolCall>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: (!content.is_empty()).then(|| content.to_string()),
            tool_call_id: None,
            tool_calls: Some(tool_calls),
        }
    }

    /// The result of one tool call, fed back to the model.
    pub fn tool(call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Tool,
            content: Some(content.into()),
            tool_call_id: Some(call_id.into()),
            tool_calls: None,
        }
    }
}

/// Role of a message author.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
    Tool,
}

/// A tool call made by the assistant.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ToolCall {
    /// Unique identifier for this tool call.
    pub id: String,
    /// Type of tool (always "function" for now).
    #[serde(rename = "type")]
    pub call_type: String,
    /// Function details.
    pub function: ToolCallFunction,
}

/// Function details in a tool call.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ToolCallFunction {
    /// Function name.
    pub name: String,
    /// Arguments as JSON string.
    pub arguments: String,
}

/// Request to an LLM driver.
#[derive(Debug)]
pub struct LlmRequest {
    /// Conversation messages.
    pub messages: Vec<serde_json::Value>,
    /// Available tools in `OpenAI` function schema format.
    pub tools: Vec<serde_json::Value>,
}

/// Boxed event stream returned by drivers.
pub type EventStream =
    std::pin::Pin<Box<dyn Stream<Item = anyhow::Result<NormalizedEvent>> + Send>>;

/// Trait for LLM streaming drivers.
///
/// Implementations of this trait provide streaming access to LLM responses,
/// emitting [`NormalizedEvent`]s as the model generates output.
#[async_trait::async_trait]
pub trait LlmDriver: Send + Sync {
    /// Stream a response from the LLM.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the connection is interrupted.
    async fn stream(&self, req: LlmRequest) -> anyhow::Result<EventStream>;
}

/// Outcome of executing one model-requested tool call.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolResult {
    pub call_id: String,
    /// Tool name as declared by the service.
    pub name: String,
    pub output: ToolOutput,
    pub success: bool,
}

/// Everything a [`LanguageModel`] produced for one prompt.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Generation {
    /// Final assistant text (may be empty when the model only called tools).
    pub text: String,
    /// Tool results in execution order.
    pub tool_results: Vec<ToolResult>,
}

impl Generation {
    /// The text to show the operator: the generated text, or failing that the
    /// first tool result's first text content.
    pub fn display_text(&self) -> Option<&str> {
        if !self.text.is_empty() {
            return Some(&self.text);
        }
        self.tool_results.first()?.output.first_text()
    }
}

/// Text generation with optional tool access.
#[async_trait::async_trait]
pub trait LanguageModel: Send + Sync {
    /// Run `prompt` through the model. With an empty `tools` set the model
    /// has no tool access.
    async fn generate(&self, prompt: &str, tools: &ToolSet) -> anyhow::Result<Generation>;

    /// Model identifier reported back to sampling requests.
    fn model_name(&self) -> &str;
}
