//! Normalized event types for streaming LLM responses.
//!
//! Drivers translate provider wire formats into [`NormalizedEvent`]s so the
//! orchestrator can assemble text and tool calls without knowing which
//! provider it is talking to.
//!
//! # Example
//!
//! ```rust
//! use mcp_text_client::normalized::{NormalizedEvent, event_name};
//!
//! let event = NormalizedEvent::MessageDelta {
//!     text: "Hello".to_string(),
//! };
//! assert_eq!(event_name(&event), "message.delta");
//! ```

use serde::{Deserialize, Serialize};

/// Provider-independent streaming event.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "data")]
pub enum NormalizedEvent {
    /// Incremental assistant text.
    #[serde(rename = "message.delta")]
    MessageDelta {
        /// Text fragment to append.
        text: String,
    },

    /// Incremental tool call delta (streaming tool call assembly).
    #[serde(rename = "tool_call.delta")]
    ToolCallDelta {
        /// Index of this tool call in the current batch.
        call_index: usize,
        /// Tool call ID (may arrive in first delta or later).
        #[serde(skip_serializing_if = "Option::is_none")]
        id: Option<String>,
        /// Tool/function name (may arrive in first delta or later).
        #[serde(skip_serializing_if = "Option::is_none")]
        name: Option<String>,
        /// Incremental arguments JSON fragment.
        #[serde(skip_serializing_if = "Option::is_none")]
        arguments_delta: Option<String>,
    },

    /// Tool call is fully assembled and ready for execution.
    #[serde(rename = "tool_call.complete")]
    ToolCallComplete {
        /// Index of this tool call in the current batch.
        call_index: usize,
        /// Tool call ID.
        id: String,
        /// Tool/function name.
        name: String,
        /// Complete arguments as JSON string.
        arguments_json: String,
    },

    /// The provider reported an error mid-stream.
    #[serde(rename = "error")]
    Error {
        /// Error message.
        message: String,
        /// Optional error code for programmatic handling.
        #[serde(skip_serializing_if = "Option::is_none")]
        code: Option<String>,
    },

    /// Stream has completed successfully.
    #[serde(rename = "done")]
    Done,
}

/// Stable name of a [`NormalizedEvent`], used in trace output.
pub fn event_name(evt: &NormalizedEvent) -> &'static str {
    match evt {
        NormalizedEvent::MessageDelta { .. } => "message.delta",
        NormalizedEvent::ToolCallDelta { .. } => "tool_call.delta",
        NormalizedEvent::ToolCallComplete { .. } => "tool_call.complete",
        NormalizedEvent::Error { .. } => "error",
        NormalizedEvent::Done => "done",
    }
}
