//! Errors surfaced by the interactive loop.
//!
//! Recoverable errors are reported to the operator and the loop continues;
//! fatal ones end the session.

use std::path::PathBuf;

use thiserror::Error;

use crate::mcp::catalog::CapabilityKind;

#[derive(Debug, Error)]
pub enum ClientError {
    /// The operator's selection did not resolve to a catalog entry.
    #[error("{0} not found.")]
    SelectionNotFound(CapabilityKind),

    #[error("resource {uri} did not contain valid JSON: {source}")]
    MalformedResource {
        uri: String,
        source: serde_json::Error,
    },

    #[error("resource {uri} returned no text content")]
    EmptyResource { uri: String },

    #[error("MCP request failed: {0:#}")]
    Transport(anyhow::Error),

    #[error("LLM request failed: {0:#}")]
    Provider(anyhow::Error),

    #[error("terminal interaction failed: {0:#}")]
    Operator(anyhow::Error),

    #[error("failed to write {}: {source}", path.display())]
    Storage {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl ClientError {
    /// Classify an error returned by a language model.
    ///
    /// Typed errors raised underneath (a tool call hitting a dead transport)
    /// keep their class; everything else is a provider failure.
    pub fn from_model(error: anyhow::Error) -> Self {
        match error.downcast::<Self>() {
            Ok(typed) => typed,
            Err(error) => Self::Provider(error),
        }
    }

    /// Whether the interactive loop must stop.
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            Self::SelectionNotFound(_) | Self::MalformedResource { .. } | Self::EmptyResource { .. }
        )
    }
}
