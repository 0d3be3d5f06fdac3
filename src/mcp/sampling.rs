//! Client-side handler for server-initiated requests.
//!
//! The client declares the sampling capability. When the server sends
//! `sampling/createMessage`, the request is handed to the [`PromptRelay`],
//! which asks the operator before anything reaches the model.

use std::sync::Arc;

use rmcp::{
    ClientHandler, ErrorData,
    model::{
        ClientCapabilities, ClientInfo, CreateMessageRequestParams, CreateMessageResult,
        Implementation, ProtocolVersion, Role, SamplingCapability, SamplingContent,
        SamplingMessage, SamplingMessageContent,
    },
    service::{RequestContext, RoleClient},
};
use tracing::{error, info};

use super::types::{PromptMessage, PromptRole};
use crate::config::ClientIdentity;
use crate::relay::PromptRelay;

#[derive(Debug, Clone)]
pub struct SamplingHandler {
    relay: Arc<PromptRelay>,
    identity: ClientIdentity,
}

impl SamplingHandler {
    pub fn new(relay: Arc<PromptRelay>, identity: ClientIdentity) -> Self {
        Self { relay, identity }
    }

    /// Run the request's messages through the relay and build the reply.
    async fn answer(
        &self,
        messages: &[SamplingMessage],
    ) -> Result<CreateMessageResult, ErrorData> {
        let messages: Vec<PromptMessage> = messages.iter().map(to_prompt_message).collect();

        let reply = self.relay.answer_sampling(&messages).await.map_err(|e| {
            error!(name: "mcp.sampling.failed", error = %e, "Sampling request failed");
            ErrorData::internal_error(e.to_string(), None)
        })?;

        Ok(CreateMessageResult {
            model: reply.model,
            stop_reason: Some(reply.stop_reason),
            message: match reply.role {
                PromptRole::User => SamplingMessage::user_text(reply.text),
                PromptRole::Assistant => SamplingMessage::assistant_text(reply.text),
            },
        })
    }
}

/// Keeps the first text item of a message; other content kinds are dropped.
fn to_prompt_message(message: &SamplingMessage) -> PromptMessage {
    let first_text = match &message.content {
        SamplingContent::Single(item) => Some(item),
        SamplingContent::Multiple(items) => items
            .iter()
            .find(|item| matches!(item, SamplingMessageContent::Text(_))),
    };
    PromptMessage {
        role: match message.role {
            Role::User => PromptRole::User,
            Role::Assistant => PromptRole::Assistant,
        },
        text: match first_text {
            Some(SamplingMessageContent::Text(t)) => Some(t.text.clone()),
            _ => None,
        },
    }
}

impl ClientHandler for SamplingHandler {
    async fn create_message(
        &self,
        params: CreateMessageRequestParams,
        _context: RequestContext<RoleClient>,
    ) -> Result<CreateMessageResult, ErrorData> {
        info!(
            name: "mcp.sampling.request",
            messages = params.messages.len(),
            "Server requested sampling"
        );
        self.answer(&params.messages).await
    }

    fn get_info(&self) -> ClientInfo {
        ClientInfo {
            meta: None,
            protocol_version: ProtocolVersion::default(),
            capabilities: ClientCapabilities {
                sampling: Some(SamplingCapability::default()),
                ..Default::default()
            },
            client_info: Implementation {
                name: self.identity.name.clone(),
                title: None,
                version: self.identity.version.clone(),
                description: None,
                icons: None,
                website_url: None,
            },
        }
    }
}
