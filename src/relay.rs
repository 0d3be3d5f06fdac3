//! Prompts coming from the service, relayed through the operator to the model.
//!
//! Two paths lead here: messages returned by `prompts/get` (driven from the
//! dispatch loop), and `sampling/createMessage` requests the server sends on
//! its own. Either way the operator sees each text first and decides whether
//! it is run. The model never gets tool access on this path.

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, info};

use crate::error::ClientError;
use crate::extract::{UserRecord, extract_user};
use crate::llm::{LanguageModel, ToolSet};
use crate::mcp::catalog::Catalog;
use crate::mcp::service::CapabilityService;
use crate::mcp::types::{PromptMessage, PromptRole};
use crate::operator::Operator;
use crate::records::RecordStore;

/// Tool the prompt pipeline persists extracted users through.
pub const CREATE_USER_TOOL: &str = "create-user";

/// Stop reason reported on every sampling reply.
pub const STOP_REASON_END_TURN: &str = "endTurn";

/// Answer to a sampling request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SamplingReply {
    pub role: PromptRole,
    pub model: String,
    pub stop_reason: String,
    pub text: String,
}

/// What the prompt pipeline did with one model output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureOutcome {
    /// The output was empty.
    Skipped,
    /// Neither extraction strategy found a user.
    NoPayload,
    /// The catalog has no `create-user` tool.
    MissingTool,
    /// `create-user` answered with something other than a JSON object.
    Rejected,
    /// The user was created and appended to the record log.
    Saved(UserRecord),
}

pub struct PromptRelay {
    operator: Arc<dyn Operator>,
    model: Arc<dyn LanguageModel>,
}

impl std::fmt::Debug for PromptRelay {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PromptRelay")
            .field("model", &self.model.model_name())
            .finish_non_exhaustive()
    }
}

impl PromptRelay {
    pub fn new(operator: Arc<dyn Operator>, model: Arc<dyn LanguageModel>) -> Self {
        Self { operator, model }
    }

    pub fn model_name(&self) -> &str {
        self.model.model_name()
    }

    /// Show a message's text and, if the operator agrees, run it.
    ///
    /// Returns `None` for non-text messages and declined prompts.
    pub async fn relay(&self, message: &PromptMessage) -> Result<Option<String>, ClientError> {
        let Some(text) = message.text.as_deref() else {
            debug!(role = ?message.role, "Skipping non-text prompt message");
            return Ok(None);
        };

        self.operator.show(text);
        let run = self
            .operator
            .confirm("Would you like to run the above prompt", true)
            .await
            .map_err(ClientError::Operator)?;
        if !run {
            info!(name: "relay.declined", "Operator declined prompt");
            return Ok(None);
        }

        let generation = self
            .model
            .generate(text, &ToolSet::empty())
            .await
            .map_err(ClientError::from_model)?;
        Ok(Some(generation.text))
    }

    /// Answer a sampling request: relay every message and join the outputs of
    /// the accepted ones, empty outputs included.
    pub async fn answer_sampling(
        &self,
        messages: &[PromptMessage],
    ) -> Result<SamplingReply, ClientError> {
        let mut texts = Vec::new();
        for message in messages {
            if let Some(text) = self.relay(message).await? {
                texts.push(text);
            }
        }

        info!(
            name: "relay.sampling.answered",
            messages = messages.len(),
            answered = texts.len(),
            "Answered sampling request"
        );

        Ok(SamplingReply {
            role: PromptRole::User,
            model: self.model_name().to_string(),
            stop_reason: STOP_REASON_END_TURN.to_string(),
            text: texts.join("\n"),
        })
    }

    /// Persist one model output: save it, extract a user, create the user
    /// through the service, and log the record when creation succeeded.
    pub async fn capture_user(
        &self,
        output: &str,
        catalog: &Catalog,
        service: &dyn CapabilityService,
        store: &RecordStore,
    ) -> Result<CaptureOutcome, ClientError> {
        if output.is_empty() {
            return Ok(CaptureOutcome::Skipped);
        }

        self.operator.show(&format!("output ai: {output}"));
        store.write_latest_output(output).await?;

        let Some(record) = extract_user(output) else {
            self.operator
                .show("AI output did not contain a valid user payload.");
            return Ok(CaptureOutcome::NoPayload);
        };

        let Some(tool) = catalog.tool(CREATE_USER_TOOL) else {
            self.operator
                .show(&format!("Tool not found: {CREATE_USER_TOOL}"));
            return Ok(CaptureOutcome::MissingTool);
        };

        let result = service
            .call_tool(&tool.name, record.to_arguments())
            .await
            .map_err(ClientError::Transport)?;

        let Some(reply) = result.first_text() else {
            self.operator.show("Create-user: no response text");
            return Ok(CaptureOutcome::Rejected);
        };
        self.operator.show(reply);

        if !matches!(serde_json::from_str::<Value>(reply), Ok(Value::Object(_))) {
            debug!(tool = %tool.name, "create-user reply is not a JSON object");
            return Ok(CaptureOutcome::Rejected);
        }

        store.append_user(&record).await?;
        info!(name: "relay.user.saved", user = %record.name(), "Saved user record");
        Ok(CaptureOutcome::Saved(record))
    }
}
