//! rmcp-backed [`CapabilityService`] over a child-process stdio transport.

use std::process::Stdio;

use anyhow::Context;
use async_trait::async_trait;
use rmcp::{
    model::{
        CallToolRequestParams, GetPromptRequestParams, PromptMessageContent, PromptMessageRole,
        RawContent, ReadResourceRequestParams, ResourceContents,
    },
    service::{RoleClient, RunningService, ServiceExt},
    transport::TokioChildProcess,
};
use serde_json::{Map, Value};
use tokio::process::Command;
use tracing::{debug, info};

use super::config::{ServerConfig, expand_env_map};
use super::sampling::SamplingHandler;
use super::service::CapabilityService;
use super::types::{
    ContentItem, PromptArgument, PromptListing, PromptMessage, PromptResult, PromptRole,
    ResourceContent, ResourceListing, ResourceTemplateListing, ToolListing, ToolOutput,
};

/// A live MCP session with the configured server.
///
/// Dropping the client shuts the session down and reaps the child process.
pub struct McpClient {
    service: RunningService<RoleClient, SamplingHandler>,
}

impl std::fmt::Debug for McpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("McpClient").finish_non_exhaustive()
    }
}

impl McpClient {
    /// Spawn the server process and complete the MCP handshake.
    ///
    /// `handler` answers server-initiated sampling requests for the lifetime
    /// of the session.
    pub async fn connect(server: &ServerConfig, handler: SamplingHandler) -> anyhow::Result<Self> {
        let mut cmd = Command::new(&server.command);
        cmd.args(&server.args).stderr(Stdio::null());
        for (k, v) in expand_env_map(&server.env) {
            cmd.env(k, v);
        }

        let transport = TokioChildProcess::new(cmd)
            .with_context(|| format!("failed to spawn MCP server '{}'", server.command))?;
        let service = handler
            .serve(transport)
            .await
            .with_context(|| format!("failed to connect to MCP server '{}'", server.command))?;

        info!(
            name: "mcp.connected",
            command = %server.command,
            args = ?server.args,
            "Connected to MCP server"
        );
        Ok(Self { service })
    }
}

#[async_trait]
impl CapabilityService for McpClient {
    async fn list_tools(&self) -> anyhow::Result<Vec<ToolListing>> {
        let tools = self
            .service
            .list_all_tools()
            .await
            .context("tools/list failed")?;

        Ok(tools
            .into_iter()
            .map(|t| ToolListing {
                title: t
                    .title
                    .clone()
                    .or_else(|| t.annotations.as_ref().and_then(|a| a.title.clone())),
                name: t.name.to_string(),
                description: t.description.as_deref().map(String::from),
                input_schema: (*t.input_schema).clone(),
            })
            .collect())
    }

    async fn list_prompts(&self) -> anyhow::Result<Vec<PromptListing>> {
        let prompts = self
            .service
            .list_all_prompts()
            .await
            .context("prompts/list failed")?;

        Ok(prompts
            .into_iter()
            .map(|p| PromptListing {
                name: p.name,
                description: p.description,
                arguments: p
                    .arguments
                    .unwrap_or_default()
                    .into_iter()
                    .map(|a| PromptArgument {
                        name: a.name,
                        description: a.description,
                        required: a.required.unwrap_or(false),
                    })
                    .collect(),
            })
            .collect())
    }

    async fn list_resources(&self) -> anyhow::Result<Vec<ResourceListing>> {
        let resources = self
            .service
            .list_all_resources()
            .await
            .context("resources/list failed")?;

        Ok(resources
            .into_iter()
            .map(|r| ResourceListing {
                name: r.raw.name,
                uri: r.raw.uri,
                description: r.raw.description,
            })
            .collect())
    }

    async fn list_resource_templates(&self) -> anyhow::Result<Vec<ResourceTemplateListing>> {
        let templates = self
            .service
            .list_all_resource_templates()
            .await
            .context("resources/templates/list failed")?;

        Ok(templates
            .into_iter()
            .map(|t| ResourceTemplateListing {
                name: t.raw.name,
                uri_template: t.raw.uri_template,
                description: t.raw.description,
            })
            .collect())
    }

    async fn call_tool(
        &self,
        name: &str,
        arguments: Map<String, Value>,
    ) -> anyhow::Result<ToolOutput> {
        debug!(tool = %name, argument_count = arguments.len(), "Calling tool");
        let res = self
            .service
            .call_tool(CallToolRequestParams {
                meta: None,
                name: name.to_string().into(),
                arguments: Some(arguments),
                task: None,
            })
            .await
            .with_context(|| format!("tools/call failed for '{name}'"))?;

        Ok(ToolOutput {
            content: res
                .content
                .into_iter()
                .map(|c| match c.raw {
                    RawContent::Text(t) => ContentItem::Text { text: t.text },
                    RawContent::Image(_) => ContentItem::Other {
                        kind: "image".into(),
                    },
                    RawContent::Resource(_) => ContentItem::Other {
                        kind: "resource".into(),
                    },
                    _ => ContentItem::Other {
                        kind: "unsupported".into(),
                    },
                })
                .collect(),
            is_error: res.is_error.unwrap_or(false),
        })
    }

    async fn read_resource(&self, uri: &str) -> anyhow::Result<Vec<ResourceContent>> {
        debug!(uri = %uri, "Reading resource");
        let res = self
            .service
            .read_resource(ReadResourceRequestParams {
                meta: None,
                uri: uri.to_string(),
            })
            .await
            .with_context(|| format!("resources/read failed for '{uri}'"))?;

        Ok(res
            .contents
            .into_iter()
            .map(|c| match c {
                ResourceContents::TextResourceContents { uri, text, .. } => ResourceContent {
                    uri,
                    text: Some(text),
                },
                ResourceContents::BlobResourceContents { uri, .. } => {
                    ResourceContent { uri, text: None }
                }
            })
            .collect())
    }

    async fn get_prompt(
        &self,
        name: &str,
        arguments: Map<String, Value>,
    ) -> anyhow::Result<PromptResult> {
        debug!(prompt = %name, argument_count = arguments.len(), "Getting prompt");
        let res = self
            .service
            .get_prompt(GetPromptRequestParams {
                meta: None,
                name: name.to_string(),
                arguments: Some(arguments),
            })
            .await
            .with_context(|| format!("prompts/get failed for '{name}'"))?;

        Ok(PromptResult {
            description: res.description,
            messages: res
                .messages
                .into_iter()
                .map(|m| PromptMessage {
                    role: match m.role {
                        PromptMessageRole::User => PromptRole::User,
                        PromptMessageRole::Assistant => PromptRole::Assistant,
                    },
                    text: match m.content {
                        PromptMessageContent::Text { text } => Some(text),
                        _ => None,
                    },
                })
                .collect(),
        })
    }
}
