use async_trait::async_trait;
use serde_json::{Map, Value};

use super::types::{
    PromptListing, PromptResult, ResourceContent, ResourceListing, ResourceTemplateListing,
    ToolListing, ToolOutput,
};

/// Request/response surface of the connected capability service.
///
/// [`McpClient`](super::client::McpClient) implements this over an rmcp
/// child-process session. Every method is a single round trip; nothing is
/// retried.
#[async_trait]
pub trait CapabilityService: Send + Sync {
    async fn list_tools(&self) -> anyhow::Result<Vec<ToolListing>>;

    async fn list_prompts(&self) -> anyhow::Result<Vec<PromptListing>>;

    async fn list_resources(&self) -> anyhow::Result<Vec<ResourceListing>>;

    async fn list_resource_templates(&self) -> anyhow::Result<Vec<ResourceTemplateListing>>;

    async fn call_tool(&self, name: &str, arguments: Map<String, Value>)
    -> anyhow::Result<ToolOutput>;

    async fn read_resource(&self, uri: &str) -> anyhow::Result<Vec<ResourceContent>>;

    async fn get_prompt(
        &self,
        name: &str,
        arguments: Map<String, Value>,
    ) -> anyhow::Result<PromptResult>;
}
