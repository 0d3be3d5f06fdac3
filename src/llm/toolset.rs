//! Adapter from catalog tools to model-callable functions.
//!
//! A [`ToolSet`] is built once per catalog snapshot. Each [`ToolBinding`]
//! carries the function name exposed to the model, the description and
//! parameter schema, and an `invoke` closure that forwards to the service's
//! `tools/call`.

use std::sync::Arc;

use futures::future::BoxFuture;
use serde_json::{Map, Value};

use crate::mcp::catalog::Catalog;
use crate::mcp::service::CapabilityService;
use crate::mcp::types::ToolOutput;

/// Invocation closure of a [`ToolBinding`].
pub type ToolInvoker =
    Arc<dyn Fn(Map<String, Value>) -> BoxFuture<'static, anyhow::Result<ToolOutput>> + Send + Sync>;

#[derive(Clone)]
pub struct ToolBinding {
    /// Tool name as declared by the service.
    pub name: String,
    /// Sanitized name exposed to the model.
    pub function_name: String,
    pub description: String,
    /// JSON schema of the arguments object.
    pub parameters: Value,
    pub invoke: ToolInvoker,
}

impl std::fmt::Debug for ToolBinding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolBinding")
            .field("name", &self.name)
            .field("function_name", &self.function_name)
            .field("description", &self.description)
            .finish_non_exhaustive()
    }
}

impl ToolBinding {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        parameters: Value,
        invoke: ToolInvoker,
    ) -> Self {
        let name = name.into();
        Self {
            function_name: sanitize_tool_name(&name),
            name,
            description: description.into(),
            parameters,
            invoke,
        }
    }
}

/// Immutable list of model-callable tools.
#[derive(Debug, Clone, Default)]
pub struct ToolSet {
    bindings: Arc<[ToolBinding]>,
}

impl ToolSet {
    /// A set with no tools; the model gets no tool access.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn new(bindings: Vec<ToolBinding>) -> Self {
        Self {
            bindings: bindings.into(),
        }
    }

    /// Bind every catalog tool to `service`.
    pub fn from_catalog(catalog: &Catalog, service: &Arc<dyn CapabilityService>) -> Self {
        let bindings = catalog
            .tools()
            .map(|tool| {
                let service = Arc::clone(service);
                let tool_name = tool.name.clone();
                let invoke: ToolInvoker = Arc::new(
                    move |args: Map<String, Value>| -> BoxFuture<'static, anyhow::Result<ToolOutput>> {
                        let service = Arc::clone(&service);
                        let tool_name = tool_name.clone();
                        Box::pin(async move { service.call_tool(&tool_name, args).await })
                    },
                );
                ToolBinding::new(
                    tool.name.clone(),
                    tool.description.clone().unwrap_or_default(),
                    Value::Object(tool.input_schema.clone()),
                    invoke,
                )
            })
            .collect();
        Self::new(bindings)
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Look a binding up by the function name the model used.
    pub fn by_function_name(&self, function_name: &str) -> Option<&ToolBinding> {
        self.bindings
            .iter()
            .find(|b| b.function_name == function_name)
    }

    /// Tools in `OpenAI` function-calling format.
    pub fn openai_tools_json(&self) -> Vec<Value> {
        self.bindings
            .iter()
            .map(|b| {
                serde_json::json!({
                    "type": "function",
                    "function": {
                        "name": b.function_name,
                        "description": b.description,
                        "parameters": b.parameters
                    }
                })
            })
            .collect()
    }
}

/// Function names must match `^[a-zA-Z0-9_-]+$` for most providers.
fn sanitize_tool_name(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect()
}
