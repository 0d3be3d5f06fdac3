//! Session snapshot of the capabilities the connected service declares.
//!
//! The catalog is fetched once, right after connecting, with the four listing
//! calls in flight together. Tool input schemas are validated while the
//! catalog is built; later code reads the typed [`Capability`] variants and
//! never inspects raw schema JSON again.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde_json::{Map, Value};
use tracing::{info, warn};

use super::service::CapabilityService;
use super::types::{
    PromptArgument, PromptListing, ResourceListing, ResourceTemplateListing, ToolListing,
};

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{([^}]+)\}").expect("static regex"));

/// The four capability kinds a service can declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CapabilityKind {
    Tool,
    Resource,
    ResourceTemplate,
    Prompt,
}

impl fmt::Display for CapabilityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Tool => "Tool",
            Self::Resource => "Resource",
            Self::ResourceTemplate => "Resource template",
            Self::Prompt => "Prompt",
        })
    }
}

/// A declared capability with its validated, kind-specific payload.
#[derive(Debug, Clone, PartialEq)]
pub enum Capability {
    Tool(ToolSpec),
    Resource(ResourceSpec),
    ResourceTemplate(ResourceTemplateSpec),
    Prompt(PromptSpec),
}

impl Capability {
    pub fn kind(&self) -> CapabilityKind {
        match self {
            Self::Tool(_) => CapabilityKind::Tool,
            Self::Resource(_) => CapabilityKind::Resource,
            Self::ResourceTemplate(_) => CapabilityKind::ResourceTemplate,
            Self::Prompt(_) => CapabilityKind::Prompt,
        }
    }
}

/// A declared input property of a tool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolParameter {
    pub name: String,
    /// JSON schema type name as declared, `"any"` when absent.
    pub type_name: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ToolSpec {
    pub name: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub input_schema: Map<String, Value>,
    /// Input properties in declaration order.
    pub parameters: Vec<ToolParameter>,
}

impl ToolSpec {
    /// Menu label: the declared title, falling back to the name.
    pub fn label(&self) -> &str {
        self.title.as_deref().unwrap_or(&self.name)
    }
}

/// Rejection reasons for a tool input schema.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchemaError {
    #[error("input schema type must be \"object\", found {0}")]
    NotAnObject(String),
    #[error("input schema properties must be an object")]
    PropertiesNotAnObject,
}

impl TryFrom<ToolListing> for ToolSpec {
    type Error = SchemaError;

    fn try_from(listing: ToolListing) -> Result<Self, Self::Error> {
        if let Some(ty) = listing.input_schema.get("type")
            && ty.as_str() != Some("object")
        {
            return Err(SchemaError::NotAnObject(ty.to_string()));
        }

        let parameters = match listing.input_schema.get("properties") {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Object(props)) => props
                .iter()
                .map(|(name, prop)| ToolParameter {
                    name: name.clone(),
                    type_name: type_name(prop),
                })
                .collect(),
            Some(_) => return Err(SchemaError::PropertiesNotAnObject),
        };

        Ok(Self {
            name: listing.name,
            title: listing.title,
            description: listing.description,
            input_schema: listing.input_schema,
            parameters,
        })
    }
}

fn type_name(prop: &Value) -> String {
    match prop.get("type") {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Array(types)) => types
            .iter()
            .filter_map(Value::as_str)
            .collect::<Vec<_>>()
            .join("|"),
        _ => "any".to_string(),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceSpec {
    pub name: String,
    pub description: Option<String>,
    pub uri: String,
}

impl From<ResourceListing> for ResourceSpec {
    fn from(listing: ResourceListing) -> Self {
        Self {
            name: listing.name,
            description: listing.description,
            uri: listing.uri,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceTemplateSpec {
    pub name: String,
    pub description: Option<String>,
    pub uri_template: String,
    /// `{param}` names in order of appearance, duplicates kept.
    pub placeholders: Vec<String>,
}

impl From<ResourceTemplateListing> for ResourceTemplateSpec {
    fn from(listing: ResourceTemplateListing) -> Self {
        Self {
            placeholders: uri_placeholders(&listing.uri_template),
            name: listing.name,
            description: listing.description,
            uri_template: listing.uri_template,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptSpec {
    pub name: String,
    pub description: Option<String>,
    pub arguments: Vec<PromptArgument>,
}

impl From<PromptListing> for PromptSpec {
    fn from(listing: PromptListing) -> Self {
        Self {
            name: listing.name,
            description: listing.description,
            arguments: listing.arguments,
        }
    }
}

/// `{param}` placeholder names in `uri`, in order of appearance.
pub fn uri_placeholders(uri: &str) -> Vec<String> {
    PLACEHOLDER
        .captures_iter(uri)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Immutable snapshot of the service's capabilities.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    entries: Vec<Capability>,
}

impl Catalog {
    /// Fetch all four listings concurrently and build the catalog.
    ///
    /// Fails if any listing fails; no partial catalog is produced.
    pub async fn fetch(service: &dyn CapabilityService) -> anyhow::Result<Self> {
        let (tools, prompts, resources, templates) = tokio::try_join!(
            service.list_tools(),
            service.list_prompts(),
            service.list_resources(),
            service.list_resource_templates(),
        )?;

        let catalog = Self::from_listings(tools, prompts, resources, templates);
        info!(
            name: "mcp.catalog.loaded",
            tools = catalog.count(CapabilityKind::Tool),
            prompts = catalog.count(CapabilityKind::Prompt),
            resources = catalog.count(CapabilityKind::Resource),
            resource_templates = catalog.count(CapabilityKind::ResourceTemplate),
            "Capability catalog loaded"
        );
        Ok(catalog)
    }

    /// Build a catalog from raw listings, dropping tools whose input schema
    /// is malformed.
    pub fn from_listings(
        tools: Vec<ToolListing>,
        prompts: Vec<PromptListing>,
        resources: Vec<ResourceListing>,
        templates: Vec<ResourceTemplateListing>,
    ) -> Self {
        let mut entries = Vec::with_capacity(
            tools.len() + prompts.len() + resources.len() + templates.len(),
        );

        for listing in tools {
            let name = listing.name.clone();
            match ToolSpec::try_from(listing) {
                Ok(spec) => entries.push(Capability::Tool(spec)),
                Err(e) => {
                    warn!(name: "mcp.catalog.tool_rejected", tool = %name, error = %e, "Skipping tool with invalid input schema");
                }
            }
        }
        entries.extend(prompts.into_iter().map(|p| Capability::Prompt(p.into())));
        entries.extend(resources.into_iter().map(|r| Capability::Resource(r.into())));
        entries.extend(
            templates
                .into_iter()
                .map(|t| Capability::ResourceTemplate(t.into())),
        );

        Self { entries }
    }

    pub fn count(&self, kind: CapabilityKind) -> usize {
        self.entries.iter().filter(|c| c.kind() == kind).count()
    }

    pub fn tools(&self) -> impl Iterator<Item = &ToolSpec> {
        self.entries.iter().filter_map(|c| match c {
            Capability::Tool(t) => Some(t),
            _ => None,
        })
    }

    pub fn prompts(&self) -> impl Iterator<Item = &PromptSpec> {
        self.entries.iter().filter_map(|c| match c {
            Capability::Prompt(p) => Some(p),
            _ => None,
        })
    }

    pub fn resources(&self) -> impl Iterator<Item = &ResourceSpec> {
        self.entries.iter().filter_map(|c| match c {
            Capability::Resource(r) => Some(r),
            _ => None,
        })
    }

    pub fn resource_templates(&self) -> impl Iterator<Item = &ResourceTemplateSpec> {
        self.entries.iter().filter_map(|c| match c {
            Capability::ResourceTemplate(r) => Some(r),
            _ => None,
        })
    }

    pub fn tool(&self, name: &str) -> Option<&ToolSpec> {
        self.tools().find(|t| t.name == name)
    }

    /// Resolve a selected resource value to its URI (or URI template) and
    /// the placeholders still to be filled in, in order.
    ///
    /// Concrete resources are matched before templates.
    pub fn resource_uri(&self, value: &str) -> Option<(&str, &[String])> {
        self.resources()
            .find(|r| r.uri == value)
            .map(|r| (r.uri.as_str(), &[][..]))
            .or_else(|| {
                self.resource_templates()
                    .find(|t| t.uri_template == value)
                    .map(|t| (t.uri_template.as_str(), t.placeholders.as_slice()))
            })
    }
}
