//! Scripted collaborators for driving the dispatch loop in tests.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{Map, Value};

use mcp_text_client::llm::{Generation, LanguageModel, ToolSet};
use mcp_text_client::mcp::catalog::Catalog;
use mcp_text_client::mcp::service::CapabilityService;
use mcp_text_client::mcp::types::{
    PromptArgument, PromptListing, PromptResult, ResourceContent, ResourceListing,
    ResourceTemplateListing, ToolListing, ToolOutput,
};
use mcp_text_client::operator::{Choice, Operator};
use mcp_text_client::records::RecordStore;
use mcp_text_client::relay::PromptRelay;
use mcp_text_client::session::Session;

// ─────────────────────────────────────────────────────────────────────────────
// Operator
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub enum Answer {
    Select(usize),
    Input(&'static str),
    Confirm(bool),
}

/// Plays back a fixed list of answers and records everything it was shown.
#[derive(Debug, Default)]
pub struct ScriptedOperator {
    answers: Mutex<VecDeque<Answer>>,
    pub prompts: Mutex<Vec<String>>,
    pub shown: Mutex<Vec<String>>,
    pub reports: Mutex<Vec<String>>,
}

impl ScriptedOperator {
    pub fn new(answers: impl IntoIterator<Item = Answer>) -> Arc<Self> {
        Arc::new(Self {
            answers: Mutex::new(answers.into_iter().collect()),
            ..Self::default()
        })
    }

    fn next(&self, prompt: &str) -> anyhow::Result<Answer> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.answers
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| anyhow::anyhow!("script exhausted at prompt: {prompt}"))
    }

    pub fn shown(&self) -> Vec<String> {
        self.shown.lock().unwrap().clone()
    }

    pub fn reports(&self) -> Vec<String> {
        self.reports.lock().unwrap().clone()
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }

    pub fn remaining(&self) -> usize {
        self.answers.lock().unwrap().len()
    }
}

#[async_trait]
impl Operator for ScriptedOperator {
    async fn select(&self, prompt: &str, choices: &[Choice]) -> anyhow::Result<Option<usize>> {
        if choices.is_empty() {
            self.prompts.lock().unwrap().push(prompt.to_string());
            return Ok(None);
        }
        match self.next(prompt)? {
            Answer::Select(i) => Ok(Some(i)),
            other => anyhow::bail!("expected a selection for {prompt}, script has {other:?}"),
        }
    }

    async fn input(&self, prompt: &str) -> anyhow::Result<String> {
        match self.next(prompt)? {
            Answer::Input(text) => Ok(text.to_string()),
            other => anyhow::bail!("expected input for {prompt}, script has {other:?}"),
        }
    }

    async fn confirm(&self, prompt: &str, _default: bool) -> anyhow::Result<bool> {
        match self.next(prompt)? {
            Answer::Confirm(yes) => Ok(yes),
            other => anyhow::bail!("expected a confirmation for {prompt}, script has {other:?}"),
        }
    }

    fn show(&self, text: &str) {
        self.shown.lock().unwrap().push(text.to_string());
    }

    fn report(&self, text: &str) {
        self.reports.lock().unwrap().push(text.to_string());
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Capability service
// ─────────────────────────────────────────────────────────────────────────────

/// In-memory capability service with canned answers.
#[derive(Debug, Default)]
pub struct FakeService {
    pub tools: Vec<ToolListing>,
    pub prompts: Vec<PromptListing>,
    pub resources: Vec<ResourceListing>,
    pub templates: Vec<ResourceTemplateListing>,
    pub tool_outputs: HashMap<String, ToolOutput>,
    pub resource_contents: HashMap<String, Vec<ResourceContent>>,
    pub prompt_results: HashMap<String, PromptResult>,
    pub tool_calls: Mutex<Vec<(String, Map<String, Value>)>>,
    pub resource_reads: Mutex<Vec<String>>,
    pub prompt_calls: Mutex<Vec<(String, Map<String, Value>)>>,
}

impl FakeService {
    pub fn with_tool(mut self, name: &str, schema: Value, output: ToolOutput) -> Self {
        self.tools.push(ToolListing {
            name: name.to_string(),
            title: None,
            description: Some(format!("{name} tool")),
            input_schema: schema.as_object().cloned().unwrap_or_default(),
        });
        self.tool_outputs.insert(name.to_string(), output);
        self
    }

    /// A listed tool whose every call fails, as when the server has gone away.
    pub fn with_unreachable_tool(mut self, name: &str, schema: Value) -> Self {
        self.tools.push(ToolListing {
            name: name.to_string(),
            title: None,
            description: None,
            input_schema: schema.as_object().cloned().unwrap_or_default(),
        });
        self
    }

    pub fn with_template(mut self, name: &str, uri_template: &str) -> Self {
        self.templates.push(ResourceTemplateListing {
            name: name.to_string(),
            uri_template: uri_template.to_string(),
            description: None,
        });
        self
    }

    pub fn with_resource(mut self, name: &str, uri: &str, text: Option<&str>) -> Self {
        self.resources.push(ResourceListing {
            name: name.to_string(),
            uri: uri.to_string(),
            description: None,
        });
        self.resource_contents.insert(
            uri.to_string(),
            vec![ResourceContent {
                uri: uri.to_string(),
                text: text.map(String::from),
            }],
        );
        self
    }

    pub fn with_resource_contents(mut self, uri: &str, text: &str) -> Self {
        self.resource_contents.insert(
            uri.to_string(),
            vec![ResourceContent {
                uri: uri.to_string(),
                text: Some(text.to_string()),
            }],
        );
        self
    }

    pub fn with_prompt(mut self, name: &str, arguments: &[&str], result: PromptResult) -> Self {
        let listing: PromptListing = serde_json::from_value(serde_json::json!({
            "name": name,
            "arguments": arguments
                .iter()
                .map(|a| serde_json::json!({"name": a, "required": true}))
                .collect::<Vec<_>>(),
        }))
        .unwrap();
        self.prompts.push(listing);
        self.prompt_results.insert(name.to_string(), result);
        self
    }

    pub fn with_prompt_arguments(
        mut self,
        name: &str,
        arguments: Vec<PromptArgument>,
        result: PromptResult,
    ) -> Self {
        self.prompts.push(PromptListing {
            name: name.to_string(),
            description: None,
            arguments,
        });
        self.prompt_results.insert(name.to_string(), result);
        self
    }

    pub fn prompt_calls(&self) -> Vec<(String, Map<String, Value>)> {
        self.prompt_calls.lock().unwrap().clone()
    }

    pub fn tool_calls(&self) -> Vec<(String, Map<String, Value>)> {
        self.tool_calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl CapabilityService for FakeService {
    async fn list_tools(&self) -> anyhow::Result<Vec<ToolListing>> {
        Ok(self.tools.clone())
    }

    async fn list_prompts(&self) -> anyhow::Result<Vec<PromptListing>> {
        Ok(self.prompts.clone())
    }

    async fn list_resources(&self) -> anyhow::Result<Vec<ResourceListing>> {
        Ok(self.resources.clone())
    }

    async fn list_resource_templates(&self) -> anyhow::Result<Vec<ResourceTemplateListing>> {
        Ok(self.templates.clone())
    }

    async fn call_tool(
        &self,
        name: &str,
        arguments: Map<String, Value>,
    ) -> anyhow::Result<ToolOutput> {
        self.tool_calls
            .lock()
            .unwrap()
            .push((name.to_string(), arguments));
        self.tool_outputs
            .get(name)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("unknown tool {name}"))
    }

    async fn read_resource(&self, uri: &str) -> anyhow::Result<Vec<ResourceContent>> {
        self.resource_reads.lock().unwrap().push(uri.to_string());
        Ok(self.resource_contents.get(uri).cloned().unwrap_or_default())
    }

    async fn get_prompt(
        &self,
        name: &str,
        arguments: Map<String, Value>,
    ) -> anyhow::Result<PromptResult> {
        self.prompt_calls
            .lock()
            .unwrap()
            .push((name.to_string(), arguments));
        self.prompt_results
            .get(name)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("unknown prompt {name}"))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Language model
// ─────────────────────────────────────────────────────────────────────────────

/// Returns queued generations in order; empty generations once drained.
#[derive(Debug, Default)]
pub struct FakeModel {
    replies: Mutex<VecDeque<Generation>>,
    /// Prompt and number of tools offered, per call.
    pub calls: Mutex<Vec<(String, usize)>>,
}

impl FakeModel {
    pub fn replying(texts: &[&str]) -> Arc<Self> {
        Self::with_generations(texts.iter().map(|t| Generation {
            text: (*t).to_string(),
            tool_results: vec![],
        }))
    }

    pub fn with_generations(replies: impl IntoIterator<Item = Generation>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into_iter().collect()),
            calls: Mutex::default(),
        })
    }

    pub fn calls(&self) -> Vec<(String, usize)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl LanguageModel for FakeModel {
    async fn generate(&self, prompt: &str, tools: &ToolSet) -> anyhow::Result<Generation> {
        self.calls
            .lock()
            .unwrap()
            .push((prompt.to_string(), tools.len()));
        Ok(self.replies.lock().unwrap().pop_front().unwrap_or_default())
    }

    fn model_name(&self) -> &str {
        "fake-model"
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Session wiring
// ─────────────────────────────────────────────────────────────────────────────

pub struct Harness {
    pub session: Session,
    pub service: Arc<FakeService>,
    pub model: Arc<FakeModel>,
    pub operator: Arc<ScriptedOperator>,
    pub dir: tempfile::TempDir,
}

impl Harness {
    pub async fn new(
        service: FakeService,
        model: Arc<FakeModel>,
        operator: Arc<ScriptedOperator>,
    ) -> Self {
        let service = Arc::new(service);
        let catalog = Catalog::fetch(service.as_ref()).await.unwrap();
        let dir = tempfile::tempdir().unwrap();
        let store = RecordStore::new(
            dir.path().join("data/ai-latest-output.txt"),
            dir.path().join("data/users.json"),
        );
        let relay = Arc::new(PromptRelay::new(operator.clone(), model.clone()));
        let session = Session::new(
            catalog,
            service.clone(),
            model.clone(),
            operator.clone(),
            relay,
            store,
        );
        Self {
            session,
            service,
            model,
            operator,
            dir,
        }
    }

    pub fn latest_output(&self) -> Option<String> {
        std::fs::read_to_string(self.session.store().latest_output_path()).ok()
    }

    pub fn user_log(&self) -> Option<String> {
        std::fs::read_to_string(self.session.store().user_records_path()).ok()
    }
}
