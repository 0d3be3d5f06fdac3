//! LLM orchestrator with tool loop execution.
//!
//! The orchestrator manages one generation:
//! 1. Send the prompt to the LLM, advertising the [`ToolSet`]
//! 2. Stream the response, accumulating text and tool calls
//! 3. Execute tool calls through their bindings
//! 4. While steps remain, feed tool results back and go again
//!
//! With the default of one step, tool calls are executed and their results
//! returned without a follow-up model round.

use std::collections::BTreeMap;
use std::sync::Arc;

use futures::StreamExt;
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::error::ClientError;
use crate::mcp::types::ToolOutput;
use crate::normalized::{NormalizedEvent, event_name};

use super::{
    ChatCompletionsDriver, Generation, LanguageModel, LlmDriver, LlmRequest, LlmSettings, Message,
    ToolCall, ToolCallFunction, ToolResult, ToolSet,
};

/// Accumulated state for a streaming tool call.
#[derive(Debug, Default, Clone)]
struct ToolCallAccumulator {
    id: Option<String>,
    name: Option<String>,
    arguments: String,
}

/// What one model round produced.
#[derive(Debug, Default)]
struct Round {
    text: String,
    tool_calls: Vec<ToolCall>,
}

/// [`LanguageModel`] over an [`LlmDriver`], with tool execution.
#[derive(Clone)]
pub struct Orchestrator {
    settings: LlmSettings,
    driver: Arc<dyn LlmDriver>,
}

#[allow(clippy::missing_fields_in_debug)]
impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("settings", &self.settings)
            .finish()
    }
}

impl Orchestrator {
    /// Create an orchestrator talking Chat Completions to `settings.base_url`.
    pub fn new(settings: LlmSettings) -> Self {
        let driver: Arc<dyn LlmDriver> = Arc::new(ChatCompletionsDriver::new(settings.clone()));
        Self::with_driver(settings, driver)
    }

    /// Create an orchestrator over an explicit driver.
    pub fn with_driver(settings: LlmSettings, driver: Arc<dyn LlmDriver>) -> Self {
        Self { settings, driver }
    }

    async fn run_round(
        &self,
        request_id: &str,
        step: usize,
        req: LlmRequest,
    ) -> anyhow::Result<Round> {
        tracing::debug!(
            request_id = %request_id,
            step,
            message_count = req.messages.len(),
            tool_count = req.tools.len(),
            "Sending request to LLM driver"
        );

        let driver_stream = self.driver.stream(req).await?;
        futures::pin_mut!(driver_stream);

        let mut accumulators: BTreeMap<usize, ToolCallAccumulator> = BTreeMap::new();
        let mut round = Round::default();

        while let Some(event) = driver_stream.next().await {
            let event = event?;
            tracing::trace!(request_id = %request_id, event = event_name(&event), "LLM event");
            match event {
                NormalizedEvent::MessageDelta { text } => round.text.push_str(&text),
                NormalizedEvent::ToolCallDelta {
                    call_index,
                    id,
                    name,
                    arguments_delta,
                } => {
                    let acc = accumulators.entry(call_index).or_default();
                    if acc.id.is_none() {
                        acc.id = id;
                    }
                    if acc.name.is_none() {
                        acc.name = name;
                    }
                    if let Some(delta) = arguments_delta {
                        acc.arguments.push_str(&delta);
                    }
                }
                NormalizedEvent::ToolCallComplete {
                    call_index,
                    id,
                    name,
                    arguments_json,
                } => {
                    accumulators.insert(
                        call_index,
                        ToolCallAccumulator {
                            id: Some(id),
                            name: Some(name),
                            arguments: arguments_json,
                        },
                    );
                }
                NormalizedEvent::Error { message, code } => {
                    tracing::error!(
                        request_id = %request_id,
                        step,
                        code = ?code,
                        error = %message,
                        "LLM provider reported an error"
                    );
                    anyhow::bail!("LLM provider error: {message}");
                }
                NormalizedEvent::Done => break,
            }
        }

        round.tool_calls = accumulators
            .into_values()
            .filter_map(|acc| {
                Some(ToolCall {
                    id: acc.id?,
                    call_type: "function".to_string(),
                    function: ToolCallFunction {
                        name: acc.name?,
                        arguments: acc.arguments,
                    },
                })
            })
            .collect();

        Ok(round)
    }

    async fn execute_tool_call(
        &self,
        request_id: &str,
        tools: &ToolSet,
        tool_call: &ToolCall,
    ) -> anyhow::Result<ToolResult> {
        let function_name = &tool_call.function.name;
        let Some(binding) = tools.by_function_name(function_name) else {
            tracing::warn!(
                request_id = %request_id,
                tool_id = %tool_call.id,
                tool_name = %function_name,
                "Model called an unknown tool"
            );
            return Ok(ToolResult {
                call_id: tool_call.id.clone(),
                name: function_name.clone(),
                output: ToolOutput::error(format!("Unknown tool: {function_name}")),
                success: false,
            });
        };

        let arguments = match serde_json::from_str::<Value>(&tool_call.function.arguments) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        };

        tracing::info!(
            request_id = %request_id,
            tool_id = %tool_call.id,
            tool_name = %binding.name,
            "Executing tool call"
        );

        // A failed invocation means the service is gone; it ends the generation.
        let output = (binding.invoke)(arguments).await.map_err(|e| {
            tracing::error!(
                request_id = %request_id,
                tool_id = %tool_call.id,
                tool_name = %binding.name,
                error = %e,
                "Tool call failed"
            );
            ClientError::Transport(e.context(format!("tool '{}' failed", binding.name)))
        })?;

        Ok(ToolResult {
            call_id: tool_call.id.clone(),
            name: binding.name.clone(),
            success: !output.is_error,
            output,
        })
    }
}

#[async_trait::async_trait]
impl LanguageModel for Orchestrator {
    async fn generate(&self, prompt: &str, tools: &ToolSet) -> anyhow::Result<Generation> {
        let request_id = Uuid::new_v4().to_string();
        let max_steps = self.settings.max_steps.max(1);
        let tool_json = tools.openai_tools_json();

        tracing::info!(
            request_id = %request_id,
            model = %self.settings.model,
            tool_count = tool_json.len(),
            max_steps,
            "Starting generation"
        );

        let mut messages = vec![serde_json::to_value(Message::user(prompt))?];
        let mut generation = Generation::default();

        for step in 1..=max_steps {
            let req = LlmRequest {
                messages: messages.clone(),
                tools: tool_json.clone(),
            };
            let round = self.run_round(&request_id, step, req).await?;
            generation.text = round.text;

            if round.tool_calls.is_empty() {
                break;
            }

            let mut results = Vec::with_capacity(round.tool_calls.len());
            for tool_call in &round.tool_calls {
                results.push(self.execute_tool_call(&request_id, tools, tool_call).await?);
            }

            if step < max_steps {
                messages.push(serde_json::to_value(Message::assistant(
                    &generation.text,
                    round.tool_calls,
                ))?);
                for result in &results {
                    messages.push(serde_json::to_value(Message::tool(
                        &result.call_id,
                        result.output.joined_text(),
                    ))?);
                }
            }
            generation.tool_results.extend(results);
        }

        tracing::info!(
            request_id = %request_id,
            text_length = generation.text.len(),
            tool_results = generation.tool_results.len(),
            "Generation completed"
        );

        Ok(generation)
    }

    fn model_name(&self) -> &str {
        &self.settings.model
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use futures::future::BoxFuture;

    use super::*;
    use crate::llm::{EventStream, Provider, ToolBinding};

    /// Replays one scripted event list per request.
    #[derive(Default)]
    struct ScriptedDriver {
        rounds: Mutex<VecDeque<Vec<NormalizedEvent>>>,
        requests: Mutex<Vec<LlmRequest>>,
    }

    impl ScriptedDriver {
        fn new(rounds: Vec<Vec<NormalizedEvent>>) -> Arc<Self> {
            Arc::new(Self {
                rounds: Mutex::new(rounds.into()),
                requests: Mutex::default(),
            })
        }
    }

    #[async_trait::async_trait]
    impl LlmDriver for ScriptedDriver {
        async fn stream(&self, req: LlmRequest) -> anyhow::Result<EventStream> {
            self.requests.lock().unwrap().push(req);
            let events = self.rounds.lock().unwrap().pop_front().unwrap_or_default();
            Ok(Box::pin(futures::stream::iter(events.into_iter().map(Ok))))
        }
    }

    fn settings(max_steps: usize) -> LlmSettings {
        LlmSettings {
            base_url: "http://localhost:11434".into(),
            api_key: None,
            model: "test-model".into(),
            provider: Provider::Generic,
            max_steps,
        }
    }

    fn create_user_tools() -> ToolSet {
        ToolSet::new(vec![ToolBinding::new(
            "create-user",
            "Create a new user",
            serde_json::json!({"type": "object"}),
            Arc::new(
                |args: Map<String, Value>| -> BoxFuture<'static, anyhow::Result<ToolOutput>> {
                    Box::pin(async move {
                        let name = args.get("name").and_then(Value::as_str).unwrap_or("?");
                        Ok(ToolOutput::text(format!("created {name}")))
                    })
                },
            ),
        )])
    }

    fn tool_call_round() -> Vec<NormalizedEvent> {
        vec![
            NormalizedEvent::ToolCallDelta {
                call_index: 0,
                id: Some("call_1".into()),
                name: Some("create-user".into()),
                arguments_delta: Some(r#"{"name":"#.into()),
            },
            NormalizedEvent::ToolCallDelta {
                call_index: 0,
                id: None,
                name: None,
                arguments_delta: Some(r#""Ada"}"#.into()),
            },
            NormalizedEvent::Done,
        ]
    }

    #[tokio::test]
    async fn test_text_generation() {
        let driver = ScriptedDriver::new(vec![vec![
            NormalizedEvent::MessageDelta { text: "Hel".into() },
            NormalizedEvent::MessageDelta { text: "lo".into() },
            NormalizedEvent::Done,
        ]]);
        let orchestrator = Orchestrator::with_driver(settings(1), driver.clone());

        let generation = orchestrator.generate("Hi", &ToolSet::empty()).await.unwrap();

        assert_eq!(generation.text, "Hello");
        assert!(generation.tool_results.is_empty());
        let requests = driver.requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        assert!(requests[0].tools.is_empty());
        assert_eq!(requests[0].messages[0]["content"], "Hi");
    }

    #[tokio::test]
    async fn test_single_step_executes_tools_without_follow_up() {
        let driver = ScriptedDriver::new(vec![tool_call_round()]);
        let orchestrator = Orchestrator::with_driver(settings(1), driver.clone());

        let generation = orchestrator
            .generate("make Ada", &create_user_tools())
            .await
            .unwrap();

        assert_eq!(generation.text, "");
        assert_eq!(generation.tool_results.len(), 1);
        assert_eq!(generation.tool_results[0].name, "create-user");
        assert!(generation.tool_results[0].success);
        assert_eq!(generation.display_text(), Some("created Ada"));
        assert_eq!(driver.requests.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_multi_step_feeds_results_back() {
        let driver = ScriptedDriver::new(vec![
            tool_call_round(),
            vec![
                NormalizedEvent::MessageDelta {
                    text: "Ada was created".into(),
                },
                NormalizedEvent::Done,
            ],
        ]);
        let orchestrator = Orchestrator::with_driver(settings(3), driver.clone());

        let generation = orchestrator
            .generate("make Ada", &create_user_tools())
            .await
            .unwrap();

        assert_eq!(generation.text, "Ada was created");
        assert_eq!(generation.tool_results.len(), 1);
        let requests = driver.requests.lock().unwrap();
        assert_eq!(requests.len(), 2);
        let second = &requests[1].messages;
        assert_eq!(second[1]["role"], "assistant");
        assert_eq!(second[2]["role"], "tool");
        assert_eq!(second[2]["tool_call_id"], "call_1");
        assert_eq!(second[2]["content"], "created Ada");
    }

    #[tokio::test]
    async fn test_unknown_tool_is_reported_in_results() {
        let driver = ScriptedDriver::new(vec![vec![
            NormalizedEvent::ToolCallComplete {
                call_index: 0,
                id: "call_9".into(),
                name: "delete-everything".into(),
                arguments_json: "{}".into(),
            },
            NormalizedEvent::Done,
        ]]);
        let orchestrator = Orchestrator::with_driver(settings(1), driver);

        let generation = orchestrator
            .generate("oops", &create_user_tools())
            .await
            .unwrap();

        assert_eq!(generation.tool_results.len(), 1);
        assert!(!generation.tool_results[0].success);
        assert!(generation.tool_results[0].output.is_error);
    }

    #[tokio::test]
    async fn test_failed_tool_invocation_fails_generation() {
        let tools = ToolSet::new(vec![ToolBinding::new(
            "create-user",
            "Create a new user",
            serde_json::json!({"type": "object"}),
            Arc::new(
                |_: Map<String, Value>| -> BoxFuture<'static, anyhow::Result<ToolOutput>> {
                    Box::pin(async { anyhow::bail!("transport closed: broken pipe") })
                },
            ),
        )]);
        let driver = ScriptedDriver::new(vec![vec![
            NormalizedEvent::ToolCallComplete {
                call_index: 0,
                id: "call_1".into(),
                name: "create-user".into(),
                arguments_json: r#"{"name":"Ada"}"#.into(),
            },
            NormalizedEvent::Done,
        ]]);
        let orchestrator = Orchestrator::with_driver(settings(1), driver);

        let err = orchestrator.generate("make Ada", &tools).await.unwrap_err();

        let client_err = err.downcast_ref::<ClientError>().expect("typed error");
        assert!(matches!(client_err, ClientError::Transport(_)));
        assert!(client_err.is_fatal());
        assert!(err.to_string().contains("broken pipe"));
    }

    #[tokio::test]
    async fn test_provider_error_fails_generation() {
        let driver = ScriptedDriver::new(vec![vec![NormalizedEvent::Error {
            message: "quota exceeded".into(),
            code: Some("429".into()),
        }]]);
        let orchestrator = Orchestrator::with_driver(settings(1), driver);

        let err = orchestrator
            .generate("Hi", &ToolSet::empty())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("quota exceeded"));
        assert_eq!(orchestrator.model_name(), "test-model");
    }
}
