//! OpenAI-compatible Chat Completions API driver.
//!
//! This module implements the [`LlmDriver`] trait for the Chat Completions
//! API, supporting streaming responses and tool calls.

use std::collections::BTreeMap;

use anyhow::Context;
use futures::StreamExt;

use crate::normalized::NormalizedEvent;

use super::{EventStream, LlmDriver, LlmRequest, LlmSettings};

/// Accumulated state for a streaming tool call.
#[derive(Default)]
struct ToolAccum {
    id: Option<String>,
    name: Option<String>,
    args: String,
}

/// Driver for the Chat Completions API.
///
/// Posts to the provider's chat URL and streams responses as
/// [`NormalizedEvent`]s.
#[derive(Clone)]
pub struct ChatCompletionsDriver {
    http: reqwest::Client,
    settings: LlmSettings,
}

impl std::fmt::Debug for ChatCompletionsDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatCompletionsDriver")
            .field("base_url", &self.settings.base_url)
            .field("model", &self.settings.model)
            .field("provider", &self.settings.provider)
            .finish_non_exhaustive()
    }
}

impl ChatCompletionsDriver {
    /// Create a new Chat Completions driver with the given settings.
    #[must_use]
    pub fn new(settings: LlmSettings) -> Self {
        Self {
            http: reqwest::Client::new(),
            settings,
        }
    }

    fn request_body(&self, req: LlmRequest) -> serde_json::Value {
        let mut body = serde_json::json!({
            "model": self.settings.model,
            "stream": true,
            "messages": req.messages,
        });
        if !req.tools.is_empty() {
            body["tools"] = serde_json::Value::Array(req.tools);
        }
        body
    }
}

#[async_trait::async_trait]
impl LlmDriver for ChatCompletionsDriver {
    async fn stream(&self, req: LlmRequest) -> anyhow::Result<EventStream> {
        let url = self
            .settings
            .provider
            .build_chat_url(&self.settings.base_url);
        let body = self.request_body(req);

        let mut rb = self.http.post(&url).json(&body);
        if let Some(k) = &self.settings.api_key {
            rb = rb.bearer_auth(k);
        }

        let resp = rb
            .send()
            .await
            .with_context(|| format!("request to {url} failed"))?
            .error_for_status()?;
        let byte_stream = resp.bytes_stream();

        let out = async_stream::try_stream! {
            let mut buf = Vec::<u8>::new();
            let mut tool_accum: BTreeMap<usize, ToolAccum> = BTreeMap::new();

            futures::pin_mut!(byte_stream);
            while let Some(chunk) = byte_stream.next().await {
                let chunk = chunk?;
                buf.extend_from_slice(&chunk);

                while let Some(pos) = find_double_newline(&buf) {
                    let frame = buf.drain(..pos + 2).collect::<Vec<_>>();
                    let text = String::from_utf8_lossy(&frame);

                    for line in text.lines() {
                        let line = line.trim();
                        if !line.starts_with("data:") {
                            continue;
                        }
                        let data = line.trim_start_matches("data:").trim();

                        if data == "[DONE]" {
                            yield NormalizedEvent::Done;
                            continue;
                        }

                        let v: serde_json::Value = serde_json::from_str(data)?;
                        if let Some(err) = v.get("error") {
                            yield NormalizedEvent::Error {
                                message: err.get("message").and_then(|m| m.as_str()).unwrap_or("provider error").to_string(),
                                code: err.get("code").map(ToString::to_string),
                            };
                            continue;
                        }

                        let choice = &v["choices"][0];
                        let delta = &choice["delta"];

                        // Assistant text delta
                        if let Some(s) = delta.get("content").and_then(|x| x.as_str()) {
                            if !s.is_empty() {
                                yield NormalizedEvent::MessageDelta { text: s.to_string() };
                            }
                        }

                        // Tool calls streaming deltas
                        if let Some(arr) = delta.get("tool_calls").and_then(|x| x.as_array()) {
                            for tc in arr {
                                let idx = tc.get("index").and_then(serde_json::Value::as_u64).unwrap_or(0) as usize;
                                let id = tc.get("id").and_then(|x| x.as_str()).map(ToString::to_string);
                                let name = tc.get("function")
                                    .and_then(|f| f.get("name"))
                                    .and_then(|x| x.as_str())
                                    .map(ToString::to_string);
                                let args_delta = tc.get("function")
                                    .and_then(|f| f.get("arguments"))
                                    .and_then(|x| x.as_str())
                                    .map(ToString::to_string);

                                let entry = tool_accum.entry(idx).or_default();
                                if entry.id.is_none() {
                                    entry.id.clone_from(&id);
                                }
                                if entry.name.is_none() {
                                    entry.name.clone_from(&name);
                                }
                                if let Some(ad) = &args_delta {
                                    entry.args.push_str(ad);
                                }

                                yield NormalizedEvent::ToolCallDelta {
                                    call_index: idx,
                                    id,
                                    name,
                                    arguments_delta: args_delta,
                                };
                            }
                        }

                        // Some compatible providers finish tool rounds with "stop"
                        if choice.get("finish_reason").and_then(|x| x.as_str()).is_some() {
                            for (idx, a) in std::mem::take(&mut tool_accum) {
                                if let (Some(id), Some(name)) = (a.id, a.name) {
                                    yield NormalizedEvent::ToolCallComplete {
                                        call_index: idx,
                                        id,
                                        name,
                                        arguments_json: a.args,
                                    };
                                }
                            }
                        }
                    }
                }
            }
        };

        Ok(Box::pin(out))
    }
}

/// Find the position of a double newline in the buffer.
fn find_double_newline(buf: &[u8]) -> Option<usize> {
    buf.windows(2).position(|w| w == b"\n\n")
}
