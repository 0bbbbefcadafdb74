//! OpenAI chat-completions engine.
//!
//! Each call rebuilds the conversation from scratch: system prompt, task, then
//! one assistant tool call plus one tool result per transcript entry. The
//! engine keeps no state between calls, so the orchestrator's transcript is
//! the single source of truth for what has happened.

use std::time::Duration;

use async_trait::async_trait;
use schemars::{schema_for, JsonSchema};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::actions::ActionKind;
use crate::config::{Config, ENGINE_TEMPERATURE};
use crate::credentials::{Credentials, SecretString};
use crate::error::EngineError;
use crate::orchestrator::Transcript;
use crate::traits::engine::{EngineReply, EngineRequest, ReasoningEngine};

use super::prompts::system_prompt;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Deserialize, JsonSchema)]
#[allow(dead_code)]
struct SearchArgs {
    /// The search query
    query: String,
}

#[derive(Deserialize, JsonSchema)]
#[allow(dead_code)]
struct FetchArgs {
    /// The full URL of the page to read
    url: String,
}

/// Reasoning engine that asks an OpenAI chat model for the next step.
pub struct OpenAIEngine {
    client: reqwest::Client,
    api_key: SecretString,
    base_url: String,
    model: String,
    temperature: f32,
}

impl OpenAIEngine {
    pub fn new(api_key: SecretString, model: impl Into<String>) -> reqwest::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            client,
            api_key,
            base_url: "https://api.openai.com/v1".to_string(),
            model: model.into(),
            temperature: ENGINE_TEMPERATURE,
        })
    }

    pub fn from_config(config: &Config, credentials: &Credentials) -> reqwest::Result<Self> {
        Ok(
            Self::new(credentials.openai_api_key.clone(), &config.openai_model)?
                .with_base_url(&config.openai_base_url),
        )
    }

    /// Set a custom base URL (for Azure, proxies, etc.).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    fn build_request(&self, request: &EngineRequest<'_>) -> Value {
        json!({
            "model": self.model,
            "messages": build_messages(request),
            "tools": tool_definitions(request.actions),
            "tool_choice": "auto",
            "parallel_tool_calls": false,
            "temperature": self.temperature,
        })
    }

    async fn send_request(&self, body: &Value) -> Result<Value, EngineError> {
        debug!(model = %self.model, "Sending request to OpenAI API");

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key.expose()))
            .header("Content-Type", "application/json")
            .json(body)
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, "OpenAI request failed");
                EngineError::Network(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            warn!(status = %status, error = %error_text, "OpenAI API error");
            return Err(EngineError::Api(format!(
                "OpenAI API error ({}): {}",
                status, error_text
            )));
        }

        response
            .json()
            .await
            .map_err(|e| EngineError::Parse(e.to_string()))
    }
}

#[async_trait]
impl ReasoningEngine for OpenAIEngine {
    async fn next_step(&self, request: &EngineRequest<'_>) -> Result<EngineReply, EngineError> {
        let body = self.build_request(request);
        let response = self.send_request(&body).await?;
        parse_reply(&response)
    }
}

fn tool_definitions(actions: &[ActionKind]) -> Vec<Value> {
    actions
        .iter()
        .map(|&kind| {
            json!({
                "type": "function",
                "function": {
                    "name": kind.name(),
                    "description": kind.description(),
                    "parameters": parameters_schema(kind),
                }
            })
        })
        .collect()
}

fn parameters_schema(kind: ActionKind) -> Value {
    let schema = match kind {
        ActionKind::Search => schema_for!(SearchArgs),
        ActionKind::Fetch => schema_for!(FetchArgs),
    };
    let mut value = serde_json::to_value(schema).unwrap_or_default();
    if let Value::Object(map) = &mut value {
        map.remove("$schema");
        map.remove("title");
    }
    value
}

/// Conversation replayed from the task and transcript.
fn build_messages(request: &EngineRequest<'_>) -> Vec<Value> {
    let mut messages = vec![
        json!({ "role": "system", "content": system_prompt(request.schema_shape) }),
        json!({ "role": "user", "content": request.task }),
    ];
    messages.extend(transcript_messages(request.transcript));
    messages
}

fn transcript_messages(transcript: &Transcript) -> Vec<Value> {
    let mut messages = Vec::with_capacity(transcript.len() * 2);

    for (i, invocation) in transcript.iter().enumerate() {
        let call_id = format!("call_{}", i);
        let mut arguments = serde_json::Map::new();
        arguments.insert(
            invocation.action.parameter().to_string(),
            Value::String(invocation.argument.clone()),
        );

        messages.push(json!({
            "role": "assistant",
            "content": null,
            "tool_calls": [{
                "id": call_id,
                "type": "function",
                "function": {
                    "name": invocation.action.name(),
                    "arguments": Value::Object(arguments).to_string(),
                }
            }]
        }));
        messages.push(json!({
            "role": "tool",
            "tool_call_id": call_id,
            "content": invocation.result,
        }));
    }

    messages
}

/// Map a chat-completions response to the next step.
fn parse_reply(response: &Value) -> Result<EngineReply, EngineError> {
    let message = response
        .get("choices")
        .and_then(|c| c.get(0))
        .and_then(|c| c.get("message"))
        .ok_or_else(|| EngineError::Parse("No message in response".into()))?;

    let tool_calls = message
        .get("tool_calls")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();

    let Some(first) = tool_calls.first() else {
        let content = message
            .get("content")
            .and_then(Value::as_str)
            .unwrap_or("")
            .to_string();
        debug!(content_len = content.len(), "Engine returned final content");
        return Ok(EngineReply::Final(content));
    };

    if tool_calls.len() > 1 {
        warn!(
            tool_call_count = tool_calls.len(),
            "Engine returned several tool calls, using the first"
        );
    }

    let function = first
        .get("function")
        .ok_or_else(|| EngineError::Parse("Tool call without function".into()))?;
    let name = function
        .get("name")
        .and_then(Value::as_str)
        .ok_or_else(|| EngineError::Parse("Tool call without name".into()))?;
    let raw_arguments = function
        .get("arguments")
        .and_then(Value::as_str)
        .unwrap_or("");

    Ok(EngineReply::action(name, tool_argument(name, raw_arguments)))
}

/// Pull the single argument out of a tool call's JSON arguments.
///
/// Falls back to the first string value, then to the raw text.
fn tool_argument(name: &str, raw: &str) -> String {
    let Ok(Value::Object(arguments)) = serde_json::from_str::<Value>(raw) else {
        return raw.to_string();
    };

    ActionKind::from_name(name)
        .and_then(|kind| arguments.get(kind.parameter()))
        .and_then(Value::as_str)
        .or_else(|| arguments.values().find_map(Value::as_str))
        .map(str::to_string)
        .unwrap_or_else(|| raw.to_string())
}
