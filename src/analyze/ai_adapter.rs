//! AI adapter: provider-agnostic completion gateway + shared chat transport.
//!
//! Providers speak the OpenAI-compatible `/chat/completions` wire format. The
//! [`CompletionGateway`] trait is the seam used by the HTTP layer and the feed
//! agent, so tests can swap in scripted gateways.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use metrics::{counter, describe_counter};
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::analyze::incident::StructuredIncident;

// ------------------------------------------------------------
// Public surface
// ------------------------------------------------------------

#[derive(Debug, Error)]
pub enum AiError {
    #[error("{provider} API key not configured. Set {env_var} to enable it.")]
    MissingApiKey {
        provider: &'static str,
        env_var: &'static str,
    },

    #[error("Invalid API key. Please check your {provider} API key and try again.")]
    Unauthorized { provider: &'static str },

    #[error("Insufficient credits in your {provider} account. Please add credits and try again.")]
    InsufficientCredits { provider: &'static str },

    #[error("Rate limit exceeded. Please wait a moment and try again.")]
    RateLimited { provider: &'static str },

    #[error("{provider} API error ({status}): {body}")]
    Upstream {
        provider: &'static str,
        status: u16,
        body: String,
    },

    #[error("Request to {provider} failed: {source}")]
    Transport {
        provider: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("Failed to parse structured output from {provider}: {reason}")]
    SchemaParse {
        provider: &'static str,
        reason: String,
    },

    #[error("Received invalid response from {provider}: {reason}")]
    InvalidResponse {
        provider: &'static str,
        reason: String,
    },
}

impl AiError {
    /// Map a non-2xx provider status to the error taxonomy.
    pub fn from_status(provider: &'static str, status: u16, body: String) -> Self {
        match status {
            401 => AiError::Unauthorized { provider },
            402 => AiError::InsufficientCredits { provider },
            429 => AiError::RateLimited { provider },
            _ => AiError::Upstream {
                provider,
                status,
                body,
            },
        }
    }
}

/// OpenAI-compatible chat message.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ChatMessage {
    pub role: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<ToolCall>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self::with_role("system", content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::with_role("user", content)
    }

    pub fn tool_result(call_id: &str, name: &str, content: impl Into<String>) -> Self {
        Self {
            role: "tool".to_string(),
            content: Some(content.into()),
            tool_call_id: Some(call_id.to_string()),
            name: Some(name.to_string()),
            ..Default::default()
        }
    }

    fn with_role(role: &str, content: impl Into<String>) -> Self {
        Self {
            role: role.to_string(),
            content: Some(content.into()),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolCall {
    pub id: String,
    #[serde(rename = "type", default = "function_kind")]
    pub kind: String,
    pub function: FunctionCall,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FunctionCall {
    pub name: String,
    /// JSON-encoded arguments, as sent by the model.
    #[serde(default)]
    pub arguments: String,
}

fn function_kind() -> String {
    "function".to_string()
}

/// Named JSON schema sent as `response_format.json_schema`.
#[derive(Debug, Clone, PartialEq)]
pub struct JsonSchemaSpec {
    pub name: String,
    pub schema: Value,
}

/// Raw provider response plus the parsed structured content.
/// Serializes as the raw object with an extra `structuredData` key.
#[derive(Debug, Clone, Serialize)]
pub struct StructuredCompletion {
    #[serde(flatten)]
    pub raw: Map<String, Value>,
    #[serde(rename = "structuredData")]
    pub structured_data: Value,
}

impl StructuredCompletion {
    pub fn from_response(raw: Value, provider: &'static str) -> Result<Self, AiError> {
        let structured_data = structured_content(&raw, provider)?;
        let Value::Object(raw) = raw else {
            return Err(AiError::InvalidResponse {
                provider,
                reason: "response is not a JSON object".to_string(),
            });
        };
        Ok(Self {
            raw,
            structured_data,
        })
    }

    /// Typed view of the structured data, when it matches the incident schema.
    pub fn incident(&self) -> Option<StructuredIncident> {
        serde_json::from_value(self.structured_data.clone()).ok()
    }
}

/// Capability interface over an LLM provider.
#[async_trait]
pub trait CompletionGateway: Send + Sync {
    /// Provider name for diagnostics.
    fn provider_name(&self) -> &'static str;

    /// Free-text completion; `options` are extra request fields (temperature, ...).
    async fn complete_with_options(
        &self,
        messages: &[ChatMessage],
        model: &str,
        options: &Map<String, Value>,
    ) -> Result<Value, AiError>;

    async fn complete(&self, messages: &[ChatMessage], model: &str) -> Result<Value, AiError> {
        self.complete_with_options(messages, model, &Map::new())
            .await
    }

    /// Completion constrained to `schema`; fails with [`AiError::SchemaParse`] on non-JSON output.
    async fn complete_structured(
        &self,
        messages: &[ChatMessage],
        model: &str,
        schema: &JsonSchemaSpec,
    ) -> Result<StructuredCompletion, AiError>;

    /// Completion that may answer with `tool_calls`. The caller runs the tools.
    async fn complete_with_tools(
        &self,
        messages: &[ChatMessage],
        tools: &[Value],
        model: &str,
        allow_parallel: bool,
    ) -> Result<Value, AiError>;
}

/// Convenient alias used by callers.
pub type DynGateway = Arc<dyn CompletionGateway>;

/// Fails every call with [`AiError::MissingApiKey`]; used when a provider has no key.
pub struct DisabledGateway {
    provider: &'static str,
    env_var: &'static str,
}

impl DisabledGateway {
    pub fn new(provider: &'static str, env_var: &'static str) -> Self {
        Self { provider, env_var }
    }

    fn err(&self) -> AiError {
        AiError::MissingApiKey {
            provider: self.provider,
            env_var: self.env_var,
        }
    }
}

#[async_trait]
impl CompletionGateway for DisabledGateway {
    fn provider_name(&self) -> &'static str {
        self.provider
    }

    async fn complete_with_options(
        &self,
        _messages: &[ChatMessage],
        _model: &str,
        _options: &Map<String, Value>,
    ) -> Result<Value, AiError> {
        Err(self.err())
    }

    async fn complete_structured(
        &self,
        _messages: &[ChatMessage],
        _model: &str,
        _schema: &JsonSchemaSpec,
    ) -> Result<StructuredCompletion, AiError> {
        Err(self.err())
    }

    async fn complete_with_tools(
        &self,
        _messages: &[ChatMessage],
        _tools: &[Value],
        _model: &str,
        _allow_parallel: bool,
    ) -> Result<Value, AiError> {
        Err(self.err())
    }
}

// ------------------------------------------------------------
// Shared chat transport
// ------------------------------------------------------------

/// One provider's `/chat/completions` endpoint with its credentials.
#[derive(Debug, Clone)]
pub struct ChatEndpoint {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    provider: &'static str,
    key_env: &'static str,
    headers: Vec<(&'static str, String)>,
}

impl ChatEndpoint {
    pub fn new(
        provider: &'static str,
        key_env: &'static str,
        base_url: &str,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Self {
        let http = reqwest::Client::builder()
            .user_agent(concat!("police-ticker/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(Duration::from_secs(4))
            .timeout(timeout)
            .build()
            .unwrap_or_default();
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            provider,
            key_env,
            headers: Vec::new(),
        }
    }

    /// Extra header sent with every request.
    pub fn with_header(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.headers.push((name, value.into()));
        self
    }

    pub fn has_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// POST `body` to `{base_url}/chat/completions` and return the JSON response.
    pub async fn post_chat(&self, body: &Value) -> Result<Value, AiError> {
        let res = self.post_chat_inner(body).await;
        if let Err(e) = &res {
            tracing::warn!(provider = self.provider, error = %e, "chat completion failed");
            counter!("ai_errors_total", "provider" => self.provider).increment(1);
        }
        res
    }

    async fn post_chat_inner(&self, body: &Value) -> Result<Value, AiError> {
        let provider = self.provider;
        let Some(key) = self.api_key.as_deref() else {
            return Err(AiError::MissingApiKey {
                provider,
                env_var: self.key_env,
            });
        };

        counter!("ai_requests_total", "provider" => provider).increment(1);
        let model = body
            .get("model")
            .and_then(Value::as_str)
            .unwrap_or_default();
        tracing::info!(provider, model, "chat completion request");

        let mut req = self
            .http
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(key)
            .json(body);
        for (name, value) in &self.headers {
            req = req.header(*name, value.as_str());
        }

        let resp = req
            .send()
            .await
            .map_err(|source| AiError::Transport { provider, source })?;
        let status = resp.status();
        tracing::debug!(provider, status = status.as_u16(), "chat completion response");

        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(AiError::from_status(provider, status.as_u16(), text));
        }

        let text = resp
            .text()
            .await
            .map_err(|source| AiError::Transport { provider, source })?;
        serde_json::from_str(&text).map_err(|e| AiError::InvalidResponse {
            provider,
            reason: e.to_string(),
        })
    }
}

/// One-time description of the AI series.
pub fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("ai_requests_total", "Chat completion requests sent, by provider.");
        describe_counter!("ai_errors_total", "Failed chat completion calls, by provider.");
    });
}

// ------------------------------------------------------------
// Response helpers
// ------------------------------------------------------------

/// Copy `options` over the top-level fields of `body`.
pub fn merge_options(body: &mut Value, options: &Map<String, Value>) {
    if let Value::Object(map) = body {
        for (k, v) in options {
            map.insert(k.clone(), v.clone());
        }
    }
}

/// `choices[0].message` of a completion response, if it has the expected shape.
pub fn first_message(response: &Value) -> Option<ChatMessage> {
    let msg = response.pointer("/choices/0/message")?;
    serde_json::from_value(msg.clone()).ok()
}

/// Structured content of `choices[0].message.content`: either an object already,
/// or a string holding JSON.
pub fn structured_content(response: &Value, provider: &'static str) -> Result<Value, AiError> {
    match response.pointer("/choices/0/message/content") {
        Some(v @ Value::Object(_)) => Ok(v.clone()),
        Some(Value::String(s)) => {
            serde_json::from_str(s).map_err(|e| AiError::SchemaParse {
                provider,
                reason: e.to_string(),
            })
        }
        _ => Err(AiError::SchemaParse {
            provider,
            reason: "response has no message content".to_string(),
        }),
    }
}
