// src/analyze/cerebras.rs
//! Cerebras inference gateway. Same wire format as OpenRouter, no routing or defaults.

use async_trait::async_trait;
use serde_json::{json, Map, Value};

use crate::analyze::ai_adapter::{
    merge_options, AiError, ChatEndpoint, ChatMessage, CompletionGateway, JsonSchemaSpec,
    StructuredCompletion,
};
use crate::config::ai::{AiConfig, ENV_CEREBRAS_API_KEY};

pub const PROVIDER: &str = "Cerebras";

pub struct CerebrasClient {
    endpoint: ChatEndpoint,
}

impl CerebrasClient {
    pub fn from_config(cfg: &AiConfig) -> Self {
        Self {
            endpoint: ChatEndpoint::new(
                PROVIDER,
                ENV_CEREBRAS_API_KEY,
                &cfg.cerebras.base_url,
                cfg.cerebras.api_key.clone(),
                cfg.request_timeout,
            ),
        }
    }

    /// Caller options are forwarded as-is, except `stream` (responses are never streamed).
    fn completion_body(
        messages: &[ChatMessage],
        model: &str,
        options: &Map<String, Value>,
    ) -> Value {
        let mut body = json!({ "model": model, "messages": messages });
        merge_options(&mut body, options);
        if let Some(map) = body.as_object_mut() {
            if map.remove("stream").is_some() {
                tracing::debug!("dropping unsupported stream option");
            }
        }
        body
    }
}

#[async_trait]
impl CompletionGateway for CerebrasClient {
    fn provider_name(&self) -> &'static str {
        PROVIDER
    }

    async fn complete_with_options(
        &self,
        messages: &[ChatMessage],
        model: &str,
        options: &Map<String, Value>,
    ) -> Result<Value, AiError> {
        let body = Self::completion_body(messages, model, options);
        self.endpoint.post_chat(&body).await
    }

    async fn complete_structured(
        &self,
        messages: &[ChatMessage],
        model: &str,
        schema: &JsonSchemaSpec,
    ) -> Result<StructuredCompletion, AiError> {
        let body = json!({
            "model": model,
            "messages": messages,
            "temperature": 0.2,
            "response_format": {
                "type": "json_schema",
                "json_schema": { "name": schema.name, "strict": true, "schema": schema.schema }
            }
        });
        let raw = self.endpoint.post_chat(&body).await?;
        StructuredCompletion::from_response(raw, PROVIDER)
    }

    async fn complete_with_tools(
        &self,
        messages: &[ChatMessage],
        tools: &[Value],
        model: &str,
        allow_parallel: bool,
    ) -> Result<Value, AiError> {
        let body = json!({
            "model": model,
            "messages": messages,
            "tools": tools,
            "parallel_tool_calls": allow_parallel,
        });
        self.endpoint.post_chat(&body).await
    }
}
