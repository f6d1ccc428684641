// src/analyze/openrouter.rs
//! OpenRouter gateway (OpenAI-compatible chat completions with provider routing).

use async_trait::async_trait;
use serde_json::{json, Map, Value};

use crate::analyze::ai_adapter::{
    merge_options, AiError, ChatEndpoint, ChatMessage, CompletionGateway, JsonSchemaSpec,
    StructuredCompletion,
};
use crate::config::ai::{AiConfig, ENV_OPENROUTER_API_KEY};

pub const PROVIDER: &str = "OpenRouter";
const REFERER: &str = "http://localhost:4200";
const APP_TITLE: &str = "Police Ticker App";

pub struct OpenRouterClient {
    endpoint: ChatEndpoint,
    provider_only: Vec<String>,
}

impl OpenRouterClient {
    pub fn from_config(cfg: &AiConfig) -> Self {
        let endpoint = ChatEndpoint::new(
            PROVIDER,
            ENV_OPENROUTER_API_KEY,
            &cfg.openrouter.base_url,
            cfg.openrouter.api_key.clone(),
            cfg.request_timeout,
        )
        .with_header("HTTP-Referer", REFERER)
        .with_header("X-Title", APP_TITLE);
        Self {
            endpoint,
            provider_only: cfg.provider_only.clone(),
        }
    }

    fn completion_body(
        messages: &[ChatMessage],
        model: &str,
        options: &Map<String, Value>,
    ) -> Value {
        let mut body = json!({
            "model": model,
            "messages": messages,
            "temperature": 0.3,
            "max_tokens": 1000,
            "top_p": 0.9,
        });
        merge_options(&mut body, options);
        body
    }

    fn structured_body(
        &self,
        messages: &[ChatMessage],
        model: &str,
        schema: &JsonSchemaSpec,
    ) -> Value {
        let mut body = json!({
            "model": model,
            "messages": messages,
            "temperature": 0.2,
            "max_tokens": 1000,
            "response_format": {
                "type": "json_schema",
                "json_schema": {
                    "name": schema.name,
                    "strict": true,
                    "schema": schema.schema,
                }
            }
        });
        if !self.provider_only.is_empty() {
            body["provider"] = json!({ "only": self.provider_only });
        }
        body
    }

    fn tools_body(
        messages: &[ChatMessage],
        tools: &[Value],
        model: &str,
        allow_parallel: bool,
    ) -> Value {
        json!({
            "model": model,
            "messages": messages,
            "tools": tools,
            "parallel_tool_calls": allow_parallel,
            "temperature": 0.2,
            "max_tokens": 1000,
        })
    }
}

#[async_trait]
impl CompletionGateway for OpenRouterClient {
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
        let body = self.structured_body(messages, model, schema);
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
        tracing::debug!(tools = tools.len(), allow_parallel, "openrouter tools request");
        let body = Self::tools_body(messages, tools, model, allow_parallel);
        let resp = self.endpoint.post_chat(&body).await?;
        let calls = resp
            .pointer("/choices/0/message/tool_calls")
            .and_then(Value::as_array)
            .map_or(0, Vec::len);
        if calls > 0 {
            tracing::info!(calls, "model requested tool calls");
        }
        Ok(resp)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(provider_only: &[&str]) -> OpenRouterClient {
        let mut cfg = AiConfig::from_lookup(|_| None);
        cfg.provider_only = provider_only.iter().map(|s| s.to_string()).collect();
        OpenRouterClient::from_config(&cfg)
    }

    #[test]
    fn completion_defaults_can_be_overridden() {
        let mut opts = Map::new();
        opts.insert("temperature".into(), json!(0.9));
        let body = OpenRouterClient::completion_body(&[ChatMessage::user("hi")], "m", &opts);
        assert_eq!(body["temperature"], json!(0.9));
        assert_eq!(body["max_tokens"], json!(1000));
        assert_eq!(body["top_p"], json!(0.9));
        assert_eq!(body["messages"][0]["content"], "hi");
    }

    #[test]
    fn structured_body_carries_schema_and_routing() {
        let schema = JsonSchemaSpec {
            name: "s".into(),
            schema: json!({"type":"object"}),
        };
        let body = client(&["Cerebras"]).structured_body(&[], "m", &schema);
        assert_eq!(body["response_format"]["type"], "json_schema");
        assert_eq!(body["response_format"]["json_schema"]["strict"], json!(true));
        assert_eq!(body["provider"]["only"], json!(["Cerebras"]));
        assert_eq!(body["temperature"], json!(0.2));

        let open = client(&[]).structured_body(&[], "m", &schema);
        assert!(open.get("provider").is_none());
    }

    #[test]
    fn tools_body_sets_parallel_flag() {
        let body = OpenRouterClient::tools_body(&[], &[json!({"type":"function"})], "m", false);
        assert_eq!(body["parallel_tool_calls"], json!(false));
        assert_eq!(body["tools"].as_array().map(Vec::len), Some(1));
    }

    #[test]
    fn unconfigured_without_key() {
        assert!(!client(&[]).endpoint.has_key());
    }
}
