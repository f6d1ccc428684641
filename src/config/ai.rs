// src/config/ai.rs
use std::time::Duration;

pub const ENV_OPENROUTER_API_KEY: &str = "OPENROUTER_API_KEY";
pub const ENV_CEREBRAS_API_KEY: &str = "CEREBRAS_API_KEY";

pub const DEFAULT_OPENROUTER_BASE_URL: &str = "https://openrouter.ai/api/v1";
pub const DEFAULT_CEREBRAS_BASE_URL: &str = "https://api.cerebras.ai/v1";

pub const DEFAULT_TOOLS_MODEL: &str = "meta-llama/llama-4-scout-17b-16e-instruct";
pub const DEFAULT_PROVIDER_ONLY: &str = "Cerebras";

const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 60;

#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub api_key: Option<String>,
    pub base_url: String,
}

/// Models picked server-side. Chat endpoints take the model from the request body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelDefaults {
    /// Tool-calling model behind the feed analysis endpoint.
    pub tools: String,
}

#[derive(Debug, Clone)]
pub struct AiConfig {
    pub openrouter: ProviderConfig,
    pub cerebras: ProviderConfig,
    /// OpenRouter `provider.only` routing for structured calls. Empty = no restriction.
    pub provider_only: Vec<String>,
    pub models: ModelDefaults,
    pub request_timeout: Duration,
}

impl AiConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|k| std::env::var(k).ok())
    }

    /// Build from any key lookup (env, test map).
    pub fn from_lookup<F>(get: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |k: &str| {
            get(k)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let request_timeout = match non_empty("AI_REQUEST_TIMEOUT_SECS") {
            Some(raw) => match raw.parse::<u64>() {
                Ok(secs) if secs > 0 => Duration::from_secs(secs),
                _ => {
                    tracing::warn!(value = %raw, "invalid AI_REQUEST_TIMEOUT_SECS, using default");
                    Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS)
                }
            },
            None => Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
        };

        let provider_only = non_empty("OPENROUTER_PROVIDER_ONLY")
            .unwrap_or_else(|| DEFAULT_PROVIDER_ONLY.to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty() && s != "*")
            .collect();

        Self {
            openrouter: ProviderConfig {
                api_key: non_empty(ENV_OPENROUTER_API_KEY),
                base_url: non_empty("OPENROUTER_BASE_URL")
                    .unwrap_or_else(|| DEFAULT_OPENROUTER_BASE_URL.to_string()),
            },
            cerebras: ProviderConfig {
                api_key: non_empty(ENV_CEREBRAS_API_KEY),
                base_url: non_empty("CEREBRAS_BASE_URL")
                    .unwrap_or_else(|| DEFAULT_CEREBRAS_BASE_URL.to_string()),
            },
            provider_only,
            models: ModelDefaults {
                tools: non_empty("AI_TOOLS_MODEL")
                    .unwrap_or_else(|| DEFAULT_TOOLS_MODEL.to_string()),
            },
            request_timeout,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |k| map.get(k).cloned()
    }

    #[test]
    fn defaults_without_env() {
        let cfg = AiConfig::from_lookup(|_| None);
        assert!(cfg.openrouter.api_key.is_none());
        assert!(cfg.cerebras.api_key.is_none());
        assert_eq!(cfg.openrouter.base_url, DEFAULT_OPENROUTER_BASE_URL);
        assert_eq!(cfg.cerebras.base_url, DEFAULT_CEREBRAS_BASE_URL);
        assert_eq!(cfg.provider_only, vec!["Cerebras".to_string()]);
        assert_eq!(cfg.models.tools, DEFAULT_TOOLS_MODEL);
        assert_eq!(cfg.request_timeout, Duration::from_secs(60));
    }

    #[test]
    fn blank_keys_count_as_missing() {
        let cfg = AiConfig::from_lookup(lookup(&[
            ("OPENROUTER_API_KEY", "   "),
            ("CEREBRAS_API_KEY", "csk-123"),
        ]));
        assert!(cfg.openrouter.api_key.is_none());
        assert_eq!(cfg.cerebras.api_key.as_deref(), Some("csk-123"));
    }

    #[test]
    fn overrides_are_applied() {
        let cfg = AiConfig::from_lookup(lookup(&[
            ("OPENROUTER_BASE_URL", "http://127.0.0.1:9000/v1"),
            ("OPENROUTER_PROVIDER_ONLY", "Cerebras, Groq"),
            ("AI_TOOLS_MODEL", "openai/gpt-4o"),
            ("AI_REQUEST_TIMEOUT_SECS", "5"),
        ]));
        assert_eq!(cfg.openrouter.base_url, "http://127.0.0.1:9000/v1");
        assert_eq!(cfg.provider_only, vec!["Cerebras", "Groq"]);
        assert_eq!(cfg.models.tools, "openai/gpt-4o");
        assert_eq!(cfg.request_timeout, Duration::from_secs(5));
    }

    #[test]
    fn wildcard_provider_only_disables_restriction() {
        let cfg = AiConfig::from_lookup(lookup(&[("OPENROUTER_PROVIDER_ONLY", "*")]));
        assert!(cfg.provider_only.is_empty());
    }

    #[test]
    fn bad_timeout_falls_back() {
        let cfg = AiConfig::from_lookup(lookup(&[("AI_REQUEST_TIMEOUT_SECS", "soon")]));
        assert_eq!(cfg.request_timeout, Duration::from_secs(60));
    }
}
