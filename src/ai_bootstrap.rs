// src/ai_bootstrap.rs
use std::sync::Arc;
use tracing::{info, warn};

use crate::analyze::ai_adapter::{DisabledGateway, DynGateway};
use crate::analyze::{cerebras, openrouter, CerebrasClient, OpenRouterClient};
use crate::config::ai::{AiConfig, ENV_CEREBRAS_API_KEY, ENV_OPENROUTER_API_KEY};

/// Gateways built from [`AiConfig`]. A provider without a key gets a [`DisabledGateway`].
pub struct AiRuntime {
    pub cfg: AiConfig,
    pub openrouter: DynGateway,
    pub cerebras: DynGateway,
}

impl AiRuntime {
    pub fn from_env() -> Self {
        Self::from_config(AiConfig::from_env())
    }

    pub fn from_config(cfg: AiConfig) -> Self {
        // Safe diagnostics: presence only, never the key itself.
        info!(
            openrouter_key = cfg.openrouter.api_key.is_some(),
            cerebras_key = cfg.cerebras.api_key.is_some(),
            provider_only = ?cfg.provider_only,
            timeout_s = cfg.request_timeout.as_secs(),
            "AI config loaded"
        );

        let openrouter: DynGateway = if cfg.openrouter.api_key.is_some() {
            Arc::new(OpenRouterClient::from_config(&cfg))
        } else {
            warn!("OpenRouter API key not found. Set {ENV_OPENROUTER_API_KEY} to enable it.");
            Arc::new(DisabledGateway::new(openrouter::PROVIDER, ENV_OPENROUTER_API_KEY))
        };

        let cerebras: DynGateway = if cfg.cerebras.api_key.is_some() {
            Arc::new(CerebrasClient::from_config(&cfg))
        } else {
            warn!("Cerebras API key not found. Set {ENV_CEREBRAS_API_KEY} to enable it.");
            Arc::new(DisabledGateway::new(cerebras::PROVIDER, ENV_CEREBRAS_API_KEY))
        };

        Self {
            cfg,
            openrouter,
            cerebras,
        }
    }
}
