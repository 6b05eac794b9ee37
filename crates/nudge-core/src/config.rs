use std::sync::Arc;

use nudge_provider::{custom, openrouter, LlmProvider};

use crate::gateway::AiGateway;

pub const DEFAULT_BASE_URL: &str = "https://openrouter.ai/api/v1";
pub const DEFAULT_MODEL: &str = "anthropic/claude-3.5-sonnet";

pub const API_KEY_ENV: &str = "NUDGE_API_KEY";
pub const MODEL_ENV: &str = "NUDGE_MODEL";
pub const BASE_URL_ENV: &str = "NUDGE_BASE_URL";

/// Gateway configuration read from the environment. A missing API key
/// is not a startup error: the built provider simply fails on first use.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
}

impl GatewayConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            api_key: lookup(API_KEY_ENV).filter(|k| !k.is_empty()),
            model: lookup(MODEL_ENV)
                .filter(|m| !m.is_empty())
                .unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            base_url: lookup(BASE_URL_ENV)
                .filter(|u| !u.is_empty())
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
        }
    }

    pub fn build_provider(&self) -> Arc<dyn LlmProvider> {
        if self.api_key.is_none() {
            tracing::warn!(
                "{API_KEY_ENV} is not set; gateway calls will fail until a key is provided"
            );
        }
        let key = self.api_key.clone().unwrap_or_default();
        if self.base_url == DEFAULT_BASE_URL {
            Arc::new(openrouter(key))
        } else {
            Arc::new(custom(key, self.base_url.clone()))
        }
    }

    pub fn build_gateway(&self) -> AiGateway {
        AiGateway::new(self.build_provider(), self.model.clone())
    }
}
