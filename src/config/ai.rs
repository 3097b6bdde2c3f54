// src/config/ai.rs
use serde::{Deserialize, Serialize};

use crate::llm::Backend;

fn default_provider() -> String {
    "gemini".to_string()
}
fn default_gemini_model() -> String {
    "gemini-1.5-pro".to_string()
}
fn default_openai_model() -> String {
    "gpt-4o".to_string()
}
fn default_temperature() -> f32 {
    0.7
}
fn default_max_tokens() -> u32 {
    2000
}
fn default_request_timeout_secs() -> u64 {
    60
}

/// Language-model settings: which backend is primary and how each backend is called.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// "gemini" | "openai" (case-insensitive)
    #[serde(default = "default_provider")]
    pub provider: String,
    /// "ENV" means: read from GOOGLE_GENERATIVE_AI_API_KEY
    #[serde(default)]
    pub google_api_key: String,
    /// "ENV" means: read from OPENAI_API_KEY
    #[serde(default)]
    pub openai_api_key: String,
    #[serde(default = "default_gemini_model")]
    pub gemini_model: String,
    #[serde(default = "default_openai_model")]
    pub openai_model: String,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            google_api_key: String::new(),
            openai_api_key: String::new(),
            gemini_model: default_gemini_model(),
            openai_model: default_openai_model(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl LlmConfig {
    /// Primary backend. Unknown provider names resolve to Gemini.
    pub fn primary_backend(&self) -> Backend {
        self.provider.parse().unwrap_or(Backend::Gemini)
    }

    pub fn api_key(&self, backend: Backend) -> &str {
        match backend {
            Backend::Gemini => &self.google_api_key,
            Backend::OpenAi => &self.openai_api_key,
        }
    }

    pub fn model(&self, backend: Backend) -> &str {
        match backend {
            Backend::Gemini => &self.gemini_model,
            Backend::OpenAi => &self.openai_model,
        }
    }

    /// Normalize provider name, resolve "ENV" keys and clamp numeric ranges.
    pub(crate) fn normalize(&mut self) {
        self.provider = self.provider.trim().to_lowercase();
        if self.provider.parse::<Backend>().is_err() {
            tracing::warn!(provider = %self.provider, "unsupported LLM provider, using gemini");
            self.provider = default_provider();
        }

        if self.google_api_key.trim().eq_ignore_ascii_case("env") {
            self.google_api_key = std::env::var("GOOGLE_GENERATIVE_AI_API_KEY").unwrap_or_default();
        }
        if self.openai_api_key.trim().eq_ignore_ascii_case("env") {
            self.openai_api_key = std::env::var("OPENAI_API_KEY").unwrap_or_default();
        }

        if !(0.0..=2.0).contains(&self.temperature) {
            self.temperature = default_temperature();
        }
        if self.max_tokens == 0 {
            self.max_tokens = default_max_tokens();
        }
        if self.request_timeout_secs == 0 {
            self.request_timeout_secs = default_request_timeout_secs();
        }
    }
}
