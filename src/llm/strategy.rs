// src/llm/strategy.rs
//! Backend selection: ordered primary → fallback retry, and complexity pinning.

use metrics::counter;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{error, info, warn};

use super::{Backend, ChatMessage, DynModel, ModelGateway, TextStream};
use crate::config::LlmConfig;
use crate::error::{ReportError, Result};

/// Selection knob for `invoke_by_complexity`. Not a retry mechanism.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Complexity {
    /// Pinned to Gemini.
    Simple,
    /// Configured primary.
    #[default]
    Medium,
    /// Pinned to OpenAI.
    Complex,
}

pub struct ProviderStrategy {
    primary: Backend,
    models: HashMap<Backend, DynModel>,
}

impl ProviderStrategy {
    /// Build from explicit backends. A backend that is not supplied fails at
    /// invocation time, the same way an unconfigured real backend would.
    pub fn new(primary: Backend, models: impl IntoIterator<Item = DynModel>) -> Self {
        let models = models.into_iter().map(|m| (m.backend(), m)).collect();
        Self { primary, models }
    }

    /// One HTTP gateway per backend, primary taken from config.
    pub fn from_config(cfg: &LlmConfig) -> anyhow::Result<Self> {
        let gemini: DynModel = Arc::new(ModelGateway::new(Backend::Gemini, cfg)?);
        let openai: DynModel = Arc::new(ModelGateway::new(Backend::OpenAi, cfg)?);
        Ok(Self::new(cfg.primary_backend(), [gemini, openai]))
    }

    pub fn primary(&self) -> Backend {
        self.primary
    }

    pub fn fallback(&self) -> Backend {
        self.primary.fallback()
    }

    async fn invoke_on(&self, backend: Backend, messages: &[ChatMessage]) -> Result<String> {
        match self.models.get(&backend) {
            Some(model) => model.invoke(messages).await,
            None => Err(ReportError::model(backend, "backend not configured")),
        }
    }

    /// Try the primary, then the fallback. When both fail the primary's error
    /// is returned; the fallback's error is only logged.
    pub async fn invoke_with_fallback(&self, messages: &[ChatMessage]) -> Result<String> {
        let primary_err = match self.invoke_on(self.primary, messages).await {
            Ok(text) => return Ok(text),
            Err(e) => e,
        };
        warn!(backend = %self.primary, error = %primary_err, "primary LLM failed");

        let fallback = self.fallback();
        info!(backend = %fallback, "falling back");
        counter!("report_llm_fallback_total").increment(1);

        match self.invoke_on(fallback, messages).await {
            Ok(text) => Ok(text),
            Err(fallback_err) => {
                error!(backend = %fallback, error = %fallback_err, "fallback LLM also failed");
                Err(primary_err)
            }
        }
    }

    /// Open a stream on the primary, or on the fallback if the primary cannot
    /// be opened. Failures after the first chunk are not retried elsewhere.
    pub async fn stream_with_fallback(&self, messages: &[ChatMessage]) -> Result<TextStream> {
        let primary_err = match self.models.get(&self.primary) {
            Some(model) => match model.stream(messages).await {
                Ok(stream) => return Ok(stream),
                Err(e) => e,
            },
            None => ReportError::model(self.primary, "backend not configured"),
        };
        warn!(backend = %self.primary, error = %primary_err, "primary LLM stream failed");

        let fallback = self.fallback();
        counter!("report_llm_fallback_total").increment(1);
        match self.models.get(&fallback) {
            Some(model) => model.stream(messages).await.map_err(|fallback_err| {
                error!(backend = %fallback, error = %fallback_err, "fallback LLM stream also failed");
                primary_err
            }),
            None => Err(primary_err),
        }
    }

    /// Single call on the backend selected by `complexity`. No fallback.
    pub async fn invoke_by_complexity(
        &self,
        messages: &[ChatMessage],
        complexity: Complexity,
    ) -> Result<String> {
        let backend = match complexity {
            Complexity::Simple => Backend::Gemini,
            Complexity::Medium => self.primary,
            Complexity::Complex => Backend::OpenAi,
        };
        self.invoke_on(backend, messages).await
    }
}
