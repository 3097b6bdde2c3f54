// src/llm/mod.rs
//! Language-model capability: role-tagged messages in, text out.
//!
//! Backends form a closed set (`Backend`). `gateway::ModelGateway` talks to the
//! real HTTP APIs, `mock::ScriptedModel` stands in for them in tests, and
//! `strategy::ProviderStrategy` picks which one serves a request.

pub mod gateway;
pub mod mock;
pub mod sse;
pub mod strategy;

use async_trait::async_trait;
use futures::stream::{self, BoxStream, StreamExt};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::error::Result;

pub use gateway::ModelGateway;
pub use mock::ScriptedModel;
pub use strategy::{Complexity, ProviderStrategy};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    Gemini,
    #[serde(rename = "openai")]
    OpenAi,
}

impl Backend {
    /// The other member of the two-backend set.
    pub fn fallback(self) -> Backend {
        match self {
            Backend::Gemini => Backend::OpenAi,
            Backend::OpenAi => Backend::Gemini,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Backend::Gemini => "gemini",
            Backend::OpenAi => "openai",
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Backend {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "gemini" => Ok(Backend::Gemini),
            "openai" => Ok(Backend::OpenAi),
            other => Err(format!("unsupported LLM provider: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// Incremental completion text. Concatenating every chunk gives the full reply.
pub type TextStream = BoxStream<'static, Result<String>>;

/// One named backend. Fails with `ReportError::ModelInvocation`.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    async fn invoke(&self, messages: &[ChatMessage]) -> Result<String>;

    /// Streaming variant of `invoke`. Errors before the first chunk are
    /// returned directly; errors mid-stream arrive as stream items. Backends
    /// without native streaming yield the whole reply as one chunk.
    async fn stream(&self, messages: &[ChatMessage]) -> Result<TextStream> {
        let text = self.invoke(messages).await?;
        Ok(stream::once(async move { Ok(text) }).boxed())
    }

    fn backend(&self) -> Backend;
}

pub type DynModel = Arc<dyn LanguageModel>;
