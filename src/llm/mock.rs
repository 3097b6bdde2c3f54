// src/llm/mock.rs
//! Deterministic stand-in for a backend, used by tests and local dry runs.

use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use super::{Backend, ChatMessage, LanguageModel};
use crate::error::{ReportError, Result};

type Responder = dyn Fn(usize, &[ChatMessage]) -> std::result::Result<String, String> + Send + Sync;

/// Replies through a closure that sees the call index and the messages.
/// Every call is recorded so tests can assert on prompts and call counts.
#[derive(Clone)]
pub struct ScriptedModel {
    backend: Backend,
    responder: Arc<Responder>,
    delay: Option<Duration>,
    calls: Arc<Mutex<Vec<Vec<ChatMessage>>>>,
}

impl ScriptedModel {
    pub fn new<F>(backend: Backend, responder: F) -> Self
    where
        F: Fn(usize, &[ChatMessage]) -> std::result::Result<String, String> + Send + Sync + 'static,
    {
        Self {
            backend,
            responder: Arc::new(responder),
            delay: None,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Always returns the same text.
    pub fn replying(backend: Backend, text: impl Into<String>) -> Self {
        let text = text.into();
        Self::new(backend, move |_, _| Ok(text.clone()))
    }

    /// Always fails with the same message.
    pub fn failing(backend: Backend, message: impl Into<String>) -> Self {
        let message = message.into();
        Self::new(backend, move |_, _| Err(message.clone()))
    }

    /// Replies in order; the last entry repeats once the script runs out.
    pub fn sequence(backend: Backend, script: Vec<std::result::Result<String, String>>) -> Self {
        Self::new(backend, move |i, _| {
            script
                .get(i)
                .or_else(|| script.last())
                .cloned()
                .unwrap_or_else(|| Err("empty script".to_string()))
        })
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> Vec<Vec<ChatMessage>> {
        self.calls.lock().expect("poisoned call log").clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().expect("poisoned call log").len()
    }
}

#[async_trait]
impl LanguageModel for ScriptedModel {
    async fn invoke(&self, messages: &[ChatMessage]) -> Result<String> {
        let index = {
            let mut log = self.calls.lock().expect("poisoned call log");
            log.push(messages.to_vec());
            log.len() - 1
        };
        if let Some(d) = self.delay {
            tokio::time::sleep(d).await;
        }
        (self.responder)(index, messages).map_err(|m| ReportError::model(self.backend, m))
    }

    fn backend(&self) -> Backend {
        self.backend
    }
}
