// src/llm/gateway.rs
//! HTTP gateway bound to one backend (OpenAI Chat Completions or Gemini generateContent).
//! Both also stream over SSE.

use async_trait::async_trait;
use futures::future;
use futures::stream::{BoxStream, StreamExt};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::{sse, Backend, ChatMessage, LanguageModel, Role, TextStream};
use crate::config::LlmConfig;
use crate::error::{ReportError, Result};

const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";

pub struct ModelGateway {
    backend: Backend,
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
    temperature: f32,
    max_tokens: u32,
}

impl ModelGateway {
    pub fn new(backend: Backend, cfg: &LlmConfig) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent("report-pipeline/0.1")
            .connect_timeout(Duration::from_secs(4))
            .timeout(Duration::from_secs(cfg.request_timeout_secs))
            .build()?;
        let gw = Self {
            backend,
            http,
            base_url: match backend {
                Backend::OpenAi => OPENAI_BASE_URL,
                Backend::Gemini => GEMINI_BASE_URL,
            }
            .to_string(),
            api_key: cfg.api_key(backend).to_string(),
            model: cfg.model(backend).to_string(),
            temperature: cfg.temperature,
            max_tokens: cfg.max_tokens,
        };
        // Safe diagnostics: only model + key length
        tracing::info!(
            backend = %backend,
            model = %gw.model,
            key_len = gw.api_key.len(),
            "model gateway initialized"
        );
        Ok(gw)
    }

    /// Point at a different API root (proxy, tests). OpenAI appends
    /// `/chat/completions`; Gemini appends `/{model}:generateContent`.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn fail(&self, message: impl Into<String>) -> ReportError {
        ReportError::model(self.backend, message)
    }

    /// Non-2xx becomes a model error carrying the start of the body.
    async fn checked(&self, resp: reqwest::Response) -> Result<reqwest::Response> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let text = resp.text().await.unwrap_or_default();
        Err(self.fail(format!("HTTP {status}: {}", snippet(&text))))
    }

    async fn post_openai(&self, body: &OpenAiRequest<'_>) -> Result<reqwest::Response> {
        let resp = self
            .http
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| self.fail(e.to_string()))?;
        self.checked(resp).await
    }

    async fn post_gemini(
        &self,
        method: &str,
        body: &GeminiRequest,
        alt_sse: bool,
    ) -> Result<reqwest::Response> {
        let url = format!("{}/{}:{method}", self.base_url, self.model);
        let mut req = self.http.post(url).query(&[("key", self.api_key.as_str())]);
        if alt_sse {
            req = req.query(&[("alt", "sse")]);
        }
        let resp = req
            .json(body)
            .send()
            .await
            .map_err(|e| self.fail(e.without_url().to_string()))?;
        self.checked(resp).await
    }

    async fn invoke_openai(&self, messages: &[ChatMessage]) -> Result<String> {
        let body = openai_request(&self.model, messages, self.temperature, self.max_tokens);
        let resp = self.post_openai(&body).await?;
        let parsed: OpenAiResponse = resp.json().await.map_err(|e| self.fail(e.to_string()))?;
        let text = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default();
        non_empty(text).ok_or_else(|| self.fail("empty completion"))
    }

    async fn invoke_gemini(&self, messages: &[ChatMessage]) -> Result<String> {
        let body = gemini_request(messages, self.temperature, self.max_tokens);
        let resp = self.post_gemini("generateContent", &body, false).await?;
        let parsed: GeminiResponse = resp.json().await.map_err(|e| self.fail(e.to_string()))?;
        non_empty(gemini_text(parsed)).ok_or_else(|| self.fail("empty completion"))
    }

    async fn stream_openai(&self, messages: &[ChatMessage]) -> Result<TextStream> {
        let mut body = openai_request(&self.model, messages, self.temperature, self.max_tokens);
        body.stream = true;
        let resp = self.post_openai(&body).await?;
        Ok(text_chunks(
            sse::data_events(resp.bytes_stream()),
            self.backend,
            openai_delta,
        ))
    }

    async fn stream_gemini(&self, messages: &[ChatMessage]) -> Result<TextStream> {
        let body = gemini_request(messages, self.temperature, self.max_tokens);
        let resp = self.post_gemini("streamGenerateContent", &body, true).await?;
        Ok(text_chunks(
            sse::data_events(resp.bytes_stream()),
            self.backend,
            gemini_delta,
        ))
    }
}

/// Parse each SSE payload with `parse`; payloads without text are skipped.
fn text_chunks(
    events: BoxStream<'static, std::result::Result<String, String>>,
    backend: Backend,
    parse: fn(&str) -> std::result::Result<Option<String>, String>,
) -> TextStream {
    events
        .filter_map(move |event| {
            future::ready(match event.and_then(|data| parse(&data)) {
                Ok(Some(text)) => Some(Ok(text)),
                Ok(None) => None,
                Err(e) => Some(Err(ReportError::model(backend, e))),
            })
        })
        .boxed()
}

#[async_trait]
impl LanguageModel for ModelGateway {
    async fn invoke(&self, messages: &[ChatMessage]) -> Result<String> {
        if self.api_key.trim().is_empty() {
            return Err(self.fail("api key not set"));
        }
        let out = match self.backend {
            Backend::OpenAi => self.invoke_openai(messages).await,
            Backend::Gemini => self.invoke_gemini(messages).await,
        };
        if let Err(e) = &out {
            tracing::error!(backend = %self.backend, error = %e, "model invocation failed");
        }
        out
    }

    async fn stream(&self, messages: &[ChatMessage]) -> Result<TextStream> {
        if self.api_key.trim().is_empty() {
            return Err(self.fail("api key not set"));
        }
        let out = match self.backend {
            Backend::OpenAi => self.stream_openai(messages).await,
            Backend::Gemini => self.stream_gemini(messages).await,
        };
        if let Err(e) = &out {
            tracing::error!(backend = %self.backend, error = %e, "model stream failed to open");
        }
        out
    }

    fn backend(&self) -> Backend {
        self.backend
    }
}

// ------------------------------------------------------------
// Wire formats
// ------------------------------------------------------------

#[derive(Debug, Serialize)]
struct OpenAiRequest<'a> {
    model: &'a str,
    messages: Vec<OpenAiMsg<'a>>,
    temperature: f32,
    max_tokens: u32,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    stream: bool,
}

#[derive(Debug, Serialize)]
struct OpenAiMsg<'a> {
    role: Role,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct OpenAiResponse {
    choices: Vec<OpenAiChoice>,
}

#[derive(Debug, Deserialize)]
struct OpenAiChoice {
    message: OpenAiChoiceMsg,
}

#[derive(Debug, Deserialize)]
struct OpenAiChoiceMsg {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAiStreamChunk {
    #[serde(default)]
    choices: Vec<OpenAiStreamChoice>,
}

#[derive(Debug, Deserialize)]
struct OpenAiStreamChoice {
    #[serde(default)]
    delta: OpenAiChoiceDelta,
}

#[derive(Debug, Deserialize, Default)]
struct OpenAiChoiceDelta {
    #[serde(default)]
    content: Option<String>,
}

fn openai_delta(data: &str) -> std::result::Result<Option<String>, String> {
    let chunk: OpenAiStreamChunk = serde_json::from_str(data)
        .map_err(|e| format!("bad stream chunk: {e} (data: {})", snippet(data)))?;
    Ok(chunk
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.delta.content)
        .filter(|t| !t.is_empty()))
}

fn openai_request<'a>(
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
    max_tokens: u32,
) -> OpenAiRequest<'a> {
    OpenAiRequest {
        model,
        messages: messages
            .iter()
            .map(|m| OpenAiMsg {
                role: m.role,
                content: &m.content,
            })
            .collect(),
        temperature,
        max_tokens,
        stream: false,
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<GeminiContent>,
    contents: Vec<GeminiContent>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize, Deserialize, Default)]
struct GeminiContent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiPart {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    #[serde(default)]
    content: GeminiContent,
}

/// System messages become `systemInstruction`; a system-only conversation is
/// sent as a single user turn so the API always gets at least one content.
fn gemini_request(messages: &[ChatMessage], temperature: f32, max_tokens: u32) -> GeminiRequest {
    let mut system_parts = Vec::new();
    let mut contents = Vec::new();
    for m in messages {
        let role = match m.role {
            Role::System => {
                system_parts.push(GeminiPart {
                    text: m.content.clone(),
                });
                continue;
            }
            Role::User => "user",
            Role::Assistant => "model",
        };
        contents.push(GeminiContent {
            role: Some(role.to_string()),
            parts: vec![GeminiPart {
                text: m.content.clone(),
            }],
        });
    }

    let system_instruction = if contents.is_empty() {
        contents.push(GeminiContent {
            role: Some("user".to_string()),
            parts: system_parts,
        });
        None
    } else if system_parts.is_empty() {
        None
    } else {
        Some(GeminiContent {
            role: None,
            parts: system_parts,
        })
    };

    GeminiRequest {
        system_instruction,
        contents,
        generation_config: GenerationConfig {
            temperature,
            max_output_tokens: max_tokens,
        },
    }
}

fn gemini_text(resp: GeminiResponse) -> String {
    resp.candidates
        .into_iter()
        .next()
        .map(|c| {
            c.content
                .parts
                .into_iter()
                .map(|p| p.text)
                .collect::<Vec<_>>()
                .join("")
        })
        .unwrap_or_default()
}

fn gemini_delta(data: &str) -> std::result::Result<Option<String>, String> {
    let chunk: GeminiResponse = serde_json::from_str(data)
        .map_err(|e| format!("bad stream chunk: {e} (data: {})", snippet(data)))?;
    let text = gemini_text(chunk);
    Ok((!text.is_empty()).then_some(text))
}

fn non_empty(s: String) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s)
    }
}

fn snippet(body: &str) -> String {
    body.chars().take(200).collect()
}
