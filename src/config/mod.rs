// src/config/mod.rs
//! Process configuration, built once at startup and handed to the pipeline.
//!
//! Sources, in order of precedence:
//! 1) environment variables (after `dotenvy::dotenv()` in the binary)
//! 2) TOML file from `$REPORT_CONFIG_PATH` or an explicit path
//! 3) built-in defaults

pub mod ai;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

pub use ai::LlmConfig;

pub const ENV_CONFIG_PATH: &str = "REPORT_CONFIG_PATH";

fn default_crawl_timeout_secs() -> u64 {
    10
}
fn default_max_content_chars() -> usize {
    5000
}
fn default_max_attempts() -> u32 {
    3
}
fn default_retry_delay_secs() -> u64 {
    60
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlConfig {
    /// Search API key. When absent, pages are fetched directly.
    #[serde(default)]
    pub tavily_api_key: Option<String>,
    #[serde(default = "default_crawl_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_max_content_chars")]
    pub max_content_chars: usize,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            tavily_api_key: None,
            timeout_secs: default_crawl_timeout_secs(),
            max_content_chars: default_max_content_chars(),
        }
    }
}

impl CrawlConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Job-level retry policy applied by the runner.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobConfig {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_retry_delay_secs")]
    pub retry_delay_secs: u64,
}

impl Default for JobConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            retry_delay_secs: default_retry_delay_secs(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub crawl: CrawlConfig,
    #[serde(default)]
    pub jobs: JobConfig,
}

impl AppConfig {
    /// Defaults, then `$REPORT_CONFIG_PATH` (if set), then env overrides.
    pub fn from_env() -> Result<Self> {
        let mut cfg = match std::env::var(ENV_CONFIG_PATH) {
            Ok(p) => Self::parse_file(Path::new(&p))?,
            Err(_) => Self::default(),
        };
        cfg.apply_env();
        cfg.normalize();
        Ok(cfg)
    }

    /// Load from an explicit TOML file; env overrides still apply.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut cfg = Self::parse_file(path.as_ref())?;
        cfg.apply_env();
        cfg.normalize();
        Ok(cfg)
    }

    fn parse_file(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path)
            .with_context(|| format!("reading config from {}", path.display()))?;
        toml::from_str(&data).with_context(|| format!("parsing config {}", path.display()))
    }

    fn apply_env(&mut self) {
        if let Some(v) = env_str("LLM_PROVIDER") {
            self.llm.provider = v;
        }
        if let Some(v) = env_str("GOOGLE_GENERATIVE_AI_API_KEY") {
            self.llm.google_api_key = v;
        }
        if let Some(v) = env_str("OPENAI_API_KEY") {
            self.llm.openai_api_key = v;
        }
        if let Some(v) = env_str("GEMINI_MODEL") {
            self.llm.gemini_model = v;
        }
        if let Some(v) = env_str("OPENAI_MODEL") {
            self.llm.openai_model = v;
        }
        if let Some(v) = env_parse("LLM_TEMPERATURE") {
            self.llm.temperature = v;
        }
        if let Some(v) = env_parse("LLM_MAX_TOKENS") {
            self.llm.max_tokens = v;
        }
        if let Some(v) = env_str("TAVILY_API_KEY") {
            self.crawl.tavily_api_key = Some(v);
        }
        if let Some(v) = env_parse("CRAWL_TIMEOUT_SECS") {
            self.crawl.timeout_secs = v;
        }
        if let Some(v) = env_parse("JOB_MAX_ATTEMPTS") {
            self.jobs.max_attempts = v;
        }
        if let Some(v) = env_parse("JOB_RETRY_DELAY_SECS") {
            self.jobs.retry_delay_secs = v;
        }
    }

    fn normalize(&mut self) {
        self.llm.normalize();
        if self
            .crawl
            .tavily_api_key
            .as_deref()
            .is_some_and(|k| k.trim().is_empty())
        {
            self.crawl.tavily_api_key = None;
        }
        if self.crawl.timeout_secs == 0 {
            self.crawl.timeout_secs = default_crawl_timeout_secs();
        }
        if self.crawl.max_content_chars == 0 {
            self.crawl.max_content_chars = default_max_content_chars();
        }
        self.jobs.max_attempts = self.jobs.max_attempts.max(1);
    }
}

fn env_str(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    env_str(key).and_then(|v| v.trim().parse().ok())
}
