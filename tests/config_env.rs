// tests/config_env.rs
// Serialized because we mutate process env.

use std::env;
use std::fs;

use report_pipeline::config::{AppConfig, ENV_CONFIG_PATH};
use report_pipeline::llm::Backend;
use serial_test::serial;

const KEYS: &[&str] = &[
    ENV_CONFIG_PATH,
    "LLM_PROVIDER",
    "GOOGLE_GENERATIVE_AI_API_KEY",
    "OPENAI_API_KEY",
    "GEMINI_MODEL",
    "OPENAI_MODEL",
    "LLM_TEMPERATURE",
    "LLM_MAX_TOKENS",
    "TAVILY_API_KEY",
    "CRAWL_TIMEOUT_SECS",
    "JOB_MAX_ATTEMPTS",
    "JOB_RETRY_DELAY_SECS",
];

/// Small RAII helper to snapshot & restore env vars in each test.
struct EnvSnapshot {
    saved: Vec<(String, Option<String>)>,
}
impl EnvSnapshot {
    /// Clears every config key, then applies `pairs`.
    fn set(pairs: &[(&str, &str)]) -> Self {
        let saved = KEYS
            .iter()
            .map(|k| (k.to_string(), env::var(k).ok()))
            .collect();
        for k in KEYS {
            env::remove_var(k);
        }
        for (k, v) in pairs {
            env::set_var(k, v);
        }
        Self { saved }
    }
}
impl Drop for EnvSnapshot {
    fn drop(&mut self) {
        for (k, maybe_v) in self.saved.drain(..) {
            match maybe_v {
                Some(v) => env::set_var(&k, v),
                None => env::remove_var(&k),
            }
        }
    }
}

#[test]
#[serial]
fn env_overrides_defaults() {
    let _env = EnvSnapshot::set(&[
        ("LLM_PROVIDER", "OpenAI"),
        ("OPENAI_API_KEY", "sk-test"),
        ("LLM_TEMPERATURE", "0.2"),
        ("TAVILY_API_KEY", "tvly-test"),
        ("JOB_MAX_ATTEMPTS", "5"),
        ("JOB_RETRY_DELAY_SECS", "1"),
    ]);
    let cfg = AppConfig::from_env().unwrap();
    assert_eq!(cfg.llm.primary_backend(), Backend::OpenAi);
    assert_eq!(cfg.llm.api_key(Backend::OpenAi), "sk-test");
    assert_eq!(cfg.llm.api_key(Backend::Gemini), "");
    assert_eq!(cfg.llm.temperature, 0.2);
    assert_eq!(cfg.crawl.tavily_api_key.as_deref(), Some("tvly-test"));
    assert_eq!(cfg.jobs.max_attempts, 5);
    assert_eq!(cfg.jobs.retry_delay_secs, 1);
}

#[test]
#[serial]
fn unparsable_numbers_keep_defaults() {
    let _env = EnvSnapshot::set(&[("LLM_MAX_TOKENS", "lots"), ("CRAWL_TIMEOUT_SECS", "-1")]);
    let cfg = AppConfig::from_env().unwrap();
    assert_eq!(cfg.llm.max_tokens, 2000);
    assert_eq!(cfg.crawl.timeout_secs, 10);
    assert!(cfg.crawl.tavily_api_key.is_none());
}

#[test]
#[serial]
fn file_then_env_precedence() {
    let path = env::temp_dir().join(format!("report-pipeline-{}.toml", std::process::id()));
    fs::write(
        &path,
        r#"
        [llm]
        provider = "openai"
        google_api_key = "ENV"
        gemini_model = "gemini-1.5-flash"

        [crawl]
        timeout_secs = 20
        "#,
    )
    .unwrap();
    let path_str = path.to_str().unwrap().to_string();

    let _env = EnvSnapshot::set(&[
        (ENV_CONFIG_PATH, path_str.as_str()),
        ("GOOGLE_GENERATIVE_AI_API_KEY", "g-key"),
        ("LLM_PROVIDER", "gemini"),
    ]);
    let cfg = AppConfig::from_env().unwrap();
    assert_eq!(cfg.llm.primary_backend(), Backend::Gemini);
    assert_eq!(cfg.llm.api_key(Backend::Gemini), "g-key");
    assert_eq!(cfg.llm.model(Backend::Gemini), "gemini-1.5-flash");
    assert_eq!(cfg.crawl.timeout_secs, 20);
    let _ = fs::remove_file(&path);
}

#[test]
#[serial]
fn missing_config_file_is_an_error() {
    let _env = EnvSnapshot::set(&[(ENV_CONFIG_PATH, "/nonexistent/report.toml")]);
    let err = AppConfig::from_env().unwrap_err();
    assert!(format!("{err:#}").contains("reading config"));
}
