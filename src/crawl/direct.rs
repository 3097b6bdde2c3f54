// src/crawl/direct.rs
//! Direct page fetch used when no search API key is configured.

use anyhow::Context;
use async_trait::async_trait;
use std::time::Duration;

use super::{describe_http_error, extract_visible_text, FetchResult, Fetcher};

pub struct DirectFetcher {
    client: reqwest::Client,
    max_chars: usize,
}

impl DirectFetcher {
    pub fn new(timeout: Duration, max_chars: usize) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent("Mozilla/5.0 (compatible; report-pipeline/0.1)")
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()
            .context("Failed to create HTTP client")?;
        Ok(Self { client, max_chars })
    }

    async fn fetch_html(&self, url: &str) -> Result<String, String> {
        let resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| describe_http_error(&e))?;
        let status = resp.status();
        if !status.is_success() {
            return Err(format!("HTTP {status}"));
        }
        resp.text().await.map_err(|e| describe_http_error(&e))
    }
}

#[async_trait]
impl Fetcher for DirectFetcher {
    async fn fetch(&self, url: &str) -> FetchResult {
        match self.fetch_html(url).await {
            Ok(html) => {
                let (title, text) = extract_visible_text(&html, self.max_chars);
                FetchResult::success(url, text, title)
            }
            Err(e) => FetchResult::failed(url, e),
        }
    }

    fn name(&self) -> &'static str {
        "direct"
    }
}
