// src/crawl/tavily.rs
//! Tavily search API used as the primary crawl path: the URL is the query and
//! the answer (or the first result's raw content) is the page text.

use anyhow::Context;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::{describe_http_error, FetchResult, Fetcher};

const TAVILY_SEARCH_URL: &str = "https://api.tavily.com/search";

pub struct TavilyClient {
    api_key: String,
    client: reqwest::Client,
    endpoint: String,
}

#[derive(Debug, Serialize)]
struct TavilyRequest<'a> {
    api_key: &'a str,
    query: &'a str,
    search_depth: &'static str,
    include_answer: bool,
    include_raw_content: bool,
}

#[derive(Debug, Deserialize)]
struct TavilyResponse {
    #[serde(default)]
    answer: Option<String>,
    #[serde(default)]
    results: Vec<TavilyResult>,
}

#[derive(Debug, Deserialize)]
struct TavilyResult {
    #[serde(default)]
    title: String,
    #[serde(default)]
    content: String,
    #[serde(default)]
    raw_content: Option<String>,
}

impl TavilyClient {
    pub fn new(api_key: String, timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client")?;
        Ok(Self {
            api_key,
            client,
            endpoint: TAVILY_SEARCH_URL.to_string(),
        })
    }

    /// Point at a different search endpoint (self-hosted proxy, tests).
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    async fn search(&self, url: &str) -> Result<TavilyResponse, String> {
        let req = TavilyRequest {
            api_key: &self.api_key,
            query: url,
            search_depth: "basic",
            include_answer: true,
            include_raw_content: true,
        };
        let resp = self
            .client
            .post(&self.endpoint)
            .json(&req)
            .send()
            .await
            .map_err(|e| describe_http_error(&e))?;
        let status = resp.status();
        if !status.is_success() {
            return Err(format!("Tavily API error {status}"));
        }
        resp.json().await.map_err(|e| describe_http_error(&e))
    }
}

/// Answer first, then the first result's raw content, then its snippet.
fn page_from_response(resp: TavilyResponse) -> (String, String) {
    let first = resp.results.into_iter().next();
    let title = first.as_ref().map(|r| r.title.clone()).unwrap_or_default();
    let content = resp
        .answer
        .filter(|a| !a.trim().is_empty())
        .or_else(|| {
            first.and_then(|r| {
                r.raw_content
                    .filter(|c| !c.trim().is_empty())
                    .or(Some(r.content))
            })
        })
        .unwrap_or_default();
    (title, content)
}

#[async_trait]
impl Fetcher for TavilyClient {
    async fn fetch(&self, url: &str) -> FetchResult {
        match self.search(url).await {
            Ok(resp) => {
                let (title, content) = page_from_response(resp);
                FetchResult::success(url, content, title)
            }
            Err(e) => FetchResult::failed(url, e),
        }
    }

    fn name(&self) -> &'static str {
        "tavily"
    }
}
