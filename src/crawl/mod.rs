// src/crawl/mod.rs
//! Source fetching: one URL in, one `FetchResult` out, never an error.

pub mod direct;
pub mod mock;
pub mod tavily;
pub mod types;

use async_trait::async_trait;
use futures::future::join_all;
use metrics::counter;
use once_cell::sync::Lazy;
use scraper::{Html, Selector};

use crate::config::CrawlConfig;
pub use direct::DirectFetcher;
pub use mock::StaticFetcher;
pub use tavily::TavilyClient;
pub use types::{FetchResult, FetchStatus};

/// Capability that turns a URL into text. Implementations capture every
/// failure mode into `FetchResult::failed`.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> FetchResult;
    fn name(&self) -> &'static str;
}

/// Fetch every URL concurrently, no cap. Output is index-aligned with `urls`.
pub async fn fetch_all<S: AsRef<str>>(fetcher: &dyn Fetcher, urls: &[S]) -> Vec<FetchResult> {
    let results = join_all(urls.iter().map(|u| fetcher.fetch(u.as_ref()))).await;
    for r in &results {
        counter!("report_fetch_total", "status" => r.status.as_str()).increment(1);
        if let Some(err) = &r.error {
            tracing::warn!(url = %r.url, provider = fetcher.name(), error = %err, "fetch failed");
        }
    }
    results
}

/// Production fetcher: search API when a key is configured, direct fetch otherwise.
pub enum Crawler {
    Search(TavilyClient),
    Direct(DirectFetcher),
}

impl Crawler {
    pub fn from_config(cfg: &CrawlConfig) -> anyhow::Result<Self> {
        match &cfg.tavily_api_key {
            Some(key) => Ok(Crawler::Search(TavilyClient::new(key.clone(), cfg.timeout())?)),
            None => {
                tracing::warn!("TAVILY_API_KEY not set, using direct page fetch");
                Ok(Crawler::Direct(DirectFetcher::new(
                    cfg.timeout(),
                    cfg.max_content_chars,
                )?))
            }
        }
    }
}

#[async_trait]
impl Fetcher for Crawler {
    async fn fetch(&self, url: &str) -> FetchResult {
        match self {
            Crawler::Search(c) => c.fetch(url).await,
            Crawler::Direct(d) => d.fetch(url).await,
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Crawler::Search(c) => c.name(),
            Crawler::Direct(d) => d.name(),
        }
    }
}

/// Timeouts are reported as "Timeout"; everything else by its message.
pub(crate) fn describe_http_error(e: &reqwest::Error) -> String {
    if e.is_timeout() {
        "Timeout".to_string()
    } else {
        e.to_string()
    }
}

/// Visible text of an HTML page plus its `<title>`.
///
/// Text nodes under script/style/noscript/template and the document head are
/// skipped. Entities come back decoded from the parser; whitespace is
/// collapsed and the result truncated to `max_chars` characters.
pub fn extract_visible_text(html: &str, max_chars: usize) -> (String, String) {
    static TITLE: Lazy<Selector> =
        Lazy::new(|| Selector::parse("title").expect("static selector"));

    let document = Html::parse_document(html);
    let title = document
        .select(&TITLE)
        .next()
        .map(|el| collapse(&el.text().collect::<String>()))
        .unwrap_or_default();

    let pieces: Vec<&str> = document
        .root_element()
        .descendants()
        .filter(|node| {
            !node
                .ancestors()
                .filter_map(|a| a.value().as_element())
                .any(|el| HIDDEN_ELEMENTS.contains(&el.name()))
        })
        .filter_map(|node| node.value().as_text().map(|t| &**t))
        .collect();

    let mut text = collapse(&pieces.join(" "));
    if text.chars().count() > max_chars {
        text = text.chars().take(max_chars).collect();
    }
    (title, text)
}

const HIDDEN_ELEMENTS: &[&str] = &["head", "script", "style", "noscript", "template", "title"];

fn collapse(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}
