// src/crawl/mock.rs
//! Fixed-response fetcher for tests and offline runs.

use async_trait::async_trait;
use std::collections::HashMap;
use std::time::Duration;

use super::{FetchResult, Fetcher};

#[derive(Debug, Clone)]
enum Page {
    Ok { title: String, content: String },
    Err(String),
}

/// Serves canned pages by URL. Unknown URLs fail with "HTTP 404".
#[derive(Debug, Clone, Default)]
pub struct StaticFetcher {
    pages: HashMap<String, (Page, Option<Duration>)>,
}

impl StaticFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(mut self, url: &str, title: &str, content: &str) -> Self {
        let page = Page::Ok {
            title: title.to_string(),
            content: content.to_string(),
        };
        self.pages.insert(url.to_string(), (page, None));
        self
    }

    pub fn failing(mut self, url: &str, error: &str) -> Self {
        self.pages
            .insert(url.to_string(), (Page::Err(error.to_string()), None));
        self
    }

    /// Delay the response for `url`, which must already be registered.
    pub fn delayed(mut self, url: &str, delay: Duration) -> Self {
        if let Some(entry) = self.pages.get_mut(url) {
            entry.1 = Some(delay);
        }
        self
    }
}

#[async_trait]
impl Fetcher for StaticFetcher {
    async fn fetch(&self, url: &str) -> FetchResult {
        let Some((page, delay)) = self.pages.get(url) else {
            return FetchResult::failed(url, "HTTP 404");
        };
        if let Some(d) = delay {
            tokio::time::sleep(*d).await;
        }
        match page {
            Page::Ok { title, content } => FetchResult::success(url, content.clone(), title.clone()),
            Page::Err(e) => FetchResult::failed(url, e.clone()),
        }
    }

    fn name(&self) -> &'static str {
        "static"
    }
}
