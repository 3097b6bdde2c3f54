// src/crawl/types.rs
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FetchStatus {
    Success,
    Failed,
}

impl FetchStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            FetchStatus::Success => "success",
            FetchStatus::Failed => "failed",
        }
    }
}

/// Raw text for one source. On failure `content` and `title` are empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchResult {
    pub url: String,
    pub content: String,
    pub title: String,
    pub status: FetchStatus,
    pub error: Option<String>,
}

impl FetchResult {
    /// Empty content is not a success: it becomes a failure without detail.
    pub fn success(url: impl Into<String>, content: String, title: String) -> Self {
        if content.trim().is_empty() {
            return Self {
                url: url.into(),
                content: String::new(),
                title: String::new(),
                status: FetchStatus::Failed,
                error: None,
            };
        }
        Self {
            url: url.into(),
            content,
            title,
            status: FetchStatus::Success,
            error: None,
        }
    }

    pub fn failed(url: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            content: String::new(),
            title: String::new(),
            status: FetchStatus::Failed,
            error: Some(error.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == FetchStatus::Success
    }
}
