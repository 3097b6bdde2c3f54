// src/report/mod.rs
//! Map-reduce report pipeline: per-source analysis, three-bullet summary,
//! one action item.

pub mod action;
pub mod generator;
pub mod map;
pub mod reduce;

use serde::{Deserialize, Serialize};

use crate::sanitize::Viewpoint;

pub use action::synthesize_action;
pub use generator::{NoopProgress, ProgressSink, ReportGenerator};
pub use map::map_sources;
pub use reduce::{extract_bullets, reduce_summary};

/// Input source. Identity is the URL; duplicates are kept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceRef {
    pub url: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisStatus {
    Success,
    Failed,
}

/// Map-phase output for one source.
///
/// Built only through `success`/`failed`, so a success always carries a
/// non-empty analysis and no error, and a failure never carries an analysis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceAnalysis {
    pub url: String,
    pub analysis: Option<String>,
    pub status: AnalysisStatus,
    pub error: Option<String>,
}

impl SourceAnalysis {
    pub fn success(url: impl Into<String>, analysis: String) -> Self {
        let url = url.into();
        if analysis.trim().is_empty() {
            return Self::failed(url, "Empty analysis");
        }
        Self {
            url,
            analysis: Some(analysis),
            status: AnalysisStatus::Success,
            error: None,
        }
    }

    pub fn failed(url: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            analysis: None,
            status: AnalysisStatus::Failed,
            error: Some(error.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == AnalysisStatus::Success
    }
}

/// Exactly three bullets; any other count is clamped on construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutiveSummary {
    pub bullets: [String; 3],
}

impl ExecutiveSummary {
    /// Truncate to the first three, or pad with empty strings.
    pub fn clamp(bullets: Vec<String>) -> Self {
        let mut it = bullets.into_iter();
        let mut next = || it.next().unwrap_or_default();
        Self {
            bullets: [next(), next(), next()],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionItem {
    pub text: String,
    pub perspective: Viewpoint,
}

/// Final pipeline output. `sources` is index-aligned with the input sources.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportResult {
    pub summary: ExecutiveSummary,
    pub sources: Vec<SourceAnalysis>,
    pub action_item: ActionItem,
}

impl ReportResult {
    pub fn success_count(&self) -> usize {
        self.sources.iter().filter(|s| s.is_success()).count()
    }
}
