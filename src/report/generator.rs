// src/report/generator.rs
//! Pipeline orchestrator: sanitize → fetch → map → reduce → action.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

use super::{map_sources, reduce_summary, synthesize_action, ReportResult, SourceAnalysis, SourceRef};
use crate::config::AppConfig;
use crate::crawl::{fetch_all, Crawler, Fetcher};
use crate::error::{ReportError, Result};
use crate::jobs::JobStatus;
use crate::llm::ProviderStrategy;
use crate::sanitize::{sanitize_keywords, sanitize_viewpoint};

/// Receives the non-terminal status at each stage boundary.
#[async_trait]
pub trait ProgressSink: Send + Sync {
    async fn enter(&self, status: JobStatus) -> Result<()>;
}

pub struct NoopProgress;

#[async_trait]
impl ProgressSink for NoopProgress {
    async fn enter(&self, _status: JobStatus) -> Result<()> {
        Ok(())
    }
}

pub struct ReportGenerator {
    strategy: Arc<ProviderStrategy>,
    fetcher: Arc<dyn Fetcher>,
}

impl ReportGenerator {
    pub fn new(strategy: Arc<ProviderStrategy>, fetcher: Arc<dyn Fetcher>) -> Self {
        Self { strategy, fetcher }
    }

    /// Production wiring: configured model backends and crawler.
    pub fn from_config(cfg: &AppConfig) -> anyhow::Result<Self> {
        let strategy = ProviderStrategy::from_config(&cfg.llm)?;
        let fetcher = Crawler::from_config(&cfg.crawl)?;
        Ok(Self::new(Arc::new(strategy), Arc::new(fetcher)))
    }

    /// Run the whole pipeline for one job.
    ///
    /// Invalid keywords or viewpoint fail before `collecting` is entered. When
    /// no source survives the map phase the run fails with `NoValidSources`
    /// and neither reduce nor action is invoked.
    pub async fn generate(
        &self,
        sources: &[SourceRef],
        keywords: &[String],
        viewpoint: &str,
        progress: &dyn ProgressSink,
    ) -> Result<ReportResult> {
        let keywords = sanitize_keywords(keywords)?;
        let viewpoint = sanitize_viewpoint(viewpoint)?;
        info!(
            sources = sources.len(),
            keywords = ?keywords,
            %viewpoint,
            "generating report"
        );

        progress.enter(JobStatus::Collecting).await?;
        let t0 = Instant::now();
        let urls: Vec<&str> = sources.iter().map(|s| s.url.as_str()).collect();
        let fetched = fetch_all(self.fetcher.as_ref(), &urls).await;
        info!(
            ok = fetched.iter().filter(|f| f.is_success()).count(),
            total = fetched.len(),
            ms = t0.elapsed().as_millis() as u64,
            "fetch complete"
        );

        progress.enter(JobStatus::Analyzing).await?;
        let analyses = map_sources(&self.strategy, &fetched, &keywords, viewpoint).await;
        let successes: Vec<&SourceAnalysis> = analyses.iter().filter(|a| a.is_success()).collect();
        if successes.is_empty() {
            return Err(ReportError::NoValidSources);
        }
        info!(ok = successes.len(), total = analyses.len(), "map phase complete");

        let summary = reduce_summary(&self.strategy, &successes, &keywords, viewpoint).await?;

        progress.enter(JobStatus::Synthesizing).await?;
        let action_item = synthesize_action(&self.strategy, &successes, &keywords, viewpoint).await?;

        Ok(ReportResult {
            summary,
            sources: analyses,
            action_item,
        })
    }
}
