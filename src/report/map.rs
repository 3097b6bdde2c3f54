// src/report/map.rs
//! Map phase: analyze every fetched source independently.

use futures::future::join_all;
use metrics::counter;
use tracing::{debug, warn};

use super::SourceAnalysis;
use crate::crawl::FetchResult;
use crate::llm::{ChatMessage, ProviderStrategy};
use crate::prompts::{build_map_input, build_map_prompt};
use crate::sanitize::Viewpoint;

const CRAWL_FAILED: &str = "Crawl failed";

/// One analysis per fetch result, same order, all sources run concurrently.
/// A failing source never affects its siblings.
pub async fn map_sources(
    strategy: &ProviderStrategy,
    fetched: &[FetchResult],
    keywords: &[String],
    viewpoint: Viewpoint,
) -> Vec<SourceAnalysis> {
    let prompt = build_map_prompt(keywords, viewpoint);
    let analyses = join_all(fetched.iter().map(|f| analyze_source(strategy, f, &prompt))).await;

    for sa in &analyses {
        let status = if sa.is_success() { "success" } else { "failed" };
        counter!("report_sources_total", "status" => status).increment(1);
    }
    analyses
}

async fn analyze_source(
    strategy: &ProviderStrategy,
    source: &FetchResult,
    prompt: &str,
) -> SourceAnalysis {
    if !source.is_success() || source.content.trim().is_empty() {
        let error = source.error.clone().unwrap_or_else(|| CRAWL_FAILED.to_string());
        debug!(url = %source.url, %error, "skipping analysis for failed fetch");
        return SourceAnalysis::failed(&source.url, error);
    }

    let messages = [
        ChatMessage::system(prompt),
        ChatMessage::user(build_map_input(&source.url, &source.title, &source.content)),
    ];
    match strategy.invoke_with_fallback(&messages).await {
        Ok(analysis) => SourceAnalysis::success(&source.url, analysis),
        Err(e) => {
            warn!(url = %source.url, error = %e, "source analysis failed");
            SourceAnalysis::failed(&source.url, e.to_string())
        }
    }
}
