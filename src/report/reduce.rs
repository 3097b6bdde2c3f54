// src/report/reduce.rs
//! Reduce phase: merge successful analyses into an executive summary of
//! exactly three bullets.
//!
//! Cardinality is enforced twice: the prompt asks for three, and whatever comes
//! back is clamped by `ExecutiveSummary::clamp` after at most one correction
//! round trip.

use metrics::counter;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{info, warn};

use super::{ExecutiveSummary, SourceAnalysis};
use crate::error::{ReportError, Result};
use crate::llm::{ChatMessage, ProviderStrategy};
use crate::prompts::{build_correction_prompt, build_reduce_prompt, combine_analyses};
use crate::sanitize::Viewpoint;

const REQUIRED_BULLETS: usize = 3;
/// Shortest bullet kept, in characters; exactly ten survives.
const MIN_BULLET_CHARS: usize = 10;
const MAX_CANDIDATES: usize = 10;

static DASH_MARKER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*[-•*]\s*(.+)$").unwrap());
static NUMBER_MARKER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*\d+[.)]\s*(.+)$").unwrap());
static STRIP_DASH: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[-•*]\s*").unwrap());
static STRIP_NUMBER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d+[.)]\s*").unwrap());

fn marker_matches(text: &str, re: &Regex) -> Vec<String> {
    text.lines()
        .filter_map(|line| re.captures(line))
        .filter_map(|c| c.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Candidate bullets from raw model output.
///
/// Cascade: dash/dot/star markers, then numeric markers, each used only when
/// it yields at least three items; otherwise one candidate per non-empty line.
/// Markers are stripped, items under ten characters dropped, at most ten kept.
pub fn extract_bullets(text: &str) -> Vec<String> {
    let candidates = [&*DASH_MARKER, &*NUMBER_MARKER]
        .into_iter()
        .map(|re| marker_matches(text, re))
        .find(|m| m.len() >= REQUIRED_BULLETS)
        .unwrap_or_else(|| {
            text.lines()
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .map(str::to_string)
                .collect()
        });

    candidates
        .into_iter()
        .map(|b| {
            let b = STRIP_DASH.replace(&b, "");
            STRIP_NUMBER.replace(&b, "").trim().to_string()
        })
        .filter(|b| b.chars().count() >= MIN_BULLET_CHARS)
        .take(MAX_CANDIDATES)
        .collect()
}

/// Summarize the successful analyses. Fails with `NoValidSources` on empty input.
pub async fn reduce_summary(
    strategy: &ProviderStrategy,
    successes: &[&SourceAnalysis],
    keywords: &[String],
    viewpoint: Viewpoint,
) -> Result<ExecutiveSummary> {
    if successes.is_empty() {
        return Err(ReportError::NoValidSources);
    }

    let messages = [
        ChatMessage::system(build_reduce_prompt(keywords, viewpoint)),
        ChatMessage::user(combine_analyses(successes)),
    ];
    let raw = strategy.invoke_with_fallback(&messages).await?;
    let mut bullets = extract_bullets(&raw);

    if bullets.len() != REQUIRED_BULLETS {
        info!(found = bullets.len(), "summary needs self-correction");
        counter!("report_self_correction_total").increment(1);
        bullets = self_correct(strategy, &bullets, keywords, viewpoint).await?;
    }

    Ok(ExecutiveSummary::clamp(bullets))
}

/// One correction round trip; the caller clamps whatever comes back.
async fn self_correct(
    strategy: &ProviderStrategy,
    bullets: &[String],
    keywords: &[String],
    viewpoint: Viewpoint,
) -> Result<Vec<String>> {
    let messages = [ChatMessage::system(build_correction_prompt(
        bullets, keywords, viewpoint,
    ))];
    let corrected = strategy.invoke_with_fallback(&messages).await?;
    let out = extract_bullets(&corrected);
    if out.len() < REQUIRED_BULLETS {
        warn!(found = out.len(), "corrected summary still short, padding with empty bullets");
    }
    Ok(out)
}
