// src/prompts.rs
//! Prompt assembly for the map, reduce, self-correction and action phases.
//! Every prompt carries the viewpoint modifier and the keyword list.

use crate::report::SourceAnalysis;
use crate::sanitize::Viewpoint;

const MAP_BASE: &str = "You are an expert web content analyst. Analyze the content of the given URL \
and extract the key information according to the user's keywords and viewpoint.";

const REDUCE_BASE: &str = "You are an expert at integrating analyses from multiple sources. \
Combine the individual analyses into an Executive Summary. \
Summarize in exactly 3 bullet points.";

pub fn viewpoint_modifier(viewpoint: Viewpoint) -> &'static str {
    match viewpoint {
        Viewpoint::Critical => {
            "You are a critical analyst. Examine the information carefully and clearly point out \
potential problems, contradictions, or areas that need improvement. Do not be swayed by \
exaggeration or promotion; keep a critical, fact-based perspective."
        }
        Viewpoint::Investor => {
            "You are an analyst with an investor's perspective. Focus on financial impact, market \
trends, risks and opportunities. Evaluate ROI, growth potential and competitive advantage."
        }
        Viewpoint::Beginner => {
            "You are an explainer for beginners. Avoid jargon and use plain, easy language. Explain \
step by step so that someone without background knowledge can follow, and define key concepts \
clearly."
        }
        Viewpoint::Fact => {
            "You are an objective, fact-focused analyst. Concentrate on verifiable facts and data \
rather than speculation or opinion. Cite sources and separate claims from facts."
        }
    }
}

fn keyword_list(keywords: &[String]) -> String {
    keywords.join(", ")
}

pub fn build_map_prompt(keywords: &[String], viewpoint: Viewpoint) -> String {
    format!(
        "{MAP_BASE}

{modifier}

**Analysis guidelines:**
- Focus on these keywords: {keywords}
- Summarize the core content of the source
- Derive insights that fit the user's viewpoint
- Cite the source URL

**Output format:**
- A concise, clear analysis (200-300 characters)
- Center on content related to the keywords
",
        modifier = viewpoint_modifier(viewpoint),
        keywords = keyword_list(keywords),
    )
}

/// User turn of the map phase for one fetched page.
pub fn build_map_input(url: &str, title: &str, content: &str) -> String {
    let title = if title.trim().is_empty() { "N/A" } else { title };
    format!("URL: {url}\n\nTitle: {title}\n\nContent:\n{content}")
}

pub fn build_reduce_prompt(keywords: &[String], viewpoint: Viewpoint) -> String {
    format!(
        "{REDUCE_BASE}

{modifier}

**Synthesis guidelines:**
- Focus on these keywords: {keywords}
- Combine the analyses of all sources
- Find common patterns and important differences
- Derive final insights that fit the user's viewpoint

**Output format:**
- Write exactly 3 bullet points
- Each bullet point must be independent and clear
- Each bullet point is 50-100 characters long
- Cite sources as [Source: URL]

**Constraints:**
- Do not write more or fewer than 3 bullet points
- Each bullet point must carry a key insight
",
        modifier = viewpoint_modifier(viewpoint),
        keywords = keyword_list(keywords),
    )
}

pub fn build_correction_prompt(bullets: &[String], keywords: &[String], viewpoint: Viewpoint) -> String {
    let current = bullets
        .iter()
        .map(|b| format!("- {b}"))
        .collect::<Vec<_>>()
        .join("\n");
    format!(
        "Condense the following summary into exactly 3 bullet points.
Each bullet point must carry a key insight.

Current summary:
{current}

Viewpoint: {viewpoint}
Keywords: {keywords}

**Requirements:**
- Write exactly 3 bullet points, no more, no fewer
- Each bullet point is 50-100 characters long
- Include only key insights
- Write plain text only, one bullet per line, without numbers or bullet markers
",
        keywords = keyword_list(keywords),
    )
}

pub fn build_action_prompt(keywords: &[String], viewpoint: Viewpoint) -> String {
    format!(
        "You are a strategy advisor. Based on the analysis results, give the user a concrete \
recommendation for action.

{modifier}

**Recommendation guidelines:**
- Recommend actions related to these keywords: {keywords}
- Build on the insights derived from the analyses
- Make the recommendation concrete and actionable
- Fit the recommendation to the user's viewpoint

**Output format:**
- A concrete recommendation of 100-200 characters
- Structure it as what to do, what to consider, and what to watch out for
",
        modifier = viewpoint_modifier(viewpoint),
        keywords = keyword_list(keywords),
    )
}

/// `[Source: URL]\n<analysis>` blocks joined by a blank line.
pub fn combine_analyses(analyses: &[&SourceAnalysis]) -> String {
    analyses
        .iter()
        .filter_map(|sa| {
            sa.analysis
                .as_deref()
                .map(|text| format!("[Source: {}]\n{}", sa.url, text))
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}
