// src/report/action.rs
use super::{ActionItem, SourceAnalysis};
use crate::error::{ReportError, Result};
use crate::llm::{ChatMessage, ProviderStrategy};
use crate::prompts::{build_action_prompt, combine_analyses};
use crate::sanitize::Viewpoint;

/// One free-form recommendation from the successful analyses. The text is
/// only trimmed, never parsed.
pub async fn synthesize_action(
    strategy: &ProviderStrategy,
    successes: &[&SourceAnalysis],
    keywords: &[String],
    viewpoint: Viewpoint,
) -> Result<ActionItem> {
    if successes.is_empty() {
        return Err(ReportError::NoValidSources);
    }

    let messages = [
        ChatMessage::system(build_action_prompt(keywords, viewpoint)),
        ChatMessage::user(format!("Analysis results:\n\n{}", combine_analyses(successes))),
    ];
    let text = strategy.invoke_with_fallback(&messages).await?;

    Ok(ActionItem {
        text: text.trim().to_string(),
        perspective: viewpoint,
    })
}
