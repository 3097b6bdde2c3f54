// src/sanitize.rs
//! Keyword and viewpoint validation applied before any prompt is built.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{ReportError, Result};

/// Analytical persona applied to every prompt of a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Viewpoint {
    Critical,
    Investor,
    Beginner,
    Fact,
}

impl Viewpoint {
    pub const ALL: [Viewpoint; 4] = [
        Viewpoint::Critical,
        Viewpoint::Investor,
        Viewpoint::Beginner,
        Viewpoint::Fact,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Viewpoint::Critical => "critical",
            Viewpoint::Investor => "investor",
            Viewpoint::Beginner => "beginner",
            Viewpoint::Fact => "fact",
        }
    }
}

impl fmt::Display for Viewpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Viewpoint {
    type Err = ReportError;

    /// Exact match only: "Critical" or " fact" are rejected.
    fn from_str(s: &str) -> Result<Self> {
        Viewpoint::ALL
            .into_iter()
            .find(|v| v.as_str() == s)
            .ok_or_else(|| {
                ReportError::InvalidInput(format!(
                    "invalid viewpoint: {s:?}, must be one of critical, investor, beginner, fact"
                ))
            })
    }
}

// Role-declaration and instruction-override signatures, matched case-insensitively.
static INJECTION_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"system\s*:",
        r"user\s*:",
        r"assistant\s*:",
        r"ignore\s+previous",
        r"forget\s+all",
        r"you\s+are\s+now",
        r"act\s+as",
        r"pretend\s+to\s+be",
    ]
    .iter()
    .map(|p| Regex::new(&format!("(?i){p}")).expect("injection pattern"))
    .collect()
});

// Word characters (Unicode, incl. Hangul), whitespace and . , ! ? -
static DISALLOWED_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^\w\s가-힣.,!?\-]").expect("allow-list regex"));

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("whitespace regex"));

/// Reject keywords carrying prompt-injection signatures, then clean the rest.
///
/// Order is preserved and duplicates are kept. Keywords that are empty after
/// cleaning are dropped silently.
pub fn sanitize_keywords<S: AsRef<str>>(keywords: &[S]) -> Result<Vec<String>> {
    let mut out = Vec::with_capacity(keywords.len());
    for raw in keywords {
        let raw = raw.as_ref();
        if raw.trim().is_empty() {
            continue;
        }
        if INJECTION_PATTERNS.iter().any(|re| re.is_match(raw)) {
            tracing::warn!(keyword = %raw, "keyword rejected by injection filter");
            return Err(ReportError::InvalidInput(format!(
                "keyword contains potentially dangerous pattern: {raw}"
            )));
        }
        let stripped = DISALLOWED_CHARS.replace_all(raw, "");
        let cleaned = WHITESPACE.replace_all(stripped.trim(), " ").to_string();
        if !cleaned.is_empty() {
            out.push(cleaned);
        }
    }
    Ok(out)
}

pub fn sanitize_viewpoint(viewpoint: &str) -> Result<Viewpoint> {
    viewpoint.parse()
}
