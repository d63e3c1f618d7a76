//! Assembly of the outward-facing analysis response.
//!
//! A completion that reads as an [`AnalysisResult`] is returned structured.
//! Anything else is passed through verbatim as [`Analysis::Raw`] with a
//! successful status, whatever the reason the parse failed.

use crate::stats::RepositoryStats;
use serde::{Deserialize, Serialize};
use serde_json::Number;
use tracing::warn;

/// Structured quality assessment produced by the LLM
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// Score in `[0, 100]`, kept exactly as the model wrote it
    pub score: Number,
    /// Short summary
    pub summary: String,
    /// Ordered improvement steps
    pub roadmap: Vec<String>,
}

impl AnalysisResult {
    /// Score as a float
    pub fn score_value(&self) -> Option<f64> {
        self.score.as_f64()
    }

    fn has_valid_score(&self) -> bool {
        self.score_value()
            .map_or(false, |score| (0.0..=100.0).contains(&score))
    }
}

/// The `analysis` field of a response: parsed, or the raw completion in degraded mode
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Analysis {
    /// The completion matched the expected JSON shape
    Parsed(AnalysisResult),
    /// The completion could not be read as an analysis
    Raw(String),
}

impl Analysis {
    /// Whether the completion had to be passed through unparsed
    pub fn is_degraded(&self) -> bool {
        matches!(self, Self::Raw(_))
    }
}

/// Response body returned for a successful analysis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResponse {
    /// Repository URL as supplied by the caller
    pub repo: String,
    /// Statistics the assessment was based on
    pub stats: RepositoryStats,
    /// The assessment
    pub analysis: Analysis,
}

/// Combines the repository, its stats and the raw completion into a response
pub fn assemble(repo_url: &str, stats: RepositoryStats, raw_completion: String) -> AnalysisResponse {
    let analysis = match parse_analysis(&raw_completion) {
        Some(result) => Analysis::Parsed(result),
        None => {
            warn!(repo = repo_url, "LLM reply is not a valid analysis, returning it raw");
            Analysis::Raw(raw_completion)
        }
    };

    AnalysisResponse {
        repo: repo_url.to_string(),
        stats,
        analysis,
    }
}

/// Reads an [`AnalysisResult`] out of a completion.
///
/// Tries the whole trimmed text, then a fenced ```json block, then the span from
/// the first `{` to the last `}`. Results with an out-of-range score are rejected.
pub fn parse_analysis(raw: &str) -> Option<AnalysisResult> {
    let trimmed = raw.trim();
    [
        Some(trimmed),
        fenced_block(trimmed),
        brace_span(trimmed),
    ]
    .into_iter()
    .flatten()
    .filter_map(|candidate| serde_json::from_str::<AnalysisResult>(candidate).ok())
    .find(AnalysisResult::has_valid_score)
}

fn fenced_block(text: &str) -> Option<&str> {
    let start = text.find("```")?;
    let after_fence = &text[start + 3..];
    let body_start = after_fence.find('\n')? + 1;
    let body = &after_fence[body_start..];
    let end = body.find("```")?;
    Some(body[..end].trim())
}

fn brace_span(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}
