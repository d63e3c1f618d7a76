use crate::stats::RepositoryStats;

/// Template for the repository quality assessment
pub const REPOSITORY_ANALYSIS: &str = r#"
You are an AI coding mentor.

Analyze the GitHub repository and produce:
1. Score out of 100
2. Short honest summary
3. Actionable improvement roadmap

Repository URL:
{repo_url}

Repository stats:
- Total files: {files}
- README present: {has_readme}
- Tests present: {has_tests}

Respond ONLY with a valid JSON object in this exact format, with no text before or after it:
{
  "score": 0-100,
  "summary": "string",
  "roadmap": ["item1", "item2", "item3"]
}
"#;

/// Minimal prompt used to check that the completion backend answers
pub const CONNECTIVITY_CHECK: &str = r#"Reply with exactly this JSON and nothing else: {"status": "working"}"#;

/// Renders the analysis prompt for a repository.
///
/// Pure and deterministic: the same URL and stats always yield the same text.
pub fn build_analysis_prompt(repo_url: &str, stats: &RepositoryStats) -> String {
    // The URL goes in last so placeholder-like text inside it is left alone.
    REPOSITORY_ANALYSIS
        .replace("{files}", &stats.files.to_string())
        .replace("{has_readme}", yes_no(stats.has_readme))
        .replace("{has_tests}", yes_no(stats.has_tests))
        .replace("{repo_url}", repo_url)
}

fn yes_no(value: bool) -> &'static str {
    if value { "yes" } else { "no" }
}
