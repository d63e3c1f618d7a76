/// Normalize a user-provided repository identifier.
///
/// - Trims leading/trailing whitespace
/// - Strips surrounding single or double quotes if present
/// - Strips trailing slashes
pub fn normalize_repo_input(input: &str) -> &str {
    let trimmed = input.trim();

    let unquoted = if trimmed.len() >= 2
        && ((trimmed.starts_with('"') && trimmed.ends_with('"'))
            || (trimmed.starts_with('\'') && trimmed.ends_with('\'')))
    {
        trimmed[1..trimmed.len() - 1].trim()
    } else {
        trimmed
    };

    unquoted.trim_end_matches('/')
}
