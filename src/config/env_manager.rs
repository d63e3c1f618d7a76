use super::LlmProvider;

/// Credentials read from the environment at startup
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ApiKeys {
    /// Key for the selected LLM provider
    pub llm_api_key: Option<String>,
    /// GitHub token, used only to lift the anonymous rate limit
    pub github_token: Option<String>,
}

impl ApiKeys {
    /// Resolves keys through `lookup`.
    ///
    /// `LLM_API_KEY` wins; otherwise the provider's conventional variable
    /// (`OPENAI_API_KEY`, `GROQ_API_KEY`) is used.
    pub fn from_lookup<F>(provider: LlmProvider, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let llm_api_key = non_empty(lookup("LLM_API_KEY"))
            .or_else(|| non_empty(lookup(provider.api_key_var())));

        Self {
            llm_api_key,
            github_token: non_empty(lookup("GITHUB_TOKEN")),
        }
    }
}

/// Reads an environment variable, treating an empty value as unset
pub fn get_env_value(key: &str) -> Option<String> {
    non_empty(std::env::var(key).ok())
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
