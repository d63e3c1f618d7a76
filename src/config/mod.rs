mod env_manager;

use crate::error::{AnalyzerError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

pub use env_manager::{get_env_value, ApiKeys};

const DEFAULT_GITHUB_API_BASE: &str = "https://api.github.com";
const DEFAULT_BIND_ADDRESS: &str = "127.0.0.1:8000";

/// Main configuration struct for the application
///
/// Built once at startup and shared read-only by every request handler.
/// Values come from defaults, then an optional TOML file, then the environment.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// How repositories are acquired
    pub strategy: AcquisitionStrategy,
    /// LLM provider settings
    pub llm: LlmSettings,
    /// Hosting provider REST API settings (remote-listing strategy)
    pub github: GitHubSettings,
    /// Local clone settings (clone strategy)
    pub clone: CloneSettings,
    /// HTTP server settings
    pub server: ServerSettings,
}

/// Repository acquisition strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AcquisitionStrategy {
    /// List the root directory through the hosting provider's REST API
    #[default]
    Remote,
    /// Shallow-clone the repository and walk the full tree
    Clone,
}

/// Supported chat-completion providers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LlmProvider {
    /// OpenAI chat completions
    #[default]
    OpenAi,
    /// Groq's OpenAI-compatible endpoint
    Groq,
}

/// Settings for the LLM client
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmSettings {
    /// Provider whose defaults apply
    pub provider: LlmProvider,
    /// API key for the provider
    pub api_key: Option<String>,
    /// Model identifier; falls back to the provider default
    pub model: Option<String>,
    /// Base URL of the OpenAI-compatible API; falls back to the provider default
    pub base_url: Option<String>,
    /// Sampling temperature
    pub temperature: f32,
    /// Deadline for a single completion call
    #[serde(rename = "timeout_secs", with = "secs")]
    pub timeout: Duration,
    /// Total attempts for a completion, including the first one
    pub max_attempts: u32,
    /// Base delay between attempts, multiplied by the attempt number
    #[serde(rename = "retry_delay_ms", with = "millis")]
    pub retry_delay: Duration,
}

/// Settings for the hosting provider REST API
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GitHubSettings {
    /// API base URL
    pub api_base: String,
    /// Optional token, only used to lift the anonymous rate limit
    pub token: Option<String>,
    /// Deadline for each API request
    #[serde(rename = "timeout_secs", with = "secs")]
    pub timeout: Duration,
}

/// Settings for the clone strategy
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CloneSettings {
    /// Version-control client to invoke
    pub git_program: String,
    /// Deadline for the clone subprocess
    #[serde(rename = "timeout_secs", with = "secs")]
    pub timeout: Duration,
    /// Parent directory for scoped clone directories
    pub temp_dir: PathBuf,
}

/// Settings for the HTTP server
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    /// Address the server binds to
    pub bind_address: String,
}

impl Config {
    /// Loads configuration from defaults, an optional TOML file and the process environment
    ///
    /// The file is `path` if given, else `$REPOMENTOR_CONFIG`, else
    /// `<config_dir>/repomentor/config.toml` when it exists.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let file = match path {
            Some(path) => Some(path.to_path_buf()),
            None => get_env_value("REPOMENTOR_CONFIG")
                .map(PathBuf::from)
                .or_else(default_config_file),
        };
        Self::from_sources(file.as_deref(), get_env_value)
    }

    /// Builds configuration from an optional file and an arbitrary variable lookup
    pub fn from_sources<F>(file: Option<&Path>, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = match file {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env(lookup)?;
        Ok(config)
    }

    /// Parses a TOML configuration file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            AnalyzerError::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        toml::from_str(&content).map_err(|e| {
            AnalyzerError::Config(format!("Failed to parse {}: {}", path.display(), e))
        })
    }

    /// Applies environment overrides; empty values are ignored
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        if let Some(v) = get("ACQUISITION_STRATEGY") {
            self.strategy = parse_var("ACQUISITION_STRATEGY", &v)?;
        }
        if let Some(v) = get("LLM_PROVIDER") {
            self.llm.provider = parse_var("LLM_PROVIDER", &v)?;
        }

        let keys = ApiKeys::from_lookup(self.llm.provider, &get);
        if keys.llm_api_key.is_some() {
            self.llm.api_key = keys.llm_api_key;
        }
        if keys.github_token.is_some() {
            self.github.token = keys.github_token;
        }

        if let Some(v) = get("LLM_MODEL") {
            self.llm.model = Some(v);
        }
        if let Some(v) = get("LLM_BASE_URL") {
            self.llm.base_url = Some(v);
        }
        if let Some(v) = get("LLM_TEMPERATURE") {
            self.llm.temperature = parse_var("LLM_TEMPERATURE", &v)?;
        }
        if let Some(v) = get("LLM_TIMEOUT_SECS") {
            self.llm.timeout = Duration::from_secs(parse_var("LLM_TIMEOUT_SECS", &v)?);
        }
        if let Some(v) = get("LLM_MAX_ATTEMPTS") {
            self.llm.max_attempts = parse_var("LLM_MAX_ATTEMPTS", &v)?;
        }
        if let Some(v) = get("GITHUB_API_BASE_URL") {
            self.github.api_base = v;
        }
        if let Some(v) = get("GITHUB_TIMEOUT_SECS") {
            self.github.timeout = Duration::from_secs(parse_var("GITHUB_TIMEOUT_SECS", &v)?);
        }
        if let Some(v) = get("GIT_PROGRAM") {
            self.clone.git_program = v;
        }
        if let Some(v) = get("CLONE_TIMEOUT_SECS") {
            self.clone.timeout = Duration::from_secs(parse_var("CLONE_TIMEOUT_SECS", &v)?);
        }
        if let Some(v) = get("REPOMENTOR_TEMP_DIR") {
            self.clone.temp_dir = PathBuf::from(v);
        }
        if let Some(v) = get("BIND_ADDRESS") {
            self.server.bind_address = v;
        }
        Ok(())
    }

    /// Validates the configuration before the service starts accepting requests
    pub fn validate(&self) -> Result<()> {
        if self.llm.api_key.as_deref().map_or(true, |k| k.trim().is_empty()) {
            return Err(AnalyzerError::Config(format!(
                "No LLM API key configured (set LLM_API_KEY or {})",
                self.llm.provider.api_key_var()
            )));
        }
        if !(0.0..=2.0).contains(&self.llm.temperature) {
            return Err(AnalyzerError::Config(format!(
                "LLM temperature must be within 0.0..=2.0, got {}",
                self.llm.temperature
            )));
        }
        if self.llm.max_attempts == 0 {
            return Err(AnalyzerError::Config("llm.max_attempts must be at least 1".into()));
        }
        for (name, timeout) in [
            ("llm.timeout_secs", self.llm.timeout),
            ("github.timeout_secs", self.github.timeout),
            ("clone.timeout_secs", self.clone.timeout),
        ] {
            if timeout.is_zero() {
                return Err(AnalyzerError::Config(format!("{} must be positive", name)));
            }
        }
        Ok(())
    }
}

impl LlmSettings {
    /// Model identifier in effect
    pub fn model(&self) -> &str {
        self.model
            .as_deref()
            .unwrap_or_else(|| self.provider.default_model())
    }

    /// Base URL in effect, without a trailing slash
    pub fn base_url(&self) -> &str {
        self.base_url
            .as_deref()
            .unwrap_or_else(|| self.provider.default_base_url())
            .trim_end_matches('/')
    }
}

impl LlmProvider {
    /// Provider identifier used in logs and config
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OpenAi => "openai",
            Self::Groq => "groq",
        }
    }

    /// Default OpenAI-compatible base URL
    pub fn default_base_url(&self) -> &'static str {
        match self {
            Self::OpenAi => "https://api.openai.com/v1",
            Self::Groq => "https://api.groq.com/openai/v1",
        }
    }

    /// Default model identifier
    pub fn default_model(&self) -> &'static str {
        match self {
            Self::OpenAi => "gpt-4o-mini",
            Self::Groq => "llama3-8b-8192",
        }
    }

    /// Conventional environment variable holding the provider's key
    pub fn api_key_var(&self) -> &'static str {
        match self {
            Self::OpenAi => "OPENAI_API_KEY",
            Self::Groq => "GROQ_API_KEY",
        }
    }
}

impl AcquisitionStrategy {
    /// Strategy identifier used in logs and config
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Remote => "remote",
            Self::Clone => "clone",
        }
    }
}

impl fmt::Display for AcquisitionStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for LlmProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AcquisitionStrategy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "remote" | "api" | "github" => Ok(Self::Remote),
            "clone" | "git" => Ok(Self::Clone),
            other => Err(format!("unknown acquisition strategy '{}' (expected remote or clone)", other)),
        }
    }
}

impl FromStr for LlmProvider {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "openai" => Ok(Self::OpenAi),
            "groq" => Ok(Self::Groq),
            other => Err(format!("unknown LLM provider '{}' (expected openai or groq)", other)),
        }
    }
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            provider: LlmProvider::default(),
            api_key: None,
            model: None,
            base_url: None,
            temperature: 0.3,
            timeout: Duration::from_secs(60),
            max_attempts: 1,
            retry_delay: Duration::from_millis(500),
        }
    }
}

impl Default for GitHubSettings {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_GITHUB_API_BASE.to_string(),
            token: None,
            timeout: Duration::from_secs(15),
        }
    }
}

impl Default for CloneSettings {
    fn default() -> Self {
        Self {
            git_program: "git".to_string(),
            timeout: Duration::from_secs(60),
            temp_dir: std::env::temp_dir(),
        }
    }
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind_address: DEFAULT_BIND_ADDRESS.to_string(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            strategy: AcquisitionStrategy::default(),
            llm: LlmSettings::default(),
            github: GitHubSettings::default(),
            clone: CloneSettings::default(),
            server: ServerSettings::default(),
        }
    }
}

fn default_config_file() -> Option<PathBuf> {
    let path = dirs::config_dir()?.join("repomentor").join("config.toml");
    path.exists().then_some(path)
}

fn parse_var<T>(key: &str, value: &str) -> Result<T>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    value
        .parse()
        .map_err(|e| AnalyzerError::Config(format!("Invalid value for {}: {}", key, e)))
}

mod secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(value.as_secs_f64())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs).map_err(serde::de::Error::custom)
    }
}

mod millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_millis(u64::deserialize(deserializer)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.strategy, AcquisitionStrategy::Remote);
        assert_eq!(config.llm.model(), "gpt-4o-mini");
        assert_eq!(config.llm.base_url(), "https://api.openai.com/v1");
        assert_eq!(config.github.api_base, "https://api.github.com");
        assert_eq!(config.llm.max_attempts, 1);
        assert!(config.validate().is_err(), "no API key configured");
    }

    #[test]
    fn test_env_overrides() -> Result<()> {
        let config = Config::from_sources(
            None,
            lookup_from(&[
                ("ACQUISITION_STRATEGY", "clone"),
                ("LLM_PROVIDER", "groq"),
                ("GROQ_API_KEY", "gsk-test"),
                ("LLM_TIMEOUT_SECS", "5"),
                ("GITHUB_API_BASE_URL", "http://127.0.0.1:9999"),
                ("BIND_ADDRESS", ""),
            ]),
        )?;

        assert_eq!(config.strategy, AcquisitionStrategy::Clone);
        assert_eq!(config.llm.provider, LlmProvider::Groq);
        assert_eq!(config.llm.api_key.as_deref(), Some("gsk-test"));
        assert_eq!(config.llm.model(), "llama3-8b-8192");
        assert_eq!(config.llm.timeout, Duration::from_secs(5));
        assert_eq!(config.github.api_base, "http://127.0.0.1:9999");
        assert_eq!(config.server.bind_address, DEFAULT_BIND_ADDRESS);
        config.validate()
    }

    #[test]
    fn test_invalid_env_value() {
        let result = Config::from_sources(None, lookup_from(&[("LLM_MAX_ATTEMPTS", "many")]));
        assert!(matches!(result, Err(AnalyzerError::Config(_))));

        let result = Config::from_sources(None, lookup_from(&[("ACQUISITION_STRATEGY", "ftp")]));
        assert!(matches!(result, Err(AnalyzerError::Config(_))));
    }

    #[test]
    fn test_file_then_env() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let path = temp_dir.path().join("config.toml");
        fs::write(
            &path,
            r#"
strategy = "clone"

[llm]
api_key = "from-file"
model = "gpt-4o"
timeout_secs = 12.5

[clone]
git_program = "/usr/bin/git"
"#,
        )?;

        let config = Config::from_sources(Some(&path), lookup_from(&[("LLM_MODEL", "override")]))?;
        assert_eq!(config.strategy, AcquisitionStrategy::Clone);
        assert_eq!(config.llm.api_key.as_deref(), Some("from-file"));
        assert_eq!(config.llm.model(), "override");
        assert_eq!(config.llm.timeout, Duration::from_millis(12_500));
        assert_eq!(config.clone.git_program, "/usr/bin/git");
        assert_eq!(config.github.timeout, Duration::from_secs(15));
        Ok(())
    }

    #[test]
    fn test_validate_rejects_zero_values() {
        let mut config = Config::default();
        config.llm.api_key = Some("key".into());
        assert!(config.validate().is_ok());

        config.llm.max_attempts = 0;
        assert!(config.validate().is_err());

        config.llm.max_attempts = 1;
        config.clone.timeout = Duration::ZERO;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_base_url_trailing_slash() {
        let settings = LlmSettings {
            base_url: Some("http://localhost:1234/v1/".into()),
            ..LlmSettings::default()
        };
        assert_eq!(settings.base_url(), "http://localhost:1234/v1");
    }
}
