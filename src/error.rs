use std::io;
use thiserror::Error;

/// Custom result type alias for the application
pub type Result<T> = std::result::Result<T, AnalyzerError>;

/// Errors that can occur while analyzing a repository
#[derive(Debug, Error)]
pub enum AnalyzerError {
    /// Missing or malformed request body or repository identifier
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The repository does not exist or is not visible to us
    #[error("{0}")]
    NotFound(String),

    /// Cloning or listing the repository failed for a reason other than not-found
    #[error("Acquisition error: {0}")]
    Acquisition(String),

    /// The hosting provider answered the listing requests with an error or a malformed body
    #[error("Hosting provider error: {0}")]
    HostingProvider(String),

    /// The LLM provider call failed
    #[error("Upstream error: {message}")]
    Upstream {
        /// Summarized, secret-free description of the failure
        message: String,
        /// Whether a retry could plausibly succeed (rate limit, 5xx, transport)
        transient: bool,
    },

    /// A bounded outbound call exceeded its deadline
    #[error("Timed out: {0}")]
    Timeout(String),

    /// Configuration errors
    #[error("Config error: {0}")]
    Config(String),

    /// Any other unexpected failure
    #[error("Internal error: {0}")]
    Internal(String),

    /// I/O errors
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON parsing/serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Directory traversal errors
    #[error("Walkdir error: {0}")]
    Walkdir(#[from] walkdir::Error),
}

impl AnalyzerError {
    /// Creates a non-transient upstream error
    pub fn upstream(message: impl Into<String>) -> Self {
        Self::Upstream {
            message: message.into(),
            transient: false,
        }
    }

    /// Creates an upstream error that is worth retrying
    pub fn transient_upstream(message: impl Into<String>) -> Self {
        Self::Upstream {
            message: message.into(),
            transient: true,
        }
    }

    /// Checks if this error is transient and retryable
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Timeout(_) => true,
            Self::Upstream { transient, .. } => *transient,
            _ => false,
        }
    }

    /// Checks if this error was raised while acquiring the repository
    pub fn is_acquisition(&self) -> bool {
        matches!(
            self,
            Self::NotFound(_) | Self::Acquisition(_) | Self::HostingProvider(_)
        )
    }

    /// HTTP status code this error maps to at the request boundary
    pub fn status_code(&self) -> u16 {
        match self {
            Self::InvalidInput(_) => 400,
            Self::NotFound(_) => 404,
            Self::Upstream { .. } | Self::HostingProvider(_) => 502,
            Self::Timeout(_) => 504,
            Self::Acquisition(_)
            | Self::Config(_)
            | Self::Internal(_)
            | Self::Io(_)
            | Self::Json(_)
            | Self::Walkdir(_) => 500,
        }
    }

    /// Message that is safe to return to a client.
    ///
    /// Internal failures are collapsed into a generic message; their detail only goes to the log.
    pub fn public_message(&self) -> String {
        match self {
            Self::InvalidInput(msg) | Self::NotFound(msg) => msg.clone(),
            Self::Acquisition(msg) => format!("Failed to acquire repository: {}", msg),
            Self::HostingProvider(msg) => format!("Repository host error: {}", msg),
            Self::Upstream { message, .. } => format!("LLM provider error: {}", message),
            Self::Timeout(msg) => format!("Timed out: {}", msg),
            Self::Config(_) | Self::Internal(_) | Self::Io(_) | Self::Json(_) | Self::Walkdir(_) => {
                "Internal server error".to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(AnalyzerError::InvalidInput("x".into()), 400)]
    #[test_case(AnalyzerError::NotFound("Repository not found".into()), 404)]
    #[test_case(AnalyzerError::Acquisition("clone failed".into()), 500)]
    #[test_case(AnalyzerError::HostingProvider("HTTP 500".into()), 502)]
    #[test_case(AnalyzerError::upstream("HTTP 401"), 502)]
    #[test_case(AnalyzerError::Timeout("clone".into()), 504)]
    #[test_case(AnalyzerError::Internal("boom".into()), 500)]
    fn test_status_mapping(error: AnalyzerError, status: u16) {
        assert_eq!(error.status_code(), status);
    }

    #[test]
    fn test_is_transient() {
        assert!(AnalyzerError::transient_upstream("HTTP 429").is_transient());
        assert!(AnalyzerError::Timeout("llm".into()).is_transient());
        assert!(!AnalyzerError::upstream("HTTP 401").is_transient());
        assert!(!AnalyzerError::Acquisition("exit 128".into()).is_transient());
    }

    #[test]
    fn test_internal_detail_is_not_public() {
        let error = AnalyzerError::Internal("/tmp/secret path".into());
        assert_eq!(error.public_message(), "Internal server error");

        let error = AnalyzerError::NotFound("Repository not found".into());
        assert_eq!(error.public_message(), "Repository not found");
    }
}
