use super::{ContentEntry, FileListing, SourceAcquirer};
use crate::config::GitHubSettings;
use crate::error::{AnalyzerError, Result};
use crate::repository::RepositoryReference;
use async_trait::async_trait;
use reqwest::{header, Client, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info, warn};

const USER_AGENT: &str = concat!("repomentor/", env!("CARGO_PKG_VERSION"));
const GITHUB_ACCEPT: &str = "application/vnd.github+json";

/// Lists the repository root through the GitHub REST API
///
/// Only the root directory is inspected, so counts are shallower than those of
/// [`CloneAcquirer`](super::CloneAcquirer).
#[derive(Clone)]
pub struct GitHubListingAcquirer {
    client: Client,
    api_base: String,
    token: Option<String>,
    timeout: Duration,
}

impl GitHubListingAcquirer {
    /// Creates a listing acquirer with appropriate headers
    pub fn new(settings: &GitHubSettings) -> Result<Self> {
        let mut headers = header::HeaderMap::new();
        headers.insert(header::USER_AGENT, header::HeaderValue::from_static(USER_AGENT));
        headers.insert(header::ACCEPT, header::HeaderValue::from_static(GITHUB_ACCEPT));

        let client = Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| AnalyzerError::Internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_base: settings.api_base.trim_end_matches('/').to_string(),
            token: settings.token.clone(),
            timeout: settings.timeout,
        })
    }

    fn repo_url(&self, reference: &RepositoryReference) -> String {
        format!("{}/repos/{}/{}", self.api_base, reference.owner(), reference.name())
    }

    /// Fetches the repository metadata; a 404 here means the repository does not exist
    async fn fetch_repo_info(&self, reference: &RepositoryReference) -> Result<Value> {
        let url = self.repo_url(reference);
        let (status, body) = self.get(&url).await?;

        if status == StatusCode::NOT_FOUND {
            info!(repo = %reference, "Repository not found");
            return Err(AnalyzerError::NotFound("Repository not found".to_string()));
        }
        Self::decode(status, &body, "repository metadata")
    }

    /// Fetches the root directory listing
    async fn fetch_root_contents(&self, reference: &RepositoryReference) -> Result<Vec<ContentEntry>> {
        let url = format!("{}/contents", self.repo_url(reference));
        let (status, body) = self.get(&url).await?;
        Self::decode(status, &body, "root listing")
    }

    async fn get(&self, url: &str) -> Result<(StatusCode, String)> {
        let mut request = self.client.get(url);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let exchange = async {
            let response = request.send().await?;
            let status = response.status();
            let body = response.text().await?;
            Ok::<_, reqwest::Error>((status, body))
        };

        match tokio::time::timeout(self.timeout, exchange).await {
            Ok(Ok((status, body))) => {
                debug!(url, status = status.as_u16(), "GitHub API response");
                Ok((status, body))
            }
            Ok(Err(e)) if e.is_timeout() => Err(AnalyzerError::Timeout(format!("GET {}", url))),
            Ok(Err(e)) => {
                warn!(url, "GitHub API request failed: {}", e);
                Err(AnalyzerError::HostingProvider(format!(
                    "request to repository host failed: {}",
                    e.without_url()
                )))
            }
            Err(_) => Err(AnalyzerError::Timeout(format!(
                "GET {} exceeded {:?}",
                url, self.timeout
            ))),
        }
    }

    fn decode<T: DeserializeOwned>(status: StatusCode, body: &str, what: &str) -> Result<T> {
        if !status.is_success() {
            return Err(AnalyzerError::HostingProvider(format!(
                "failed to fetch {}: HTTP {}",
                what, status
            )));
        }
        serde_json::from_str(body).map_err(|e| {
            AnalyzerError::HostingProvider(format!("malformed {} response: {}", what, e))
        })
    }
}

#[async_trait]
impl SourceAcquirer for GitHubListingAcquirer {
    fn name(&self) -> &'static str {
        "remote"
    }

    async fn acquire(&self, reference: &RepositoryReference) -> Result<FileListing> {
        info!(repo = %reference, "Listing repository root");
        self.fetch_repo_info(reference).await?;
        let entries = self.fetch_root_contents(reference).await?;
        debug!(repo = %reference, entries = entries.len(), "Root listing fetched");
        Ok(FileListing::RemoteListing { entries })
    }
}
