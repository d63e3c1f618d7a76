use crate::acquirers::{AcquirerFactory, SourceAcquirer};
use crate::analysis::{self, AnalysisResponse};
use crate::config::{AcquisitionStrategy, Config};
use crate::error::{AnalyzerError, Result};
use crate::llm::{self, LlmClient};
use crate::prompts;
use crate::repository::RepositoryReference;
use crate::stats::{self, RepositoryStats};
use std::sync::Arc;
use tracing::{info, info_span, Instrument};

/// Linear analysis pipeline: acquire, extract, prompt, complete, assemble
///
/// Built once at startup and shared by every request; it holds no per-request state.
pub struct AnalysisPipeline {
    acquirer: Arc<dyn SourceAcquirer>,
    llm: Arc<dyn LlmClient>,
}

impl AnalysisPipeline {
    /// Creates a pipeline from explicit components
    pub fn new(acquirer: Arc<dyn SourceAcquirer>, llm: Arc<dyn LlmClient>) -> Self {
        Self { acquirer, llm }
    }

    /// Creates a pipeline with the components selected by `config`
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self::new(
            AcquirerFactory::create(config)?,
            llm::create_client(&config.llm)?,
        ))
    }

    /// Same as [`from_config`](Self::from_config) with the acquisition strategy overridden
    pub fn with_strategy(config: &Config, strategy: AcquisitionStrategy) -> Result<Self> {
        Ok(Self::new(
            AcquirerFactory::create_for(strategy, config)?,
            llm::create_client(&config.llm)?,
        ))
    }

    /// Name of the acquisition strategy in use
    pub fn strategy(&self) -> &'static str {
        self.acquirer.name()
    }

    /// Identifier of the completion provider in use
    pub fn provider(&self) -> &'static str {
        self.llm.provider()
    }

    /// Analyzes one repository end to end
    pub async fn analyze(&self, repo_url: &str) -> Result<AnalysisResponse> {
        let reference = RepositoryReference::parse(repo_url)?;
        let request_id = uuid::Uuid::new_v4();
        let span = info_span!("analyze", %request_id, repo = %reference, strategy = self.strategy());

        async move {
            let stats = self.collect_stats(&reference).await?;
            info!(
                files = stats.files,
                has_readme = stats.has_readme,
                has_tests = stats.has_tests,
                "Repository stats collected"
            );

            let prompt = prompts::build_analysis_prompt(reference.url(), &stats);
            let completion = self.llm.complete(&prompt).await?;
            let response = analysis::assemble(reference.url(), stats, completion);
            info!(degraded = response.analysis.is_degraded(), "Analysis complete");
            Ok(response)
        }
        .instrument(span)
        .await
    }

    /// Sends the fixed connectivity prompt and returns the raw reply
    pub async fn check_completion_backend(&self) -> Result<String> {
        self.llm.complete(prompts::CONNECTIVITY_CHECK).await
    }

    async fn collect_stats(&self, reference: &RepositoryReference) -> Result<RepositoryStats> {
        let listing = self.acquirer.acquire(reference).await?;
        // Walking a checkout is blocking work; the listing (and any checkout
        // directory it owns) is dropped on the blocking thread once counted.
        tokio::task::spawn_blocking(move || stats::extract(&listing))
            .await
            .map_err(|e| AnalyzerError::Internal(format!("Statistics task failed: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::acquirers::{ContentEntry, FileListing, MockSourceAcquirer};
    use crate::analysis::Analysis;
    use crate::llm::MockLlmClient;
    use mockall::predicate::function;
    use std::fs;
    use tempfile::TempDir;

    fn remote_acquirer(names: &'static [&'static str]) -> MockSourceAcquirer {
        let mut acquirer = MockSourceAcquirer::new();
        acquirer.expect_name().return_const("remote");
        acquirer.expect_acquire().returning(move |_| {
            Ok(FileListing::RemoteListing {
                entries: names.iter().map(|n| ContentEntry::named(*n)).collect(),
            })
        });
        acquirer
    }

    #[tokio::test]
    async fn test_pipeline_passes_stats_to_prompt() {
        let mut llm = MockLlmClient::new();
        llm.expect_provider().return_const("mock");
        llm.expect_complete()
            .with(function(|prompt: &str| {
                prompt.contains("- Total files: 3") && prompt.contains("https://github.com/acme/widgets")
            }))
            .times(1)
            .returning(|_| Ok(r#"{"score": 70, "summary": "ok", "roadmap": ["a"]}"#.to_string()));

        let pipeline = AnalysisPipeline::new(
            Arc::new(remote_acquirer(&["README.md", "app.py", "test_app.py"])),
            Arc::new(llm),
        );
        let response = pipeline.analyze("https://github.com/acme/widgets/").await.unwrap();

        assert_eq!(response.repo, "https://github.com/acme/widgets");
        assert_eq!(
            response.stats,
            RepositoryStats { files: 3, has_readme: true, has_tests: true }
        );
        assert!(matches!(response.analysis, Analysis::Parsed(_)));
    }

    #[tokio::test]
    async fn test_invalid_reference_skips_acquisition() {
        let mut acquirer = MockSourceAcquirer::new();
        acquirer.expect_name().return_const("remote");
        acquirer.expect_acquire().never();
        let mut llm = MockLlmClient::new();
        llm.expect_complete().never();

        let pipeline = AnalysisPipeline::new(Arc::new(acquirer), Arc::new(llm));
        let result = pipeline.analyze("widgets").await;
        assert!(matches!(result, Err(AnalyzerError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_checkout_removed_after_llm_failure() {
        let checkout = TempDir::new().unwrap();
        let path = checkout.path().to_path_buf();
        fs::write(path.join("README.md"), "x").unwrap();

        let mut acquirer = MockSourceAcquirer::new();
        acquirer.expect_name().return_const("clone");
        let mut slot = Some(checkout);
        acquirer.expect_acquire().times(1).returning(move |_| {
            Ok(FileListing::LocalTree {
                root: slot.take().expect("acquired once"),
            })
        });
        let mut llm = MockLlmClient::new();
        llm.expect_complete()
            .returning(|_| Err(AnalyzerError::upstream("authentication failed (HTTP 401)")));

        let pipeline = AnalysisPipeline::new(Arc::new(acquirer), Arc::new(llm));
        let result = pipeline.analyze("https://github.com/acme/widgets").await;

        assert!(matches!(result, Err(AnalyzerError::Upstream { .. })));
        assert!(!path.exists());
    }
}
