#![doc = include_str!("../README.md")]
#![warn(missing_docs)]
#![warn(clippy::all)]

//! repomentor - repository quality assessment backed by an LLM
//!
//! A repository URL goes through a short linear pipeline:
//!
//! 1. [`repository::RepositoryReference`] validates the URL before anything else runs
//! 2. an [`acquirers::SourceAcquirer`] lists the repository (REST API root listing or shallow clone)
//! 3. [`stats::extract`] computes file count, README presence and test presence
//! 4. [`prompts::build_analysis_prompt`] renders the instruction for the model
//! 5. an [`llm::LlmClient`] returns the raw completion
//! 6. [`analysis::assemble`] builds the response, falling back to the raw text when it is not JSON
//!
//! ## Usage
//! ```rust,ignore
//! use repomentor::{AnalysisPipeline, Config};
//!
//! async fn example() -> repomentor::Result<()> {
//!     let config = Config::load(None)?;
//!     let pipeline = AnalysisPipeline::from_config(&config)?;
//!     let response = pipeline.analyze("https://github.com/rust-lang/log").await?;
//!     println!("{}", serde_json::to_string_pretty(&response)?);
//!     Ok(())
//! }
//! ```

/// Configuration module for the application
pub mod config;
/// Error handling types and utilities
pub mod error;
/// Logging configuration and utilities
pub mod logging;
/// Repository identifiers
pub mod repository;
/// Repository acquisition strategies (remote listing, shallow clone)
pub mod acquirers;
/// Repository statistics
pub mod stats;
/// Prompt templates
pub mod prompts;
/// Chat-completion clients
pub mod llm;
/// Analysis parsing and response assembly
pub mod analysis;
/// End-to-end analysis pipeline
pub mod pipeline;
/// REST API functionality for web service
pub mod api;
/// HTTP server startup
pub mod server;
/// Utilities (input normalization, retry helpers)
pub mod utils;

// Re-export common types
pub use analysis::{Analysis, AnalysisResponse, AnalysisResult};
pub use config::{AcquisitionStrategy, Config, LlmProvider};
pub use error::{AnalyzerError, Result};
pub use pipeline::AnalysisPipeline;
pub use repository::RepositoryReference;
pub use stats::RepositoryStats;
