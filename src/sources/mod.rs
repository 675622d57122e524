//! Preprint repositories that can serve a paper's LaTeX sources.
//!
//! This module defines the [`Source`] trait: resolve a free-form query to a
//! single [`Paper`] and download that paper's raw source archive. [`ArxivSource`]
//! is the production implementation; [`MockSource`] serves canned records and
//! archives for tests.

mod arxiv;
pub mod mock;

pub use arxiv::ArxivSource;
pub use mock::MockSource;

use async_trait::async_trait;
use std::path::{Path, PathBuf};

use crate::models::Paper;

/// File name the source archive is saved under inside the work directory
pub const ARCHIVE_FILE_NAME: &str = "src.tar.gz";

/// The Source trait defines the interface for preprint repositories.
#[async_trait]
pub trait Source: Send + Sync + std::fmt::Debug {
    /// Unique identifier for this source (e.g., "arxiv")
    fn id(&self) -> &str;

    /// Human-readable name of this source
    fn name(&self) -> &str;

    /// Resolve a query to exactly one paper record.
    ///
    /// Returns [`SourceError::NotFound`] when nothing matches.
    async fn lookup(&self, query: &str) -> Result<Paper, SourceError>;

    /// Download the paper's raw source archive into `dest_dir`.
    ///
    /// Returns the path of the saved archive, or
    /// [`SourceError::SourcesUnavailable`] when the repository has no LaTeX
    /// sources for this paper.
    async fn download_source(&self, paper: &Paper, dest_dir: &Path)
        -> Result<PathBuf, SourceError>;
}

/// Errors that can occur when interacting with a source
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// Network or HTTP error
    #[error("Network error: {0}")]
    Network(String),

    /// Parsing error (Atom feed, etc.)
    #[error("Parse error: {0}")]
    Parse(String),

    /// Invalid request parameters
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// The query resolved to no paper
    #[error("Paper not found: {0}")]
    NotFound(String),

    /// The paper has no downloadable source archive
    #[error("Paper sources are not available: {0}")]
    SourcesUnavailable(String),

    /// API error from the source
    #[error("API error: {0}")]
    Api(String),

    /// IO error (file system)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<reqwest::Error> for SourceError {
    fn from(err: reqwest::Error) -> Self {
        SourceError::Network(err.to_string())
    }
}
